//! Line-oriented command loop that drives the synchronizer.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use todo_sync_core::{KeyValueStore, Synchronizer, TodoId, Transport};

use crate::view;

const HELP: &str = "\
Commands:
  login <username> <password>   sign in
  logout                        sign out and forget the saved session
  refresh                       reload the list from the server
  add <title>                   create a todo
  toggle <n>                    mark item n done / not done
  edit <n>                      start renaming item n
  text <title>                  replace the text of the open edit
  save [title]                  send the open edit
  cancel                        discard the open edit
  delete <n>                    delete item n (asks first)
  show                          redraw the screen
  quit                          leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: String, password: String },
    Logout,
    Refresh,
    Add(String),
    Toggle(usize),
    Edit(usize),
    Text(String),
    Save(Option<String>),
    Cancel,
    Delete(usize),
    Show,
    Help,
    Quit,
}

impl Command {
    fn needs_session(&self) -> bool {
        !matches!(
            self,
            Command::Login { .. } | Command::Logout | Command::Show | Command::Help | Command::Quit
        )
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let command = match word.to_ascii_lowercase().as_str() {
            "login" => {
                // The password is the rest of the line, spaces included.
                let (username, password) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                Command::Login {
                    username: username.to_string(),
                    password: password.to_string(),
                }
            }
            "logout" => Command::Logout,
            "refresh" => Command::Refresh,
            "add" => Command::Add(rest.to_string()),
            "toggle" => Command::Toggle(item_number(rest)?),
            "edit" => Command::Edit(item_number(rest)?),
            "text" => Command::Text(rest.to_string()),
            "save" if rest.is_empty() => Command::Save(None),
            "save" => Command::Save(Some(rest.to_string())),
            "cancel" => Command::Cancel,
            "delete" => Command::Delete(item_number(rest)?),
            "" | "show" | "list" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command `{other}`; type `help`")),
        };
        Ok(command)
    }
}

fn item_number(arg: &str) -> Result<usize, String> {
    arg.parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| format!("expected an item number, got `{arg}`"))
}

/// Read commands until `quit` or end of input, redrawing after each one.
pub fn run<T: Transport, S: KeyValueStore>(
    sync: &mut Synchronizer<T, S>,
    input: impl BufRead,
    mut out: impl Write,
) -> io::Result<()> {
    view::render(sync, &mut out)?;
    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let command = match line?.parse::<Command>() {
            Ok(command) => command,
            Err(message) => {
                writeln!(out, "{message}")?;
                continue;
            }
        };
        match command {
            Command::Quit => break,
            Command::Help => {
                writeln!(out, "{HELP}")?;
                continue;
            }
            Command::Delete(n) if sync.is_authenticated() => match item_id(sync, n) {
                Some(id) => {
                    sync.delete_todo(&id, |prompt: &str| ask(prompt, &mut lines, &mut out));
                }
                None => writeln!(out, "no item #{n}")?,
            },
            command => {
                if let Some(message) = apply(sync, command) {
                    writeln!(out, "{message}")?;
                }
            }
        }
        view::render(sync, &mut out)?;
    }
    Ok(())
}

/// Run one command; returns a notice for the user when nothing was sent.
fn apply<T: Transport, S: KeyValueStore>(
    sync: &mut Synchronizer<T, S>,
    command: Command,
) -> Option<String> {
    if command.needs_session() && !sync.is_authenticated() {
        return Some("log in first".to_string());
    }
    match command {
        Command::Login { username, password } => {
            if let Some(user) = sync.user() {
                return Some(format!("already logged in as {}; `logout` first", user.username));
            }
            sync.login(&username, &password);
        }
        Command::Logout => sync.logout(),
        Command::Refresh => {
            sync.fetch_list();
        }
        Command::Add(title) => {
            sync.add_todo(&title);
        }
        Command::Toggle(n) => {
            let Some(id) = item_id(sync, n) else {
                return Some(format!("no item #{n}"));
            };
            sync.toggle_complete(&id);
        }
        Command::Edit(n) => {
            let Some(id) = item_id(sync, n) else {
                return Some(format!("no item #{n}"));
            };
            sync.begin_edit(&id);
        }
        Command::Text(text) => match sync.draft_text_mut() {
            Some(draft) => *draft = text,
            None => return Some(NO_DRAFT.to_string()),
        },
        Command::Save(text) => {
            let Some(draft) = sync.draft_text_mut() else {
                return Some(NO_DRAFT.to_string());
            };
            if let Some(text) = text {
                *draft = text;
            }
            sync.commit_edit();
        }
        Command::Cancel => sync.cancel_edit(),
        Command::Delete(_) | Command::Show | Command::Help | Command::Quit => {}
    }
    None
}

const NO_DRAFT: &str = "no edit in progress; use `edit <n>` first";

fn item_id<T: Transport, S: KeyValueStore>(sync: &Synchronizer<T, S>, n: usize) -> Option<TodoId> {
    sync.todos().get(n - 1).map(|todo| todo.id.clone())
}

fn ask<B: BufRead>(prompt: &str, lines: &mut io::Lines<B>, out: &mut impl Write) -> bool {
    if write!(out, "{prompt} [y/N] ").and_then(|()| out.flush()).is_err() {
        return false;
    }
    match lines.next() {
        Some(Ok(answer)) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;

    use todo_sync_core::{
        HttpMethod, HttpRequest, HttpResponse, MemoryStore, TodoClient, TransportError,
    };

    use super::*;

    #[derive(Default)]
    struct Replies {
        queue: VecDeque<HttpResponse>,
        sent: Vec<HttpRequest>,
    }

    impl Replies {
        fn with(replies: &[(u16, &str)]) -> Self {
            Self {
                queue: replies.iter().map(|(s, b)| HttpResponse::new(*s, *b)).collect(),
                sent: Vec::new(),
            }
        }
    }

    impl Transport for Replies {
        fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.sent.push(request);
            self.queue
                .pop_front()
                .ok_or_else(|| TransportError("no scripted reply".to_string()))
        }
    }

    fn session(replies: &[(u16, &str)], script: &str) -> (Synchronizer<Replies, MemoryStore>, String) {
        let mut sync = Synchronizer::new(
            TodoClient::new("http://api.test"),
            Replies::with(replies),
            MemoryStore::new(),
        );
        let mut out = Vec::new();
        run(&mut sync, Cursor::new(script.to_string()), &mut out).unwrap();
        (sync, String::from_utf8(out).unwrap())
    }

    const LOGIN_OK: (u16, &str) = (200, r#"{"token":"t","user":{"username":"admin"}}"#);
    const TWO_ITEMS: (u16, &str) = (
        200,
        r#"[{"id":1,"title":"Buy milk","completed":false},{"id":2,"title":"Walk dog","completed":false}]"#,
    );

    #[test]
    fn parses_commands() {
        assert_eq!(
            "login admin password".parse::<Command>(),
            Ok(Command::Login {
                username: "admin".to_string(),
                password: "password".to_string()
            })
        );
        assert_eq!(
            "login admin correct horse battery".parse::<Command>(),
            Ok(Command::Login {
                username: "admin".to_string(),
                password: "correct horse battery".to_string()
            })
        );
        assert_eq!(
            "login".parse::<Command>(),
            Ok(Command::Login {
                username: String::new(),
                password: String::new()
            })
        );
        assert_eq!("add  Buy oat milk ".parse::<Command>(), Ok(Command::Add("Buy oat milk".to_string())));
        assert_eq!("add".parse::<Command>(), Ok(Command::Add(String::new())));
        assert_eq!("TOGGLE 2".parse::<Command>(), Ok(Command::Toggle(2)));
        assert_eq!("save".parse::<Command>(), Ok(Command::Save(None)));
        assert_eq!("save New name".parse::<Command>(), Ok(Command::Save(Some("New name".to_string()))));
        assert_eq!("".parse::<Command>(), Ok(Command::Show));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn rejects_bad_item_numbers_and_unknown_words() {
        assert!("toggle".parse::<Command>().is_err());
        assert!("delete 0".parse::<Command>().is_err());
        assert!("edit two".parse::<Command>().is_err());
        assert_eq!(
            "frobnicate".parse::<Command>(),
            Err("unknown command `frobnicate`; type `help`".to_string())
        );
    }

    #[test]
    fn login_then_list_renders_items() {
        let (sync, out) = session(&[LOGIN_OK, TWO_ITEMS], "login admin password\nquit\n");
        assert!(sync.is_authenticated());
        assert!(out.contains("== Todo App Login =="));
        assert!(out.contains("Welcome, admin!"));
        assert!(out.contains("  1. [ ] Buy milk"));
    }

    #[test]
    fn login_sends_password_with_spaces() {
        let (sync, _) = session(&[LOGIN_OK, TWO_ITEMS], "login admin correct horse battery\n");
        let body: serde_json::Value =
            serde_json::from_str(sync.transport().sent[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["password"], "correct horse battery");
    }

    #[test]
    fn list_commands_need_a_session() {
        let (sync, out) = session(&[], "add Buy milk\ntoggle 1\ndelete 1\n");
        assert!(sync.transport().sent.is_empty());
        assert_eq!(out.matches("log in first").count(), 3);
    }

    #[test]
    fn declined_delete_sends_nothing() {
        let (sync, out) = session(&[LOGIN_OK, TWO_ITEMS], "login admin password\ndelete 1\nn\n");
        assert_eq!(sync.transport().sent.len(), 2);
        assert_eq!(sync.todos().len(), 2);
        assert!(out.contains("Are you sure you want to delete this todo? [y/N]"));
    }

    #[test]
    fn confirmed_delete_removes_item() {
        let (sync, _) = session(
            &[LOGIN_OK, TWO_ITEMS, (204, "")],
            "login admin password\ndelete 1\ny\n",
        );
        let last = sync.transport().sent.last().unwrap();
        assert_eq!(last.method, HttpMethod::Delete);
        assert_eq!(last.path, "http://api.test/api/items/1");
        assert_eq!(sync.todos().len(), 1);
    }

    #[test]
    fn edit_flow_renames_item() {
        let (sync, out) = session(
            &[
                LOGIN_OK,
                TWO_ITEMS,
                (200, r#"{"id":2,"title":"Walk the dog","completed":false}"#),
            ],
            "login admin password\nedit 2\ntext Walk the dog\nsave\n",
        );
        assert!(out.contains("Walk dog -> editing: \"Walk dog\""));
        assert!(out.contains("Walk dog -> editing: \"Walk the dog\""));
        assert_eq!(sync.todos()[1].title, "Walk the dog");
        assert!(sync.draft().is_none());
    }

    #[test]
    fn save_without_edit_is_reported() {
        let (_, out) = session(&[LOGIN_OK, TWO_ITEMS], "login admin password\nsave\n");
        assert!(out.contains(NO_DRAFT));
    }

    #[test]
    fn out_of_range_item_is_reported() {
        let (sync, out) = session(&[LOGIN_OK, TWO_ITEMS], "login admin password\ntoggle 9\n");
        assert_eq!(sync.transport().sent.len(), 2);
        assert!(out.contains("no item #9"));
    }

    #[test]
    fn server_error_is_shown_on_screen() {
        let (_, out) = session(
            &[(401, r#"{"error":"Invalid credentials"}"#)],
            "login admin nope\n",
        );
        assert!(out.contains("! Invalid credentials"));
    }
}
