//! Text rendering of the two screens: login and todo list.

use std::io::{self, Write};

use todo_sync_core::{EditDraft, KeyValueStore, Synchronizer, Todo, Transport, User};

const DEMO_ACCOUNTS: &[(&str, &str)] = &[("admin", "password"), ("user", "password")];

pub fn render<T: Transport, S: KeyValueStore>(
    sync: &Synchronizer<T, S>,
    out: &mut impl Write,
) -> io::Result<()> {
    match sync.user() {
        None => render_login(sync.error(), out),
        Some(user) => render_list(user, sync.todos(), sync.draft(), sync.error(), out),
    }
}

fn render_login(error: Option<&str>, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "== Todo App Login ==")?;
    render_error(error, out)?;
    writeln!(out, "Demo credentials:")?;
    for (username, password) in DEMO_ACCOUNTS {
        writeln!(out, "  Username: {username} | Password: {password}")?;
    }
    writeln!(out, "Type `login <username> <password>` to sign in.")
}

fn render_list(
    user: &User,
    todos: &[Todo],
    draft: Option<&EditDraft>,
    error: Option<&str>,
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out, "== Todo List ==")?;
    writeln!(out, "Welcome, {}!", user.username)?;
    render_error(error, out)?;
    if todos.is_empty() {
        return writeln!(out, "No todos yet. Add one above!");
    }
    for (index, todo) in todos.iter().enumerate() {
        writeln!(out, "{}", item_line(index + 1, todo, draft))?;
    }
    Ok(())
}

fn render_error(error: Option<&str>, out: &mut impl Write) -> io::Result<()> {
    match error {
        Some(message) => writeln!(out, "! {message}"),
        None => Ok(()),
    }
}

fn item_line(number: usize, todo: &Todo, draft: Option<&EditDraft>) -> String {
    let mark = if todo.completed { 'x' } else { ' ' };
    match draft.filter(|d| d.id == todo.id) {
        Some(draft) => format!("{number:>3}. [{mark}] {} -> editing: \"{}\"", todo.title, draft.text),
        None => format!("{number:>3}. [{mark}] {}", todo.title),
    }
}
