//! Session & list synchronizer.
//!
//! # Design
//! `Synchronizer` owns the session, the local todo collection, the form
//! inputs and the single error slot. Every operation issues at most one
//! request through the injected `Transport` and changes local state only
//! after the server confirms: there are no optimistic updates. Operations
//! take `&mut self`, so at most one request is in flight per synchronizer.
//!
//! The collection is a mirror of what the server last reported. It is
//! replaced wholesale on fetch, appended to on confirmed create, patched by
//! id with the server's representation on confirmed update, and filtered on
//! confirmed delete.

use tracing::{debug, info, warn};

use crate::client::TodoClient;
use crate::confirm::{Confirm, DELETE_PROMPT};
use crate::http::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::session::Session;
use crate::storage::KeyValueStore;
use crate::types::{CreateTodo, Credentials, Todo, TodoId, UpdateTodo, User};

pub const LOGIN_FAILED: &str = "Login failed";
pub const LOGIN_NETWORK_ERROR: &str = "Network error. Please try again.";
pub const NETWORK_ERROR: &str = "Network error";
pub const FETCH_FAILED: &str = "Failed to fetch todos";
pub const ADD_FAILED: &str = "Failed to add todo";
pub const UPDATE_FAILED: &str = "Failed to update todo";
pub const DELETE_FAILED: &str = "Failed to delete todo";

/// What an operation did to local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The server confirmed and local state was updated.
    Applied,
    /// Nothing was sent: blank input, declined confirmation, unknown item or
    /// no session. The error slot is untouched.
    Skipped,
    /// The request failed; the error slot holds the message.
    Failed,
}

/// In-progress rename of a single todo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub id: TodoId,
    pub text: String,
}

pub struct Synchronizer<T, S> {
    client: TodoClient,
    transport: T,
    store: S,
    session: Option<Session>,
    todos: Vec<Todo>,
    login_form: Credentials,
    new_title: String,
    draft: Option<EditDraft>,
    error: Option<String>,
}

impl<T: Transport, S: KeyValueStore> Synchronizer<T, S> {
    /// Build a synchronizer and run the startup restore: a persisted session
    /// is adopted without validation and the list is fetched immediately.
    pub fn new(client: TodoClient, transport: T, store: S) -> Self {
        let mut sync = Self {
            client,
            transport,
            store,
            session: None,
            todos: Vec::new(),
            login_form: Credentials::default(),
            new_title: String::new(),
            draft: None,
            error: None,
        };
        match Session::restore(&sync.store) {
            Ok(Some(session)) => {
                info!(username = %session.user.username, "restored session");
                sync.session = Some(session);
                sync.fetch_list();
            }
            Ok(None) => debug!("no persisted session"),
            Err(e) => warn!(error = %e, "ignoring unreadable persisted session"),
        }
        sync
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn todo(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|t| &t.id == id)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        self.draft.as_ref()
    }

    /// Mutable access to the draft text, if an edit is active.
    pub fn draft_text_mut(&mut self) -> Option<&mut String> {
        self.draft.as_mut().map(|d| &mut d.text)
    }

    pub fn login_form(&self) -> &Credentials {
        &self.login_form
    }

    pub fn login_form_mut(&mut self) -> &mut Credentials {
        &mut self.login_form
    }

    pub fn new_title(&self) -> &str {
        &self.new_title
    }

    pub fn set_new_title(&mut self, title: &str) {
        self.new_title = title.to_string();
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fill the login form and submit it.
    pub fn login(&mut self, username: &str, password: &str) -> Outcome {
        self.login_form = Credentials::new(username, password);
        self.submit_login()
    }

    /// Send the login form. Empty fields are sent as-is; the server decides.
    ///
    /// On success the session is persisted and adopted, the form is cleared
    /// and the list is fetched. On failure the session is left untouched.
    pub fn submit_login(&mut self) -> Outcome {
        self.error = None;
        let request = match self.client.build_login(&self.login_form) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "could not build login request");
                return self.fail(LOGIN_FAILED);
            }
        };
        let response = match self.send(request) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "login request got no response");
                return self.fail(LOGIN_NETWORK_ERROR);
            }
        };
        let login = match self.client.parse_login(response) {
            Ok(login) if !login.token.is_empty() => login,
            Ok(_) => {
                warn!("login response carried an empty token");
                return self.fail(LOGIN_FAILED);
            }
            Err(e) => {
                warn!(error = %e, "login rejected");
                let message = e.server_message().unwrap_or(LOGIN_FAILED).to_string();
                return self.fail(message);
            }
        };

        let session = Session::new(login.token, login.user);
        if let Err(e) = session.persist(&mut self.store) {
            warn!(error = %e, "could not persist session");
        }
        info!(username = %session.user.username, "logged in");
        self.session = Some(session);
        self.login_form = Credentials::default();
        self.fetch_list();
        Outcome::Applied
    }

    /// Purely local: forget the session, the collection, the draft and the
    /// current error.
    pub fn logout(&mut self) {
        if let Err(e) = Session::clear(&mut self.store) {
            warn!(error = %e, "could not clear persisted session");
        }
        if let Some(session) = self.session.take() {
            info!(username = %session.user.username, "logged out");
        }
        self.todos.clear();
        self.draft = None;
        self.error = None;
    }

    /// Replace the whole collection with the server's list.
    pub fn fetch_list(&mut self) -> Outcome {
        let Some(token) = self.active_token("fetch") else {
            return Outcome::Skipped;
        };
        self.error = None;
        let request = self.client.build_list_items(&token);
        let response = match self.send(request) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "list request got no response");
                return self.fail(NETWORK_ERROR);
            }
        };
        match self.client.parse_list_items(response) {
            Ok(todos) => {
                debug!(count = todos.len(), "replaced todo list");
                self.todos = todos;
                let stale = self
                    .draft
                    .as_ref()
                    .is_some_and(|d| self.todo(&d.id).is_none());
                if stale {
                    self.draft = None;
                }
                Outcome::Applied
            }
            Err(e) => {
                warn!(error = %e, "list request failed");
                self.fail(FETCH_FAILED)
            }
        }
    }

    /// Fill the new-todo input and submit it.
    pub fn add_todo(&mut self, title: &str) -> Outcome {
        self.new_title = title.to_string();
        self.submit_new_todo()
    }

    /// Create a todo from the new-todo input. Blank input is ignored.
    pub fn submit_new_todo(&mut self) -> Outcome {
        if self.new_title.trim().is_empty() {
            return Outcome::Skipped;
        }
        let Some(token) = self.active_token("add") else {
            return Outcome::Skipped;
        };
        self.error = None;
        let input = CreateTodo {
            title: self.new_title.clone(),
        };
        let request = match self.client.build_create_item(&token, &input) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "could not build create request");
                return self.fail(ADD_FAILED);
            }
        };
        let response = match self.send(request) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "create request got no response");
                return self.fail(NETWORK_ERROR);
            }
        };
        match self.client.parse_create_item(response) {
            Ok(todo) => {
                debug!(id = %todo.id, "created todo");
                self.todos.push(todo);
                self.new_title.clear();
                Outcome::Applied
            }
            Err(e) => {
                warn!(error = %e, "create request failed");
                let message = e.server_message().unwrap_or(ADD_FAILED).to_string();
                self.fail(message)
            }
        }
    }

    /// Ask the server to flip `completed` and adopt whatever it returns.
    pub fn toggle_complete(&mut self, id: &TodoId) -> Outcome {
        let Some(token) = self.active_token("toggle") else {
            return Outcome::Skipped;
        };
        let Some(completed) = self.todo(id).map(|t| t.completed) else {
            warn!(%id, "toggle for unknown todo");
            return Outcome::Skipped;
        };
        self.error = None;
        match self.send_update(&token, id, &UpdateTodo::completed(!completed)) {
            Ok(updated) => {
                self.replace(id, updated);
                Outcome::Applied
            }
            Err(message) => self.fail(message),
        }
    }

    /// Start renaming a todo, replacing any draft already open.
    pub fn begin_edit(&mut self, id: &TodoId) -> Outcome {
        let Some(todo) = self.todo(id) else {
            return Outcome::Skipped;
        };
        self.draft = Some(EditDraft {
            id: todo.id.clone(),
            text: todo.title.clone(),
        });
        Outcome::Applied
    }

    pub fn cancel_edit(&mut self) {
        self.draft = None;
    }

    /// Send the draft title. A blank draft sends nothing and stays open, as
    /// does a draft whose update fails.
    pub fn commit_edit(&mut self) -> Outcome {
        let Some(draft) = self.draft.clone() else {
            return Outcome::Skipped;
        };
        if draft.text.trim().is_empty() {
            return Outcome::Skipped;
        }
        let Some(token) = self.active_token("rename") else {
            return Outcome::Skipped;
        };
        self.error = None;
        match self.send_update(&token, &draft.id, &UpdateTodo::title(&draft.text)) {
            Ok(updated) => {
                self.replace(&draft.id, updated);
                self.draft = None;
                Outcome::Applied
            }
            Err(message) => self.fail(message),
        }
    }

    /// Delete a todo after the user confirms. The item leaves the local
    /// collection only once the server has confirmed.
    pub fn delete_todo(&mut self, id: &TodoId, mut confirm: impl Confirm) -> Outcome {
        let Some(token) = self.active_token("delete") else {
            return Outcome::Skipped;
        };
        if self.todo(id).is_none() {
            warn!(%id, "delete for unknown todo");
            return Outcome::Skipped;
        }
        if !confirm.confirm(DELETE_PROMPT) {
            debug!(%id, "delete declined");
            return Outcome::Skipped;
        }
        self.error = None;
        let request = self.client.build_delete_item(&token, id);
        let result = match self.send(request) {
            Ok(response) => self.client.parse_delete_item(response).map_err(|e| {
                warn!(error = %e, "delete request failed");
                DELETE_FAILED
            }),
            Err(e) => {
                warn!(error = %e, "delete request got no response");
                Err(NETWORK_ERROR)
            }
        };
        match result {
            Ok(()) => {
                debug!(%id, "deleted todo");
                self.todos.retain(|t| &t.id != id);
                if self.draft.as_ref().is_some_and(|d| &d.id == id) {
                    self.draft = None;
                }
                Outcome::Applied
            }
            Err(message) => self.fail(message),
        }
    }

    fn send(&mut self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(method = request.method.as_str(), path = %request.path, "sending request");
        let response = self.transport.execute(request)?;
        debug!(status = response.status, "received response");
        Ok(response)
    }

    fn send_update(
        &mut self,
        token: &str,
        id: &TodoId,
        input: &UpdateTodo,
    ) -> Result<Todo, &'static str> {
        let request = self.client.build_update_item(token, id, input).map_err(|e| {
            warn!(error = %e, "could not build update request");
            UPDATE_FAILED
        })?;
        let response = self.send(request).map_err(|e| {
            warn!(error = %e, "update request got no response");
            NETWORK_ERROR
        })?;
        self.client.parse_update_item(response).map_err(|e| {
            warn!(error = %e, "update request failed");
            UPDATE_FAILED
        })
    }

    fn replace(&mut self, id: &TodoId, updated: Todo) {
        if let Some(slot) = self.todos.iter_mut().find(|t| &t.id == id) {
            *slot = updated;
        }
    }

    fn active_token(&self, operation: &str) -> Option<String> {
        match &self.session {
            Some(session) if !session.token.is_empty() => Some(session.token.clone()),
            _ => {
                warn!(operation, "refusing request without a session");
                None
            }
        }
    }

    fn fail(&mut self, message: impl Into<String>) -> Outcome {
        self.error = Some(message.into());
        Outcome::Failed
    }
}
