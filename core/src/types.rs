//! Wire DTOs for the todo API.
//!
//! # Design
//! These mirror the server's JSON but are defined independently of the
//! mock-server crate; integration tests catch schema drift. `Todo` and `User`
//! keep any fields the server sends beyond the ones the client reads, so the
//! local mirror and the persisted user record are exactly what the server
//! reported.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Server-assigned todo identifier. Opaque to the client: any JSON number or
/// string is accepted and rendered back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TodoId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TodoId::Number(n) => write!(f, "{n}"),
            TodoId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for TodoId {
    fn from(n: i64) -> Self {
        TodoId::Number(n.into())
    }
}

impl From<&str> for TodoId {
    fn from(s: &str) -> Self {
        TodoId::Text(s.to_string())
    }
}

/// A single todo item as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Todo {
    pub fn new(id: impl Into<TodoId>, title: &str, completed: bool) -> Self {
        Self {
            id: id.into(),
            title: title.to_string(),
            completed,
            extra: Map::new(),
        }
    }
}

/// The authenticated user record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub username: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            extra: Map::new(),
        }
    }
}

/// Login form contents, sent verbatim to `POST /api/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

/// Successful login payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Request payload for creating a todo. The server assigns `id` and
/// `completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodo {
    pub title: String,
}

/// Partial update. Only the fields present in the JSON are applied; omitted
/// fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateTodo {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn title(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Self::default()
        }
    }
}

/// Error envelope the server attaches to non-2xx responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
