//! In-memory stand-in for the todo API server.
//!
//! Serves the login and item endpoints the client core talks to. Sessions
//! and items live in memory and vanish with the process; items are kept per
//! user in insertion order.

pub mod error;

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use error::ApiError;

/// Accounts accepted by `POST /api/login`: (id, username, password).
pub const DEMO_USERS: &[(u64, &str, &str)] = &[(1, "admin", "password"), (2, "user", "password")];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: u64,
    pub username: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    #[serde(default)]
    pub title: String,
}

#[derive(Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Default)]
struct Db {
    sessions: HashMap<String, User>,
    items: HashMap<u64, Vec<Todo>>,
}

#[derive(Clone, Default)]
pub struct AppState {
    db: Arc<RwLock<Db>>,
}

/// The user behind a valid bearer token.
pub struct Auth(pub User);

impl FromRequestParts<AppState> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let db = state.db.read().await;
        match db.sessions.get(token) {
            Some(user) => Ok(Auth(user.clone())),
            None => {
                warn!("Unknown bearer token");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

pub fn app() -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/items", get(list_items).post(create_item))
        .route("/api/items/{id}", put(update_item).delete(delete_item))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::default())
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if input.username.is_empty() || input.password.is_empty() {
        return Err(ApiError::BadRequest("Username and password are required"));
    }

    let (id, username, _) = DEMO_USERS
        .iter()
        .find(|(_, username, password)| *username == input.username && *password == input.password)
        .ok_or_else(|| {
            warn!(username = %input.username, "Rejected login");
            ApiError::InvalidCredentials
        })?;

    let user = User {
        id: *id,
        username: username.to_string(),
    };
    let token = Uuid::new_v4().simple().to_string();
    state.db.write().await.sessions.insert(token.clone(), user.clone());
    info!(username = %user.username, "Logged in");
    Ok(Json(LoginResponse { token, user }))
}

async fn list_items(Auth(user): Auth, State(state): State<AppState>) -> Json<Vec<Todo>> {
    let db = state.db.read().await;
    let todos = db.items.get(&user.id).cloned().unwrap_or_default();
    info!(count = todos.len(), "Listed todos");
    Json(todos)
}

async fn create_item(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(input): Json<CreateTodo>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Title is required"));
    }

    let todo = Todo {
        id: Uuid::new_v4(),
        title: title.to_string(),
        completed: false,
    };
    state
        .db
        .write()
        .await
        .items
        .entry(user.id)
        .or_default()
        .push(todo.clone());
    info!(id = %todo.id, title = %todo.title, "Created todo");
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_item(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Todo>, ApiError> {
    if input.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::BadRequest("Title is required"));
    }

    let mut db = state.db.write().await;
    let todo = db
        .items
        .get_mut(&user.id)
        .and_then(|items| items.iter_mut().find(|t| t.id == id))
        .ok_or(ApiError::NotFound)?;
    if let Some(title) = input.title {
        todo.title = title.trim().to_string();
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    info!(id = %todo.id, completed = todo.completed, "Updated todo");
    Ok(Json(todo.clone()))
}

async fn delete_item(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut db = state.db.write().await;
    let items = db.items.get_mut(&user.id).ok_or(ApiError::NotFound)?;
    let before = items.len();
    items.retain(|t| t.id != id);
    if items.len() == before {
        return Err(ApiError::NotFound);
    }
    info!(%id, "Deleted todo");
    Ok(StatusCode::NO_CONTENT)
}
