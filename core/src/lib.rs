//! Client-side core for the todo service: session handling and a local
//! mirror of the user's todo list.
//!
//! # Overview
//! `TodoClient` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network (host-does-IO pattern). `Synchronizer` sits
//! on top of it and owns the session and the todo collection, executing each
//! request through a host-supplied `Transport` and persisting the session
//! through a host-supplied `KeyValueStore`.
//!
//! # Design
//! - `TodoClient` is stateless; it holds only `base_url`.
//! - Each endpoint is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit.
//! - Local state changes only after the server confirms a request.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod confirm;
pub mod error;
pub mod http;
pub mod session;
pub mod storage;
pub mod sync;
pub mod types;

pub use client::TodoClient;
pub use confirm::{Confirm, DELETE_PROMPT};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use session::Session;
pub use storage::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use sync::{EditDraft, Outcome, Synchronizer};
pub use types::{CreateTodo, Credentials, ErrorBody, LoginResponse, Todo, TodoId, UpdateTodo, User};
