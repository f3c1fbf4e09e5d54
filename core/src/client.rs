//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url`. Each endpoint is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`. Authenticated builders take the bearer
//! token explicitly; the client never remembers one.

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTodo, Credentials, ErrorBody, LoginResponse, Todo, TodoId, UpdateTodo};

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_login(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/api/login", self.base_url),
            headers: vec![json_content_type()],
            body: Some(to_json(credentials)?),
        })
    }

    pub fn build_list_items(&self, token: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/api/items", self.base_url),
            headers: vec![bearer(token)],
            body: None,
        }
    }

    pub fn build_create_item(&self, token: &str, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/api/items", self.base_url),
            headers: vec![json_content_type(), bearer(token)],
            body: Some(to_json(input)?),
        })
    }

    pub fn build_update_item(
        &self,
        token: &str,
        id: &TodoId,
        input: &UpdateTodo,
    ) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Put,
            path: format!("{}/api/items/{id}", self.base_url),
            headers: vec![json_content_type(), bearer(token)],
            body: Some(to_json(input)?),
        })
    }

    pub fn build_delete_item(&self, token: &str, id: &TodoId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: format!("{}/api/items/{id}", self.base_url),
            headers: vec![bearer(token)],
            body: None,
        }
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<LoginResponse, ApiError> {
        check_status(&response)?;
        from_json(&response.body)
    }

    pub fn parse_list_items(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        check_status(&response)?;
        from_json(&response.body)
    }

    pub fn parse_create_item(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response)?;
        from_json(&response.body)
    }

    pub fn parse_update_item(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response)?;
        from_json(&response.body)
    }

    /// Any 2xx counts as deleted; the body is ignored.
    pub fn parse_delete_item(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }
}

fn json_content_type() -> (String, String) {
    ("content-type".to_string(), "application/json".to_string())
}

fn bearer(token: &str) -> (String, String) {
    ("authorization".to_string(), format!("Bearer {token}"))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn from_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-2xx status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let message = serde_json::from_str::<ErrorBody>(&response.body)
        .ok()
        .and_then(|body| body.error);
    Err(match response.status {
        401 => ApiError::Unauthorized { message },
        404 => ApiError::NotFound { message },
        status => ApiError::Http {
            status,
            message,
            body: response.body.clone(),
        },
    })
}
