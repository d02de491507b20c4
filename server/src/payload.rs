//! Wire payloads and their translation to store inputs.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::model::{NewTodo, Patch, Todo, TodoPatch, ValidationError};
use crate::store::{ListQuery, Page};

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

/// `Json<T>` whose rejections become `INVALID_JSON` envelopes instead of
/// axum's plain-text responses.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::InvalidJson(rejection.body_text())),
        }
    }
}

/// Body of `POST /todos`. A missing title decodes as empty so it is reported
/// as a validation failure rather than a decoding one.
#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl TryFrom<CreateTodoRequest> for NewTodo {
    type Error = ValidationError;

    fn try_from(req: CreateTodoRequest) -> Result<Self, Self::Error> {
        let todo = NewTodo {
            title: req.title,
            description: req.description.unwrap_or_default(),
            completed: req.completed.unwrap_or(false),
        };
        todo.validate()?;
        Ok(todo)
    }
}

/// Body of `PUT /todos/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub completed: Patch<bool>,
}

impl TryFrom<UpdateTodoRequest> for TodoPatch {
    type Error = ValidationError;

    fn try_from(req: UpdateTodoRequest) -> Result<Self, Self::Error> {
        let patch = TodoPatch {
            title: req.title,
            description: req.description,
            completed: req.completed,
        };
        patch.validate()?;
        Ok(patch)
    }
}

/// Body of `PATCH /todos/{id}/complete`.
#[derive(Debug, Deserialize)]
pub struct ToggleCompletionRequest {
    pub completed: bool,
}

/// Raw list query string. Every value is kept as text so bad input falls
/// back to defaults instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub completed: Option<String>,
}

impl ListParams {
    pub fn normalize(&self) -> ListQuery {
        let limit = self
            .limit
            .as_deref()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|l| (1..=MAX_LIMIT).contains(l))
            .unwrap_or(DEFAULT_LIMIT);
        let offset = self
            .offset
            .as_deref()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);
        let completed = self.completed.as_deref().and_then(parse_bool);

        ListQuery {
            completed,
            limit,
            offset,
        }
    }
}

/// Accepts the usual spellings of a boolean flag; anything else is `None`.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct TodoListResponse {
    pub todos: Vec<Todo>,
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
}

impl TodoListResponse {
    pub fn new(page: Page, query: &ListQuery) -> Self {
        Self {
            todos: page.items,
            total: page.total,
            limit: query.limit,
            offset: query.offset,
        }
    }
}
