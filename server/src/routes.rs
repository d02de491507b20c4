use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::model::{NewTodo, Todo, TodoPatch};
use crate::payload::{
    CreateTodoRequest, JsonBody, ListParams, TodoListResponse, ToggleCompletionRequest,
    UpdateTodoRequest,
};
use crate::store::SharedStore;

/// Routes under `/api/v1` plus the bare `/health` probe. Middleware such as
/// CORS and tracing is layered on by the caller.
pub fn router(store: SharedStore) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route("/todos/{id}/complete", patch(toggle_completion));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .with_state(store)
}

/// An id that is not a UUID cannot name a live todo.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

async fn health(State(store): State<SharedStore>) -> impl IntoResponse {
    let timestamp = Utc::now().to_rfc3339();
    match store.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok", "timestamp": timestamp }))),
        Err(err) => {
            warn!(error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "timestamp": timestamp })),
            )
        }
    }
}

async fn list_todos(
    State(store): State<SharedStore>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<TodoListResponse>, ApiError> {
    let params = params.map(|Query(p)| p).unwrap_or_default();
    let query = params.normalize();
    let page = store.list(query).await?;
    info!(
        total = page.total,
        returned = page.items.len(),
        limit = query.limit,
        offset = query.offset,
        "listed todos"
    );
    Ok(Json(TodoListResponse::new(page, &query)))
}

async fn create_todo(
    State(store): State<SharedStore>,
    JsonBody(input): JsonBody<CreateTodoRequest>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let new_todo = NewTodo::try_from(input)?;
    let todo = store.create(new_todo).await?;
    info!(id = %todo.id, "created todo");
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(store.get(id).await?))
}

async fn update_todo(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateTodoRequest>,
) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&id)?;
    let patch = TodoPatch::try_from(input)?;
    let todo = store.update(id, patch).await?;
    info!(%id, "updated todo");
    Ok(Json(todo))
}

async fn toggle_completion(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<ToggleCompletionRequest>,
) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&id)?;
    let todo = store.set_completed(id, input.completed).await?;
    info!(%id, completed = todo.completed, "set todo completion");
    Ok(Json(todo))
}

async fn delete_todo(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    store.delete(id).await?;
    info!(%id, "deleted todo");
    Ok(StatusCode::NO_CONTENT)
}
