use axum::{extract::{rejection::JsonRejection, Path, State}, routing::{delete, get, put}, Router, Json};
use axum::http::StatusCode;

use crate::{
    application::todo_service::TodoService,
    domain::todo::{CreateTodo, Todo, TodoId},
    http::types::{ApiError, MessageBody},
};

#[derive(Clone)]
pub struct AppState<S: TodoService> { pub service: S }

pub fn router<S: TodoService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/todos", get(list_todos::<S>).post(create_todo::<S>))
        .route("/todos/:id", delete(delete_todo::<S>))
        .route("/todos/:id/toggle", put(toggle_todo::<S>))
        .with_state(state)
}

async fn list_todos<S: TodoService>(State(state): State<AppState<S>>) -> Result<Json<Vec<Todo>>, ApiError> {
    Ok(Json(state.service.list().await?))
}

async fn create_todo<S: TodoService>(State(state): State<AppState<S>>, payload: Result<Json<CreateTodo>, JsonRejection>) -> Result<(StatusCode, Json<Todo>), ApiError> {
    // A body that is not JSON, or whose title is not a string, counts as a missing title.
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(%rejection, "rejected create body");
        ApiError::TitleRequired
    })?;
    let todo = state.service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn delete_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<MessageBody>, ApiError> {
    state.service.delete(parse_id(&id)?).await?;
    Ok(Json(MessageBody { message: "Deleted".into() }))
}

async fn toggle_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.service.toggle(parse_id(&id)?).await?))
}

fn parse_id(s: &str) -> Result<TodoId, ApiError> { TodoId::parse(s).ok_or(ApiError::InvalidId) }
