/// Todo endpoints
///
/// All routes here sit behind the session middleware and act only on the
/// caller's own todos.
///
/// - `GET /v1/todos` - List the caller's todos, newest first
/// - `POST /v1/todos` - Create a todo
/// - `PUT /v1/todos` - Partially update a todo (id in body)
/// - `DELETE /v1/todos/:id` - Delete a todo
///
/// A todo id that does not exist, or belongs to someone else, is answered
/// with a generic 500 rather than a 404.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use coopers_shared::{
    auth::session::AuthSession,
    dto::{CreateTodoRequest, UpdateTodoRequest},
    models::todo::{CreateTodo, Todo, TodoWithOwner, UpdateOutcome, UpdateTodo},
};
use uuid::Uuid;
use validator::Validate;

/// List the caller's todos
///
/// # Response
///
/// ```json
/// [
///   {
///     "id": "uuid",
///     "content": "buy milk",
///     "completed": false,
///     "userId": "uuid",
///     "version": 1,
///     "createdAt": "...",
///     "updatedAt": "...",
///     "user": { "id": "uuid", "username": "a", "email": "a@x.com" }
///   }
/// ]
/// ```
pub async fn list_todos(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Json<Vec<TodoWithOwner>>> {
    let todos = Todo::list_by_owner(&state.db, session.user_id).await?;
    tracing::debug!(user_id = %session.user_id, count = todos.len(), "Listed todos");

    Ok(Json(todos))
}

/// Create a todo
///
/// # Request
///
/// ```json
/// { "content": "buy milk", "completed": false, "userId": "uuid" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: `content` or `userId` missing
/// - `403 Forbidden`: `userId` is not the caller
/// - `500 Internal Server Error`: Owner does not exist, or server error
pub async fn create_todo(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Todo>)> {
    let Json(req) = payload?;
    req.validate()?;

    let (Some(content), Some(user_id)) = (req.content, req.user_id) else {
        return Err(ApiError::BadRequest(
            "Content and user id are required".to_string(),
        ));
    };

    if user_id != session.user_id {
        tracing::warn!(
            user_id = %session.user_id,
            requested_owner = %user_id,
            "Rejected todo creation for another user"
        );
        return Err(ApiError::Forbidden(
            "Cannot create todos for another user".to_string(),
        ));
    }

    let todo = Todo::create(
        &state.db,
        CreateTodo {
            content,
            completed: req.completed.unwrap_or(false),
            user_id,
        },
    )
    .await?;

    tracing::info!(user_id = %user_id, todo_id = %todo.id, "Todo created");

    Ok((StatusCode::CREATED, Json(todo)))
}

/// Partially update a todo
///
/// Omitted fields keep their stored values. When `version` is given the
/// update only applies if it matches the stored version.
///
/// # Request
///
/// ```json
/// { "id": "uuid", "completed": true, "version": 1 }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing `id`, nothing to change, or empty `content`
/// - `409 Conflict`: `version` is stale
/// - `500 Internal Server Error`: No such todo for the caller, or server error
pub async fn update_todo(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> ApiResult<Json<Todo>> {
    let Json(req) = payload?;
    req.validate()?;

    let Some(id) = req.id else {
        return Err(ApiError::BadRequest("Todo id is required".to_string()));
    };

    if !req.has_changes() {
        return Err(ApiError::BadRequest(
            "Content or completed is required".to_string(),
        ));
    }

    let outcome = Todo::update(
        &state.db,
        id,
        session.user_id,
        UpdateTodo {
            content: req.content,
            completed: req.completed,
            expected_version: req.version,
        },
    )
    .await?;

    match outcome {
        UpdateOutcome::Updated(todo) => {
            tracing::info!(user_id = %session.user_id, todo_id = %todo.id, version = todo.version, "Todo updated");
            Ok(Json(todo))
        }
        UpdateOutcome::Conflict { current_version } => Err(ApiError::Conflict(format!(
            "Todo was modified concurrently (current version {})",
            current_version
        ))),
        UpdateOutcome::NotFound => Err(ApiError::InternalError(format!(
            "Todo {} not found for user {}",
            id, session.user_id
        ))),
    }
}

/// Delete a todo
///
/// # Errors
///
/// - `400 Bad Request`: `id` is not a UUID
/// - `500 Internal Server Error`: No such todo for the caller, or server error
pub async fn delete_todo(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if !Todo::delete(&state.db, id, session.user_id).await? {
        return Err(ApiError::InternalError(format!(
            "Todo {} not found for user {}",
            id, session.user_id
        )));
    }

    tracing::info!(user_id = %session.user_id, todo_id = %id, "Todo deleted");

    Ok(StatusCode::NO_CONTENT)
}
