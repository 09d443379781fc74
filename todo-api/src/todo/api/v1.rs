use crate::todo::api::TodoState;
use crate::todo::{
    Pagination, Priority, Status, Todo, TodoFilter, TodoRepository, TodoRepositoryError,
    ValidationError, parse_due_date,
};
use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// JSON representation of a Todo for API requests and responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TodoJson {
    /// Unique identifier; ignored on create, required on update
    #[serde(default)]
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Calendar date (`YYYY-MM-DD`); RFC 3339 timestamps are truncated to their UTC date
    #[serde(default)]
    #[schema(example = "2025-03-14")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[schema(value_type = Priority, example = "high")]
    pub priority: String,
    #[schema(value_type = Status, example = "planned")]
    pub status: String,
    #[serde(default)]
    pub overdue: bool,
}

impl TryFrom<TodoJson> for Todo {
    type Error = ValidationError;

    fn try_from(json: TodoJson) -> Result<Self, Self::Error> {
        let status = json.status.parse()?;
        let priority = json.priority.parse()?;
        let due_date = match json.due_date.as_deref() {
            Some(raw) => parse_due_date(raw)?,
            None => None,
        };
        Ok(Todo {
            id: json.id,
            title: json.title,
            description: json.description,
            due_date,
            tags: json.tags.unwrap_or_default(),
            priority,
            status,
            overdue: json.overdue,
        })
    }
}

impl From<Todo> for TodoJson {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            description: todo.description,
            due_date: todo
                .due_date
                .map(|date| date.format("%Y-%m-%d").to_string()),
            tags: Some(todo.tags),
            priority: todo.priority.to_string(),
            status: todo.status.to_string(),
            overdue: todo.overdue,
        }
    }
}

/// API response for a created todo.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTodoResponse {
    pub id: i32,
}

/// API response for listing todos.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TodosResponse {
    pub todos: Vec<TodoJson>,
    /// Number of todos in this page
    pub count: usize,
}

/// JSON request payload for deleting todos.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteTodosRequest {
    pub ids: Vec<i32>,
}

/// JSON response for API errors
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Error type for todo API handlers.
#[derive(Debug, thiserror::Error)]
pub enum TodoApiError {
    #[error(transparent)]
    Repository(#[from] TodoRepositoryError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("invalid query parameter \"{name}\": {value}")]
    InvalidQuery { name: &'static str, value: String },
}

impl IntoResponse for TodoApiError {
    fn into_response(self) -> Response {
        let (status_code, error) = match &self {
            TodoApiError::Validation(err)
            | TodoApiError::Repository(TodoRepositoryError::Validation(err)) => match err {
                ValidationError::InvalidField { .. } => (StatusCode::BAD_REQUEST, "INVALID_FIELD"),
                ValidationError::InvalidDueDate(_) => {
                    (StatusCode::BAD_REQUEST, "INVALID_DUE_DATE")
                }
            },
            TodoApiError::InvalidQuery { .. } => (StatusCode::BAD_REQUEST, "INVALID_QUERY"),
            TodoApiError::Repository(err) => match err {
                TodoRepositoryError::MissingId => (StatusCode::BAD_REQUEST, "MISSING_ID"),
                TodoRepositoryError::NoIdsProvided => {
                    (StatusCode::BAD_REQUEST, "NO_IDS_PROVIDED")
                }
                TodoRepositoryError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                TodoRepositoryError::UpdateFailed(_) => (StatusCode::NOT_FOUND, "UPDATE_FAILED"),
                TodoRepositoryError::DeleteFailed(_) => (StatusCode::NOT_FOUND, "DELETE_FAILED"),
                TodoRepositoryError::Validation(_)
                | TodoRepositoryError::InvalidRow { .. }
                | TodoRepositoryError::Database(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
                }
            },
        };

        let message = if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Todo request failed: {}", self);
            "An unexpected error occurred while processing your request. Please try again later."
                .to_string()
        } else {
            self.to_string()
        };

        (
            status_code,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

/// Builds a filter from the list query string.
///
/// `tags` may repeat and may hold comma separated values. Pagination is
/// always applied, falling back to the defaults.
fn parse_filter(params: Vec<(String, String)>) -> Result<TodoFilter, TodoApiError> {
    let mut filter = TodoFilter::default();
    let mut pagination = Pagination::default();

    for (name, value) in params {
        match name.as_str() {
            "tags" => filter.tags.extend(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string),
            ),
            "status" => filter.status = Some(value),
            "priority" => filter.priority = Some(value),
            "overdue" if value.trim().is_empty() => filter.overdue = None,
            "overdue" => filter.overdue = Some(parse_param("overdue", &value)?),
            "dueDate" => filter.due_date = parse_due_date(&value)?,
            "limit" => pagination.limit = parse_param("limit", &value)?,
            "offset" => pagination.offset = parse_param("offset", &value)?,
            _ => {}
        }
    }

    filter.pagination = Some(pagination);
    Ok(filter)
}

fn parse_param<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, TodoApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| TodoApiError::InvalidQuery {
            name,
            value: value.to_string(),
        })
}

/// Handler for POST /api/v1/todos - Creates a todo and returns its id.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/todos",
    request_body = TodoJson,
    responses(
        (status = 201, description = "Todo created", body = CreateTodoResponse),
        (status = 400, description = "Invalid todo", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn create_todo_handler(
    State(state): State<Arc<TodoState>>,
    Json(payload): Json<TodoJson>,
) -> Result<(StatusCode, Json<CreateTodoResponse>), TodoApiError> {
    let mut todo = Todo::try_from(payload)?;
    let id = TodoRepository::new(&state.db).create(&mut todo).await?;
    Ok((StatusCode::CREATED, Json(CreateTodoResponse { id })))
}

/// Handler for GET /api/v1/todos/{id} - Returns a single todo.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/todos/{id}",
    params(
        ("id" = i32, Path, description = "Todo id")
    ),
    responses(
        (status = 200, description = "Todo found", body = TodoJson),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn get_todo_handler(
    State(state): State<Arc<TodoState>>,
    Path(id): Path<i32>,
) -> Result<Json<TodoJson>, TodoApiError> {
    let todo = TodoRepository::new(&state.db).get_by_id(id).await?;
    Ok(Json(TodoJson::from(todo)))
}

/// Handler for GET /api/v1/todos - Returns the todos matching the query.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/todos",
    params(
        ("tags" = Option<String>, Query, description = "Comma separated tags; matches todos carrying any of them"),
        ("status" = Option<String>, Query, description = "Exact status"),
        ("priority" = Option<String>, Query, description = "Exact priority"),
        ("overdue" = Option<bool>, Query, description = "Overdue flag; omit to include both"),
        ("dueDate" = Option<String>, Query, description = "Due date, YYYY-MM-DD"),
        ("limit" = Option<u64>, Query, description = "Page size, defaults to 10"),
        ("offset" = Option<u64>, Query, description = "Rows to skip, defaults to 0")
    ),
    responses(
        (status = 200, description = "Successfully retrieved todos", body = TodosResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn get_todos_handler(
    State(state): State<Arc<TodoState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<TodosResponse>, TodoApiError> {
    let filter = parse_filter(params)?;
    let todos: Vec<TodoJson> = TodoRepository::new(&state.db)
        .get_all(&filter)
        .await?
        .into_iter()
        .map(TodoJson::from)
        .collect();
    let count = todos.len();
    Ok(Json(TodosResponse { todos, count }))
}

/// Handler for PUT /api/v1/todos - Replaces an existing todo.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    put,
    path = "/api/v1/todos",
    request_body = TodoJson,
    responses(
        (status = 204, description = "Todo updated"),
        (status = 400, description = "Invalid todo or missing id", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn update_todo_handler(
    State(state): State<Arc<TodoState>>,
    Json(payload): Json<TodoJson>,
) -> Result<StatusCode, TodoApiError> {
    if payload.id == 0 {
        return Err(TodoRepositoryError::MissingId.into());
    }
    let todo = Todo::try_from(payload)?;
    TodoRepository::new(&state.db).update(&todo).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for DELETE /api/v1/todos - Deletes a batch of todos.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/todos",
    request_body = DeleteTodosRequest,
    responses(
        (status = 204, description = "Todos deleted"),
        (status = 400, description = "No ids provided", body = ErrorResponse),
        (status = 404, description = "None of the todos exist", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn delete_todos_handler(
    State(state): State<Arc<TodoState>>,
    Json(payload): Json<DeleteTodosRequest>,
) -> Result<StatusCode, TodoApiError> {
    TodoRepository::new(&state.db).delete(&payload.ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Creates and returns the todos API router.
pub fn create_api_router(state: Arc<TodoState>) -> Router {
    Router::new()
        .route(
            "/todos",
            get(get_todos_handler)
                .post(create_todo_handler)
                .put(update_todo_handler)
                .delete(delete_todos_handler),
        )
        .route("/todos/{id}", get(get_todo_handler))
        .with_state(state)
}
