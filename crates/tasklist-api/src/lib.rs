//! tasklist-api: REST service for tasklist items
//!
//! Endpoints:
//! - `GET /items` all items in creation order
//! - `POST /items` create from `{name, priority, category, due_date}`
//! - `PUT /items/{id}` full replace from `{name, completed, priority, category, due_date}`
//! - `DELETE /items/{id}` delete, `204` with an empty body
//! - `GET /health`

pub mod repository;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tasklist_core::{Item, ItemDraft, ItemUpdate};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use repository::ItemRepository;

/// Shared application state
pub struct AppState {
    repo: RwLock<ItemRepository>,
}

impl AppState {
    pub fn new(repo: ItemRepository) -> Arc<Self> {
        Arc::new(Self {
            repo: RwLock::new(repo),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, ItemRepository> {
        self.repo.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ItemRepository> {
        self.repo.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Request failure rendered as a status with a `{"error": ...}` body
pub enum ApiError {
    /// Repository or domain error
    Core(tasklist_core::Error),
    /// Body that could not be read as the expected JSON
    Body(JsonRejection),
}

impl From<tasklist_core::Error> for ApiError {
    fn from(err: tasklist_core::Error) -> Self {
        Self::Core(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use tasklist_core::Error;

        let (status, message) = match self {
            ApiError::Body(rejection) => (rejection.status(), rejection.body_text()),
            ApiError::Core(err) => {
                let status = match &err {
                    Error::NotFound(_) => StatusCode::NOT_FOUND,
                    Error::AlreadyExists(_) => StatusCode::CONFLICT,
                    Error::InvalidPriority(_) | Error::InvalidDate(_) => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
        };
        if status.is_server_error() {
            tracing::error!(error = %message, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %message, "request rejected");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// JSON body whose rejection is reported through [`ApiError`]
type JsonBody<T> = Result<Json<T>, JsonRejection>;

type ApiResult<T> = Result<T, ApiError>;

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// List all items
async fn list_items(State(state): State<Arc<AppState>>) -> Json<Vec<Item>> {
    Json(state.read().list())
}

/// Create a new item
async fn create_item(
    State(state): State<Arc<AppState>>,
    body: JsonBody<ItemDraft>,
) -> ApiResult<Json<Item>> {
    let Json(draft) = body?;
    let item = state.write().create(draft)?;
    tracing::info!(id = %item.id, "item created");
    Ok(Json(item))
}

/// Replace an existing item
async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: JsonBody<ItemUpdate>,
) -> ApiResult<Json<Item>> {
    let Json(fields) = body?;
    let item = state.write().update(&id, fields)?;
    tracing::info!(id = %item.id, completed = item.completed, "item updated");
    Ok(Json(item))
}

/// Delete an item
async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.write().delete(&id)?;
    tracing::info!(%id, "item deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Build the service router around a repository
pub fn app(repo: ItemRepository) -> Router {
    router(AppState::new(repo))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", axum::routing::put(update_item).delete(delete_item))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
