pub mod dto;

use crate::api::dto::{CreateTodoReq, UpdateTodoReq};
use crate::domain::Todo;
use crate::errors::AppError;
use crate::service::TodoService;
use axum::{
    Json, Router,
    extract::{
        Path, Request, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{
        HeaderName, HeaderValue, Method, StatusCode,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, LINK},
        request::Parts,
    },
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub service: TodoService,
}

#[derive(Clone, Copy)]
pub struct MakeUuidRequest;

impl MakeRequestId for MakeUuidRequest {
    fn make_request_id<B>(&mut self, _: &axum::http::Request<B>) -> Option<RequestId> {
        let uuid = Uuid::new_v4().to_string();

        let header_value =
            HeaderValue::from_str(&uuid).unwrap_or(HeaderValue::from_static("invalid-uuid"));

        Some(RequestId::new(header_value))
    }
}

/// Build the application router with all routes and middleware
///
/// # Arguments
///
/// * `service` - An instance of TodoService to handle business logic
///
/// # Returns
/// * `Router` - The configured Axum router
pub fn router(service: TodoService) -> Router {
    let state = AppState { service };

    let x_request_id = HeaderName::from_static("x-request-id");

    let v1 = Router::new()
        .route("/healthcheck", get(health_check))
        .route("/todos", get(list_todos))
        .route("/todos/{id}", get(get_todo))
        .route("/todos/create", post(create_todo))
        .route("/todos/update/{id}", put(update_todo))
        .route("/todos/delete/{id}", delete(delete_todo));

    Router::new()
        .nest("/api/v1", v1)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let req_id = request
                        .extensions()
                        .get::<RequestId>()
                        .map(|id| id.header_value().to_str().unwrap_or("bad-ascii"))
                        .unwrap_or("unknown");

                    tracing::info_span!(
                        "http_request",
                        request_id = %req_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        )
        .layer(cors_layer())
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeUuidRequest))
}

/// Browser access from any http(s) origin, with credentials.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            |origin: &HeaderValue, _: &Parts| {
                let origin = origin.as_bytes();
                origin.starts_with(b"https://") || origin.starts_with(b"http://")
            },
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            ACCEPT,
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers([LINK])
        .allow_credentials(true)
        .max_age(Duration::from_secs(300))
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Handler to list all todos
///
/// # Errors
///
/// * `AppError` - If the store cannot be reached or times out
async fn list_todos(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, AppError> {
    let todos = state.service.list_todos().await?;

    Ok(Json(todos))
}

async fn get_todo(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Todo>, AppError> {
    let Path(id) = path?;
    let todo = state.service.get_todo(&id).await?;

    Ok(Json(todo))
}

/// Handler to create a new todo
///
/// # Arguments
///
/// * `State(state)` - Application state containing the TodoService
/// * `payload` - JSON body; a malformed body is reported as a validation error
///
/// # Errors
///
/// * `AppError` - If creation fails (see TodoService::create_todo for details)
async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<CreateTodoReq>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let Json(payload) = payload?;
    let todo = state.service.create_todo(payload).await?;

    tracing::info!(id = %todo.id, "Todo Created Successfully");

    Ok((StatusCode::CREATED, Json(todo)))
}

/// Handler to update a todo by its id
///
/// # Errors
///
/// * `AppError` - If the update fails (see TodoService::update_todo for details)
async fn update_todo(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateTodoReq>, JsonRejection>,
) -> Result<Json<Todo>, AppError> {
    let Path(id) = path?;
    let Json(payload) = payload?;
    let todo = state.service.update_todo(&id, payload).await?;

    Ok(Json(todo))
}

/// Handler to delete a todo by its id
///
/// # Errors
///
/// * `AppError` - If deletion fails (see TodoService::delete_todo for details)
async fn delete_todo(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path?;
    state.service.delete_todo(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}
