//! # JSON API
//!
//! Binds the bank service to `/api`. Every response from this router is JSON,
//! including framework-generated errors (unknown routes, wrong methods,
//! rejected bodies) and panics.

use std::any::Any;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use shared::{CreateBankRequest, ErrorKind, ErrorResponse, FieldError, UpdateBankRequest};
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{error, info, warn};

use crate::error::BankError;
use crate::AppState;

/// A failure rendered as a JSON error envelope
#[derive(Debug)]
pub enum ApiError {
    Service(BankError),
    /// The path segment is not an integer, so it cannot name a bank
    UnknownId(String),
}

impl From<BankError> for ApiError {
    fn from(err: BankError) -> Self {
        ApiError::Service(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::Service(err) => err,
            ApiError::UnknownId(raw) => {
                let body = ErrorResponse::new(ErrorKind::NotFound, format!("Bank with id {} not found", raw));
                return (StatusCode::NOT_FOUND, Json(body)).into_response();
            }
        };

        let status = match &err {
            BankError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            BankError::NotFound(_) => StatusCode::NOT_FOUND,
            BankError::StorageUnavailable(_) | BankError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        match &err {
            BankError::InvalidInput(_) => warn!("Rejected API input: {}", err),
            BankError::NotFound(_) => {}
            _ => error!("API request failed: {:?}", err),
        }

        let body = ErrorResponse::new(err.kind(), err.public_message())
            .with_fields(err.field_errors().to_vec());
        (status, Json(body)).into_response()
    }
}

/// Create the JSON API router
pub fn router() -> Router<AppState> {
    with_json_errors(
        Router::new()
            .route("/health", get(health))
            .route("/banks", get(list_banks).post(create_bank))
            .route(
                "/banks/:id",
                get(get_bank).put(update_bank).delete(delete_bank),
            ),
    )
}

/// JSON fallback, JSON rewrites of framework errors, and a JSON 500 for panics
fn with_json_errors(routes: Router<AppState>) -> Router<AppState> {
    routes
        .fallback(not_found)
        .layer(middleware::map_response(ensure_json_errors))
        .layer(CatchPanicLayer::custom(panic_response))
}

/// GET /api/health
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /api/banks
pub async fn list_banks(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    info!("GET /api/banks");
    let banks = state.bank_service.list().await?;
    Ok(Json(banks))
}

/// POST /api/banks
pub async fn create_bank(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    info!("POST /api/banks");
    let request = parse_create(body)?;
    let bank = state.bank_service.create(request).await?;
    Ok((StatusCode::CREATED, Json(bank)))
}

/// GET /api/banks/:id
pub async fn get_bank(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = bank_id(&raw_id)?;
    info!("GET /api/banks/{}", id);
    let bank = state.bank_service.get(id).await?;
    Ok(Json(bank))
}

/// PUT /api/banks/:id
pub async fn update_bank(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = bank_id(&raw_id)?;
    info!("PUT /api/banks/{}", id);
    let request = parse_update(body)?;
    let bank = state.bank_service.update(id, request).await?;
    Ok(Json(bank))
}

/// DELETE /api/banks/:id
pub async fn delete_bank(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = bank_id(&raw_id)?;
    info!("DELETE /api/banks/{}", id);
    state.bank_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn not_found() -> Response {
    let body = ErrorResponse::new(ErrorKind::NotFound, "The requested resource was not found");
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

/// Ids that are not integers never match a bank
fn bank_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError::UnknownId(raw.to_string()))
}

fn parse_create(body: Result<Json<Value>, JsonRejection>) -> Result<CreateBankRequest, BankError> {
    let object = json_object(body)?;
    let mut errors = Vec::new();
    let name = required_string(&object, "name", &mut errors);
    let location = required_string(&object, "location", &mut errors);

    match (name, location) {
        (Some(name), Some(location)) => Ok(CreateBankRequest { name, location }),
        _ => Err(BankError::InvalidInput(errors)),
    }
}

/// Both members are optional; the service rejects a body that names neither.
fn parse_update(body: Result<Json<Value>, JsonRejection>) -> Result<UpdateBankRequest, BankError> {
    let object = json_object(body)?;
    let mut errors = Vec::new();
    let name = string_field(&object, "name", &mut errors);
    let location = string_field(&object, "location", &mut errors);
    if !errors.is_empty() {
        return Err(BankError::InvalidInput(errors));
    }
    Ok(UpdateBankRequest { name, location })
}

/// Unwrap a JSON body that must be an object
fn json_object(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, BankError> {
    match body {
        Ok(Json(Value::Object(object))) => Ok(object),
        Ok(Json(_)) => Err(BankError::invalid("body", "must be a JSON object")),
        Err(rejection) => Err(BankError::invalid("body", &rejection.body_text())),
    }
}

/// Read an optional string member. `null` counts as absent; any other non-string is an error.
fn string_field(object: &Map<String, Value>, key: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    match object.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(value)) => Some(value.clone()),
        Some(_) => {
            errors.push(FieldError::new(key, "must be a string"));
            None
        }
    }
}

fn required_string(object: &Map<String, Value>, key: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let value = string_field(object, key, errors);
    if value.is_none() && !errors.iter().any(|e| e.field == key) {
        errors.push(FieldError::new(key, "is required"));
    }
    value
}

/// Rewrite any error response that is not already JSON into the error envelope
async fn ensure_json_errors(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        return response;
    }

    let body = match status {
        StatusCode::NOT_FOUND => ErrorResponse::new(ErrorKind::NotFound, "The requested resource was not found"),
        StatusCode::METHOD_NOT_ALLOWED => {
            ErrorResponse::new(ErrorKind::MethodNotAllowed, "Method not allowed for this resource")
        }
        s if s.is_client_error() => ErrorResponse::new(ErrorKind::InvalidInput, "The request could not be processed"),
        _ => ErrorResponse::new(ErrorKind::Internal, "Internal server error"),
    };
    (status, Json(body)).into_response()
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Panic while handling API request: {}", detail);

    let body = ErrorResponse::new(ErrorKind::Internal, "Internal server error");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
