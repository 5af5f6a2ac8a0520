use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, ErrorKind};

use api_types::ErrorBody;
pub use server::{ServerState, router, run_with_listener};

mod budget;
mod fairy;
mod server;
mod transactions;
mod user;

pub struct ServerError(EngineError);

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::PreconditionFailed if err.is_role_violation() => StatusCode::FORBIDDEN,
        ErrorKind::PreconditionFailed => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let status = status_for_engine_error(&self.0);
        let error = message_for_engine_error(self.0);
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self(value)
    }
}
