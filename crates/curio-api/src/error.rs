//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use curio_core::ErrorKind;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Pipeline(#[from] curio_pipeline::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub(crate) fn store(
    e: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    Self::Store(Box::new(e))
  }

  fn kind(&self) -> ErrorKind {
    match self {
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::BadRequest(_) => ErrorKind::InvalidInput,
      Self::Pipeline(e) => e.kind(),
      Self::Store(_) => ErrorKind::Internal,
    }
  }

  fn status(&self) -> StatusCode {
    match self.kind() {
      ErrorKind::SchemaViolation | ErrorKind::ResolutionFailure => {
        StatusCode::UNPROCESSABLE_ENTITY
      }
      ErrorKind::NotFound => StatusCode::NOT_FOUND,
      ErrorKind::Precondition | ErrorKind::AllocationConflict => {
        StatusCode::CONFLICT
      }
      ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
      ErrorKind::Analysis => match self {
        Self::Pipeline(curio_pipeline::Error::Domain(
          curio_core::Error::AnalysisTimeout { .. },
        )) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
      },
      ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    let body = json!({ "error": self.to_string(), "kind": self.kind() });
    (status, Json(body)).into_response()
  }
}
