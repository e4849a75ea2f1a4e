//! Error type for `curio-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] curio_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum column holds a value this build does not know.
  #[error("unknown {column} value: {value:?}")]
  UnknownValue { column: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
