//! Error type for `curio-pipeline`.

use curio_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Domain(#[from] curio_core::Error),

  #[error("store error: {0}")]
  Store(Box<dyn std::error::Error + Send + Sync>),

  #[error("analysis `{service}` failed: {source}")]
  Analysis {
    service: &'static str,
    source:  Box<dyn std::error::Error + Send + Sync>,
  },
}

impl Error {
  pub(crate) fn store(
    e: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    Self::Store(Box::new(e))
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Domain(e) => e.kind(),
      Self::Store(_) => ErrorKind::Internal,
      Self::Analysis { .. } => ErrorKind::Analysis,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
