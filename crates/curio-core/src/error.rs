//! Error types for `curio-core`.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::candidate::CandidateStatus;

#[derive(Debug, Error)]
pub enum Error {
  // ── Schema ──────────────────────────────────────────────────────────────
  /// A required analysis field is missing, mistyped, or out of range.
  #[error("schema violation at `{field}` (value: {value}): {reason}")]
  SchemaViolation {
    field:  String,
    value:  String,
    reason: String,
  },

  // ── Resolution ──────────────────────────────────────────────────────────
  #[error("no category matches {0:?}")]
  CategoryNotFound(String),

  #[error("category {input:?} is ambiguous; candidates: {matches:?}")]
  AmbiguousCategory {
    input:   String,
    matches: Vec<String>,
  },

  #[error("invalid identifier {value:?}: {reason}")]
  InvalidIdentifier { value: String, reason: String },

  // ── Allocation ──────────────────────────────────────────────────────────
  /// Every proposed identifier was claimed by a concurrent writer first.
  #[error(
    "could not allocate an identifier for {year} after {attempts} attempts"
  )]
  AllocationExhausted { year: i32, attempts: u32 },

  #[error("sequence space for {0} is exhausted")]
  SequenceExhausted(i32),

  // ── Workflow preconditions ──────────────────────────────────────────────
  #[error("candidate not found: {0}")]
  CandidateNotFound(Uuid),

  #[error("candidate {id} is {status}, not pending")]
  NotPending { id: Uuid, status: CandidateStatus },

  #[error("catalog entry not found: {0}")]
  EntryNotFound(String),

  // ── Input ───────────────────────────────────────────────────────────────
  #[error("invalid price: {0}")]
  InvalidPrice(f64),

  #[error("bulk request contains no candidate ids")]
  EmptyBatch,

  #[error("bulk request has {len} ids; the limit is {limit}")]
  BatchTooLarge { len: usize, limit: usize },

  #[error("no pending candidates found for the provided ids")]
  NoPendingCandidates,

  // ── Analysis ────────────────────────────────────────────────────────────
  #[error("analysis `{service}` timed out after {after:?}")]
  AnalysisTimeout {
    service: &'static str,
    after:   Duration,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Coarse classification used by outer layers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  SchemaViolation,
  ResolutionFailure,
  AllocationConflict,
  Precondition,
  NotFound,
  InvalidInput,
  Analysis,
  Internal,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::SchemaViolation { .. } => ErrorKind::SchemaViolation,
      Self::CategoryNotFound(_)
      | Self::AmbiguousCategory { .. }
      | Self::InvalidIdentifier { .. } => ErrorKind::ResolutionFailure,
      Self::AllocationExhausted { .. } | Self::SequenceExhausted(_) => {
        ErrorKind::AllocationConflict
      }
      Self::NotPending { .. } => ErrorKind::Precondition,
      Self::CandidateNotFound(_) | Self::EntryNotFound(_) => {
        ErrorKind::NotFound
      }
      Self::InvalidPrice(_)
      | Self::EmptyBatch
      | Self::BatchTooLarge { .. }
      | Self::NoPendingCandidates => ErrorKind::InvalidInput,
      Self::AnalysisTimeout { .. } => ErrorKind::Analysis,
      Self::Serialization(_) => ErrorKind::Internal,
    }
  }

  /// Shorthand used throughout the schema validator.
  pub(crate) fn schema(
    field: impl Into<String>,
    value: impl std::fmt::Display,
    reason: impl Into<String>,
  ) -> Self {
    Self::SchemaViolation {
      field:  field.into(),
      value:  value.to_string(),
      reason: reason.into(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
