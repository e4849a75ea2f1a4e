//! Handlers for the three approval operations.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/candidates/{id}/approve` | Body: `{"price": 120.0}`; 201 with the entry |
//! | `POST` | `/candidates/{id}/reject` | Body: `{"notes": "..."}` |
//! | `POST` | `/candidates/bulk-approve` | Body: `{"candidate_ids": [...], "price": 99.0?}` |
//!
//! Every body accepts an optional `reviewer`; the configured default is used
//! otherwise.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use curio_core::{candidate::Candidate, store::CatalogStore};
use curio_pipeline::{BulkApproval, BulkOutcome, BulkPricing};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── Approve one ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ApproveBody {
  pub price:    f64,
  #[serde(default)]
  pub reviewer: Option<String>,
  #[serde(default)]
  pub notes:    Option<String>,
}

/// `POST /candidates/{id}/approve`
pub async fn approve_one<S, A>(
  State(state): State<AppState<S, A>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ApproveBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore,
{
  let reviewer = state.reviewer(body.reviewer);
  let entry = state
    .workflow
    .approve_one(id, body.price, &reviewer, body.notes)
    .await?;
  Ok((StatusCode::CREATED, Json(entry)))
}

// ─── Reject one ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RejectBody {
  #[serde(default)]
  pub reviewer: Option<String>,
  #[serde(default)]
  pub notes:    Option<String>,
}

/// `POST /candidates/{id}/reject`
pub async fn reject_one<S, A>(
  State(state): State<AppState<S, A>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RejectBody>,
) -> Result<Json<Candidate>, ApiError>
where
  S: CatalogStore,
{
  let reviewer = state.reviewer(body.reviewer);
  let candidate = state.workflow.reject(id, &reviewer, body.notes).await?;
  Ok(Json(candidate))
}

// ─── Approve many ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BulkBody {
  pub candidate_ids: Vec<Uuid>,
  /// One price for every candidate; each candidate's suggested price when
  /// absent.
  #[serde(default)]
  pub price:         Option<f64>,
  #[serde(default)]
  pub reviewer:      Option<String>,
  #[serde(default)]
  pub notes:         Option<String>,
}

/// `POST /candidates/bulk-approve`
pub async fn approve_many<S, A>(
  State(state): State<AppState<S, A>>,
  Json(body): Json<BulkBody>,
) -> Result<Json<BulkOutcome>, ApiError>
where
  S: CatalogStore,
{
  let request = BulkApproval {
    candidate_ids: body.candidate_ids,
    pricing:       body
      .price
      .map_or(BulkPricing::Suggested, BulkPricing::Override),
    reviewer:      state.reviewer(body.reviewer),
    notes:         body.notes,
  };
  let outcome = state.workflow.approve_many(request).await?;
  Ok(Json(outcome))
}
