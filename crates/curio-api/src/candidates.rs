//! Handlers for `/candidates` endpoints other than approval.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/candidates` | Runs both analyses; 201 with the pending candidate |
//! | `GET`  | `/candidates` | Optional `?status=pending\|approved\|rejected` |
//! | `GET`  | `/candidates/{id}` | 404 if not found |
//! | `POST` | `/candidates/{id}/annotation` | Body: `{"annotation": "..."}`; any status |
//! | `POST` | `/candidates/{id}/quote` | Body: extra pricing signals |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use curio_core::{
  analysis::{AnalysisRequest, AnalysisService},
  candidate::{Candidate, CandidateStatus},
  pricing::{PricingEngine, PricingResult},
  store::CatalogStore,
};
use curio_pipeline::QuoteSignals;
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── Ingest ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct IngestBody {
  pub image_ref: String,
  pub category:  String,
  #[serde(default)]
  pub notes:     Option<String>,
}

/// `POST /candidates`
pub async fn ingest<S, A>(
  State(state): State<AppState<S, A>>,
  Json(body): Json<IngestBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore,
  A: AnalysisService,
{
  if body.image_ref.trim().is_empty() {
    return Err(ApiError::BadRequest("image_ref must not be empty".into()));
  }

  let request = AnalysisRequest {
    image_ref: body.image_ref,
    category:  body.category,
    notes:     body.notes,
  };
  let candidate = state
    .merger
    .ingest(state.store(), &PricingEngine::current(), request)
    .await?;
  Ok((StatusCode::CREATED, Json(candidate)))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<CandidateStatus>,
}

/// `GET /candidates[?status=<status>]`
pub async fn list<S, A>(
  State(state): State<AppState<S, A>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Candidate>>, ApiError>
where
  S: CatalogStore,
{
  let candidates = state
    .store()
    .list_candidates(params.status)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(candidates))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /candidates/{id}`
pub async fn get_one<S, A>(
  State(state): State<AppState<S, A>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Candidate>, ApiError>
where
  S: CatalogStore,
{
  state
    .store()
    .get_candidate(id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("candidate {id}")))
}

// ─── Annotate ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnnotationBody {
  pub annotation: Option<String>,
}

/// `POST /candidates/{id}/annotation`
pub async fn annotate<S, A>(
  State(state): State<AppState<S, A>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AnnotationBody>,
) -> Result<Json<Candidate>, ApiError>
where
  S: CatalogStore,
{
  let candidate = state.workflow.annotate(id, body.annotation).await?;
  Ok(Json(candidate))
}

// ─── Quote ───────────────────────────────────────────────────────────────────

/// `POST /candidates/{id}/quote`
pub async fn quote<S, A>(
  State(state): State<AppState<S, A>>,
  Path(id): Path<Uuid>,
  Json(signals): Json<QuoteSignals>,
) -> Result<Json<PricingResult>, ApiError>
where
  S: CatalogStore,
{
  let result = state.workflow.quote(id, signals).await?;
  Ok(Json(result))
}
