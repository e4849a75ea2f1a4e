//! Handlers for `/entries` endpoints (read-only catalog views).
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/entries` | `?status=`, `?category_id=`, `?limit=`, `?offset=` |
//! | `GET`  | `/entries/{identifier}` | e.g. `ARTS-2025-007`; 400 if malformed |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use curio_core::{
  catalog::{CatalogEntry, EntryStatus},
  identifier::Identifier,
  store::{CatalogStore, EntryQuery},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status:      Option<EntryStatus>,
  pub category_id: Option<Uuid>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

/// `GET /entries`
pub async fn list<S, A>(
  State(state): State<AppState<S, A>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<CatalogEntry>>, ApiError>
where
  S: CatalogStore,
{
  let query = EntryQuery {
    status:      params.status,
    category_id: params.category_id,
    limit:       params.limit,
    offset:      params.offset,
  };
  let entries = state
    .store()
    .list_entries(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(entries))
}

/// `GET /entries/{identifier}`
pub async fn get_one<S, A>(
  State(state): State<AppState<S, A>>,
  Path(identifier): Path<String>,
) -> Result<Json<CatalogEntry>, ApiError>
where
  S: CatalogStore,
{
  let identifier = Identifier::parse(&identifier)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
  state
    .store()
    .get_entry_by_identifier(&identifier)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("entry {identifier}")))
}
