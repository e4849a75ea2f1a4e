//! JSON REST API for Curio.
//!
//! Exposes an axum [`Router`] over an [`ApprovalWorkflow`] and an
//! [`AnalysisMerger`], generic over any
//! [`CatalogStore`](curio_core::store::CatalogStore) and
//! [`AnalysisService`](curio_core::analysis::AnalysisService). Auth, TLS and
//! request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", curio_api::api_router(state))
//! ```

pub mod approvals;
pub mod candidates;
pub mod entries;
pub mod error;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use curio_core::{analysis::AnalysisService, store::CatalogStore};
use curio_pipeline::{AnalysisMerger, ApprovalWorkflow};

pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S, A> {
  pub workflow: Arc<ApprovalWorkflow<S>>,
  pub merger:   Arc<AnalysisMerger<A>>,
  /// Reviewer recorded when a request does not name one.
  pub reviewer: Arc<str>,
}

impl<S, A> Clone for AppState<S, A> {
  fn clone(&self) -> Self {
    Self {
      workflow: self.workflow.clone(),
      merger:   self.merger.clone(),
      reviewer: self.reviewer.clone(),
    }
  }
}

impl<S: CatalogStore, A> AppState<S, A> {
  pub(crate) fn store(&self) -> &S { self.workflow.store() }

  pub(crate) fn reviewer(&self, requested: Option<String>) -> String {
    requested
      .filter(|r| !r.trim().is_empty())
      .unwrap_or_else(|| self.reviewer.to_string())
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn api_router<S, A>(state: AppState<S, A>) -> Router<()>
where
  S: CatalogStore + 'static,
  A: AnalysisService + 'static,
{
  Router::new()
    // Candidates
    .route(
      "/candidates",
      get(candidates::list::<S, A>).post(candidates::ingest::<S, A>),
    )
    .route("/candidates/bulk-approve", post(approvals::approve_many::<S, A>))
    .route("/candidates/{id}", get(candidates::get_one::<S, A>))
    .route("/candidates/{id}/approve", post(approvals::approve_one::<S, A>))
    .route("/candidates/{id}/reject", post(approvals::reject_one::<S, A>))
    .route(
      "/candidates/{id}/annotation",
      post(candidates::annotate::<S, A>),
    )
    .route("/candidates/{id}/quote", post(candidates::quote::<S, A>))
    // Catalog
    .route("/entries", get(entries::list::<S, A>))
    .route("/entries/{identifier}", get(entries::get_one::<S, A>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
