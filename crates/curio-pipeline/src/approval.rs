//! The approval state machine: approve one, approve many, reject one.
//!
//! Candidates only ever leave `Pending` once. An approval creates exactly one
//! catalog entry, and the entry insert plus the candidate update happen in a
//! single store commit, so a failed approval leaves nothing behind.

use std::{collections::HashSet, sync::Arc};

use chrono::{Datelike, Utc};
use curio_core::{
  ErrorKind,
  candidate::{Candidate, Review},
  catalog::{CatalogEntry, EntryDraft},
  category::{Category, CategoryAliases, resolve_category},
  pricing::{MarketTrend, PricingEngine, PricingInput, PricingResult},
  store::CatalogStore,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{Error, IdentifierAllocator, Result, allocator};

pub const DEFAULT_BULK_LIMIT: usize = 100;

// ─── Policy and requests ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct ApprovalPolicy {
  pub max_allocation_attempts: u32,
  pub bulk_limit:              usize,
}

impl Default for ApprovalPolicy {
  fn default() -> Self {
    Self {
      max_allocation_attempts: allocator::DEFAULT_MAX_ATTEMPTS,
      bulk_limit:              DEFAULT_BULK_LIMIT,
    }
  }
}

/// Which price a bulk approval lists each candidate at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkPricing {
  /// Each candidate's own suggested price.
  Suggested,
  /// One administrator price for every candidate.
  Override(f64),
}

#[derive(Debug, Clone)]
pub struct BulkApproval {
  pub candidate_ids: Vec<Uuid>,
  pub pricing:       BulkPricing,
  pub reviewer:      String,
  pub notes:         Option<String>,
}

/// One candidate that could not be approved in a bulk run.
#[derive(Debug, Clone, Serialize)]
pub struct BulkFailure {
  pub candidate_id: Uuid,
  pub error:        String,
  pub kind:         ErrorKind,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkOutcome {
  pub approved: usize,
  pub failed:   usize,
  pub entries:  Vec<CatalogEntry>,
  pub errors:   Vec<BulkFailure>,
  /// Requested ids that were missing or no longer pending.
  pub skipped:  Vec<Uuid>,
}

/// Extra pricing signals an administrator can supply when re-quoting.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteSignals {
  #[serde(default)]
  pub comparable_sales:   Vec<f64>,
  #[serde(default)]
  pub market:             Option<MarketTrend>,
  #[serde(default)]
  pub verified_condition: bool,
  #[serde(default)]
  pub authenticated:      bool,
}

// ─── Workflow ────────────────────────────────────────────────────────────────

pub struct ApprovalWorkflow<S> {
  store:     Arc<S>,
  allocator: IdentifierAllocator,
  aliases:   CategoryAliases,
  policy:    ApprovalPolicy,
}

impl<S: CatalogStore> ApprovalWorkflow<S> {
  pub fn new(store: Arc<S>, policy: ApprovalPolicy) -> Self {
    Self {
      store,
      allocator: IdentifierAllocator::new(policy.max_allocation_attempts),
      aliases: CategoryAliases::default(),
      policy,
    }
  }

  pub fn with_aliases(mut self, aliases: CategoryAliases) -> Self {
    self.aliases = aliases;
    self
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  // ── Approve one ───────────────────────────────────────────────────────────

  /// Approve a single pending candidate at `final_price`.
  pub async fn approve_one(
    &self,
    candidate_id: Uuid,
    final_price: f64,
    reviewer: &str,
    notes: Option<String>,
  ) -> Result<CatalogEntry> {
    check_price(final_price)?;

    let candidate = self.pending_candidate(candidate_id).await?;
    let categories = self.categories().await?;
    let review = review(reviewer, notes);

    let entry = self
      .approve_candidate(&candidate, &categories, final_price, review)
      .await?;

    info!(
      %candidate_id,
      identifier = %entry.identifier,
      price = entry.price,
      reviewer,
      "candidate approved"
    );
    Ok(entry)
  }

  // ── Approve many ──────────────────────────────────────────────────────────

  /// Approve a batch. Only a malformed batch fails outright; everything
  /// else is reported per candidate in the outcome.
  pub async fn approve_many(
    &self,
    request: BulkApproval,
  ) -> Result<BulkOutcome> {
    if request.candidate_ids.is_empty() {
      return Err(curio_core::Error::EmptyBatch.into());
    }
    if request.candidate_ids.len() > self.policy.bulk_limit {
      return Err(
        curio_core::Error::BatchTooLarge {
          len:   request.candidate_ids.len(),
          limit: self.policy.bulk_limit,
        }
        .into(),
      );
    }
    if let BulkPricing::Override(price) = request.pricing {
      check_price(price)?;
    }

    let mut seen = HashSet::new();
    let mut outcome = BulkOutcome::default();
    let mut pending = Vec::new();
    for id in request.candidate_ids {
      if !seen.insert(id) {
        continue;
      }
      match self.store.get_candidate(id).await.map_err(Error::store)? {
        Some(c) if c.status.is_pending() => pending.push(c),
        _ => outcome.skipped.push(id),
      }
    }
    if pending.is_empty() {
      return Err(curio_core::Error::NoPendingCandidates.into());
    }

    let categories = self.categories().await?;

    for candidate in &pending {
      let price = match request.pricing {
        BulkPricing::Override(price) => price,
        BulkPricing::Suggested => suggested_price(candidate),
      };
      let review = review(&request.reviewer, request.notes.clone());

      let result = match check_price(price) {
        Ok(()) => {
          self
            .approve_candidate(candidate, &categories, price, review)
            .await
        }
        Err(e) => Err(e),
      };

      match result {
        Ok(entry) => {
          outcome.approved += 1;
          outcome.entries.push(entry);
        }
        Err(e) => {
          warn!(
            candidate_id = %candidate.candidate_id,
            error = %e,
            "bulk approval item failed"
          );
          outcome.failed += 1;
          outcome.errors.push(BulkFailure {
            candidate_id: candidate.candidate_id,
            kind:         e.kind(),
            error:        e.to_string(),
          });
        }
      }
    }

    info!(
      approved = outcome.approved,
      failed = outcome.failed,
      skipped = outcome.skipped.len(),
      reviewer = %request.reviewer,
      "bulk approval finished"
    );
    Ok(outcome)
  }

  // ── Reject one ────────────────────────────────────────────────────────────

  pub async fn reject(
    &self,
    candidate_id: Uuid,
    reviewer: &str,
    notes: Option<String>,
  ) -> Result<Candidate> {
    self.pending_candidate(candidate_id).await?;

    let rejected = self
      .store
      .reject_candidate(candidate_id, review(reviewer, notes))
      .await
      .map_err(Error::store)?;
    if !rejected {
      return Err(self.not_pending(candidate_id).await);
    }

    info!(%candidate_id, reviewer, "candidate rejected");
    self.existing_candidate(candidate_id).await
  }

  // ── Annotations and quotes ────────────────────────────────────────────────

  /// Replace the administrator annotation; allowed in every status.
  pub async fn annotate(
    &self,
    candidate_id: Uuid,
    annotation: Option<String>,
  ) -> Result<Candidate> {
    let found = self
      .store
      .annotate_candidate(candidate_id, annotation)
      .await
      .map_err(Error::store)?;
    if !found {
      return Err(curio_core::Error::CandidateNotFound(candidate_id).into());
    }
    self.existing_candidate(candidate_id).await
  }

  /// Re-price a stored candidate with additional market signals.
  pub async fn quote(
    &self,
    candidate_id: Uuid,
    signals: QuoteSignals,
  ) -> Result<PricingResult> {
    let candidate = self.existing_candidate(candidate_id).await?;
    let input = PricingInput {
      comparable_sales: signals.comparable_sales,
      market: signals.market,
      verified_condition: signals.verified_condition,
      authenticated: signals.authenticated,
      ..PricingInput::from_analysis(&candidate.category, &candidate.analysis)
    };
    Ok(PricingEngine::current().price(&input))
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  async fn approve_candidate(
    &self,
    candidate: &Candidate,
    categories: &[Category],
    price: f64,
    review: Review,
  ) -> Result<CatalogEntry> {
    let category =
      resolve_category(categories, &self.aliases, &candidate.category)?;
    let current_year = review.reviewed_at.year();

    let draft = EntryDraft {
      candidate_id: candidate.candidate_id,
      title: candidate.analysis.title.clone(),
      description: candidate.analysis.description.clone(),
      price,
      category_id: category.category_id,
      prefix: category.identifier_prefix(),
      condition: candidate.analysis.condition,
      review,
    };

    match self
      .allocator
      .commit(self.store.as_ref(), &draft, current_year, current_year)
      .await?
    {
      Some(entry) => Ok(entry),
      None => Err(self.not_pending(candidate.candidate_id).await),
    }
  }

  async fn categories(&self) -> Result<Vec<Category>> {
    self.store.list_categories().await.map_err(Error::store)
  }

  async fn existing_candidate(&self, id: Uuid) -> Result<Candidate> {
    self
      .store
      .get_candidate(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| curio_core::Error::CandidateNotFound(id).into())
  }

  async fn pending_candidate(&self, id: Uuid) -> Result<Candidate> {
    let candidate = self.existing_candidate(id).await?;
    if !candidate.status.is_pending() {
      return Err(
        curio_core::Error::NotPending { id, status: candidate.status }.into(),
      );
    }
    Ok(candidate)
  }

  /// Build the error for a candidate that left `Pending` underneath us.
  async fn not_pending(&self, id: Uuid) -> Error {
    match self.existing_candidate(id).await {
      Ok(c) => curio_core::Error::NotPending { id, status: c.status }.into(),
      Err(e) => e,
    }
  }
}

fn review(reviewer: &str, notes: Option<String>) -> Review {
  Review { reviewer: reviewer.to_owned(), reviewed_at: Utc::now(), notes }
}

fn check_price(price: f64) -> Result<()> {
  if price.is_finite() && price > 0.0 {
    Ok(())
  } else {
    Err(curio_core::Error::InvalidPrice(price).into())
  }
}

/// The ingest-time quote, or the model's own figure if the quote is empty.
fn suggested_price(candidate: &Candidate) -> f64 {
  if candidate.quote.suggested_price > 0.0 {
    candidate.quote.suggested_price
  } else {
    candidate.analysis.suggested_price
  }
}
