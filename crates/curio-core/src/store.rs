//! The `CatalogStore` trait and supporting query types.
//!
//! Implemented by storage backends (e.g. `curio-store-sqlite`). The pipeline
//! and API crates depend on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  candidate::{Candidate, CandidateStatus, NewCandidate, Review},
  catalog::{ApprovalCommit, CatalogEntry, EntryStatus},
  category::{Category, NewCategory},
  identifier::Identifier,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`CatalogStore::list_entries`].
#[derive(Debug, Clone, Default)]
pub struct EntryQuery {
  pub status:      Option<EntryStatus>,
  pub category_id: Option<Uuid>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Curio catalog backend.
///
/// A backend must make [`CatalogStore::commit_approval`] atomic and must
/// reject any identifier whose `(year, sequence)` pair was ever committed
/// before, including pairs whose entry has since been deleted.
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Candidates ────────────────────────────────────────────────────────

  /// Persist a new `Pending` candidate. Id and `created_at` are assigned
  /// by the store.
  fn create_candidate(
    &self,
    input: NewCandidate,
  ) -> impl Future<Output = Result<Candidate, Self::Error>> + Send + '_;

  fn get_candidate(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Candidate>, Self::Error>> + Send + '_;

  /// All candidates, newest first, optionally filtered by status.
  fn list_candidates(
    &self,
    status: Option<CandidateStatus>,
  ) -> impl Future<Output = Result<Vec<Candidate>, Self::Error>> + Send + '_;

  /// Move a candidate from `Pending` to `Rejected`.
  ///
  /// Returns `false` when the candidate is missing or no longer pending.
  fn reject_candidate(
    &self,
    id: Uuid,
    review: Review,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Replace the administrator annotation on a candidate in any status.
  /// Submission notes are left alone. Returns `false` when the candidate
  /// does not exist.
  fn annotate_candidate(
    &self,
    id: Uuid,
    annotation: Option<String>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Categories ────────────────────────────────────────────────────────

  fn create_category(
    &self,
    input: NewCategory,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  fn list_categories(
    &self,
  ) -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send + '_;

  // ── Identifiers and entries ───────────────────────────────────────────

  /// Highest sequence ever claimed for `year`, or 0.
  fn max_sequence(
    &self,
    year: i32,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  /// In one transaction: claim the entry's identifier, insert the entry,
  /// and move its candidate to `Approved` with `review` attached.
  ///
  /// Lost races are reported through [`ApprovalCommit`], not as errors.
  fn commit_approval(
    &self,
    entry: CatalogEntry,
    review: Review,
  ) -> impl Future<Output = Result<ApprovalCommit, Self::Error>> + Send + '_;

  fn get_entry(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<CatalogEntry>, Self::Error>>
  + Send
  + '_;

  fn get_entry_by_identifier<'a>(
    &'a self,
    identifier: &'a Identifier,
  ) -> impl Future<Output = Result<Option<CatalogEntry>, Self::Error>>
  + Send
  + 'a;

  fn list_entries<'a>(
    &'a self,
    query: &'a EntryQuery,
  ) -> impl Future<Output = Result<Vec<CatalogEntry>, Self::Error>> + Send + 'a;

  /// Remove an entry. Its identifier stays claimed.
  fn delete_entry(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
