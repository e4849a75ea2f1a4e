//! Catalog entries: live listings derived from approved candidates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  candidate::{Condition, Review},
  identifier::Identifier,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
  Active,
  Sold,
  Archived,
}

/// A live, purchasable listing. The identifier is globally unique and its
/// `(year, sequence)` pair is never handed out twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
  pub entry_id:     Uuid,
  pub identifier:   Identifier,
  pub candidate_id: Uuid,
  pub title:        String,
  pub slug:         String,
  pub description:  String,
  pub price:        f64,
  pub category_id:  Uuid,
  pub condition:    Condition,
  pub status:       EntryStatus,
  pub created_at:   DateTime<Utc>,
}

/// Everything needed to create an entry except the identifier, which the
/// allocator proposes per attempt.
#[derive(Debug, Clone)]
pub struct EntryDraft {
  pub candidate_id: Uuid,
  pub title:        String,
  pub description:  String,
  pub price:        f64,
  pub category_id:  Uuid,
  pub prefix:       String,
  pub condition:    Condition,
  pub review:       Review,
}

impl EntryDraft {
  /// Materialise the entry for a concrete identifier.
  pub fn into_entry(&self, identifier: Identifier) -> CatalogEntry {
    CatalogEntry {
      entry_id: Uuid::new_v4(),
      slug: slugify(&self.title, &identifier),
      identifier,
      candidate_id: self.candidate_id,
      title: self.title.clone(),
      description: self.description.clone(),
      price: self.price,
      category_id: self.category_id,
      condition: self.condition,
      status: EntryStatus::Active,
      created_at: self.review.reviewed_at,
    }
  }
}

/// Outcome of [`crate::store::CatalogStore::commit_approval`].
#[derive(Debug, Clone)]
pub enum ApprovalCommit {
  /// Entry inserted and candidate marked approved in one transaction.
  Committed(CatalogEntry),
  /// The identifier (or its year/sequence pair) is already claimed. Nothing
  /// was written.
  IdentifierTaken,
  /// The candidate left `Pending` before the commit. Nothing was written.
  CandidateNotPending,
}

/// URL slug: the title reduced to `[a-z0-9-]`, suffixed with the lowercased
/// identifier so two entries never share a slug.
pub fn slugify(title: &str, identifier: &Identifier) -> String {
  let mut slug = String::with_capacity(title.len());
  let mut dash = false;
  for c in title.chars() {
    if c.is_ascii_alphanumeric() {
      slug.push(c.to_ascii_lowercase());
      dash = false;
    } else if !dash && !slug.is_empty() {
      slug.push('-');
      dash = true;
    }
  }
  let base = slug.trim_end_matches('-');
  let base: String = base.chars().take(80).collect();
  let base = base.trim_end_matches('-');
  let id = identifier.to_string().to_ascii_lowercase();
  if base.is_empty() { id } else { format!("{base}-{id}") }
}
