//! Year-scoped identifier allocation with optimistic retry.
//!
//! The store is the source of truth: an identifier belongs to whichever
//! writer's [`commit_approval`](CatalogStore::commit_approval) lands first.
//! The allocator proposes `max + 1`, and on losing the race re-reads the
//! maximum and proposes again, up to a bounded number of attempts.
//!
//! Within one allocator, allocations for the same year are serialized and
//! share a cursor that advances once per successful commit, so a bulk run
//! never proposes the same sequence twice itself.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
};

use curio_core::{
  catalog::{ApprovalCommit, CatalogEntry, EntryDraft},
  identifier::{Identifier, MAX_SEQUENCE},
  store::CatalogStore,
};
use tracing::{debug, warn};

use crate::{Error, Result};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

pub struct IdentifierAllocator {
  max_attempts: u32,
  /// Next sequence to propose, per year. Zero means "ask the store".
  cursors:      Mutex<HashMap<i32, Arc<tokio::sync::Mutex<u32>>>>,
}

impl Default for IdentifierAllocator {
  fn default() -> Self { Self::new(DEFAULT_MAX_ATTEMPTS) }
}

impl IdentifierAllocator {
  pub fn new(max_attempts: u32) -> Self {
    Self { max_attempts: max_attempts.max(1), cursors: Mutex::default() }
  }

  fn cursor(&self, year: i32) -> Arc<tokio::sync::Mutex<u32>> {
    let mut cursors = self
      .cursors
      .lock()
      .unwrap_or_else(std::sync::PoisonError::into_inner);
    cursors.entry(year).or_default().clone()
  }

  /// Allocate an identifier for `draft` in `year` and commit the approval.
  ///
  /// Returns `Ok(None)` when the candidate stopped being pending before the
  /// commit. Every proposed identifier is validated before it reaches the
  /// store.
  pub async fn commit<S: CatalogStore>(
    &self,
    store: &S,
    draft: &EntryDraft,
    year: i32,
    current_year: i32,
  ) -> Result<Option<CatalogEntry>> {
    let cursor = self.cursor(year);
    let mut next = cursor.lock().await;

    if *next == 0 {
      *next = self.read_next(store, year).await?;
    }

    for attempt in 1..=self.max_attempts {
      if *next > MAX_SEQUENCE {
        return Err(curio_core::Error::SequenceExhausted(year).into());
      }

      let identifier =
        Identifier::new_as_of(&draft.prefix, year, *next, current_year)?;
      debug!(%identifier, attempt, "proposing identifier");

      let entry = draft.into_entry(identifier.clone());
      match store
        .commit_approval(entry, draft.review.clone())
        .await
        .map_err(Error::store)?
      {
        ApprovalCommit::Committed(entry) => {
          *next += 1;
          return Ok(Some(entry));
        }
        ApprovalCommit::CandidateNotPending => return Ok(None),
        ApprovalCommit::IdentifierTaken => {
          warn!(
            %identifier,
            attempt,
            max_attempts = self.max_attempts,
            "identifier claimed concurrently; retrying"
          );
          let fresh = self.read_next(store, year).await?;
          *next = fresh.max(*next + 1);
        }
      }
    }

    Err(
      curio_core::Error::AllocationExhausted {
        year,
        attempts: self.max_attempts,
      }
      .into(),
    )
  }

  async fn read_next<S: CatalogStore>(
    &self,
    store: &S,
    year: i32,
  ) -> Result<u32> {
    let max = store.max_sequence(year).await.map_err(Error::store)?;
    Ok(max + 1)
  }
}
