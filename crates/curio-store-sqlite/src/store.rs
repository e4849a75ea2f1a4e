//! [`SqliteStore`]: the SQLite implementation of [`CatalogStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, ffi};
use uuid::Uuid;

use curio_core::{
  candidate::{Candidate, CandidateStatus, NewCandidate, Review},
  catalog::{ApprovalCommit, CatalogEntry},
  category::{Category, NewCategory},
  identifier::Identifier,
  store::{CatalogStore, EntryQuery},
};

use crate::{
  Error, Result,
  encode::{
    CANDIDATE_COLUMNS, ENTRY_COLUMNS, RawCandidate, RawCategory, RawEntry,
    encode_candidate_status, encode_dt, encode_entry_status, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Curio catalog backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// A UNIQUE or PRIMARY KEY violation naming one of `columns`, written
/// `table.column` as SQLite reports them.
fn is_unique_violation(err: &rusqlite::Error, columns: &[&str]) -> bool {
  let rusqlite::Error::SqliteFailure(e, Some(msg)) = err else {
    return false;
  };
  matches!(
    e.extended_code,
    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  ) && columns.iter().any(|c| msg.contains(c))
}

const CLAIM_KEYS: &[&str] =
  &["sequence_claims.year", "sequence_claims.identifier"];
const ENTRY_KEYS: &[&str] = &["entries.identifier", "entries.slug"];

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Candidates ────────────────────────────────────────────────────────────

  async fn create_candidate(&self, input: NewCandidate) -> Result<Candidate> {
    let candidate = Candidate {
      candidate_id:     Uuid::new_v4(),
      image_ref:        input.image_ref,
      category:         input.category,
      notes:            input.notes,
      analysis:         input.analysis,
      image:            input.image,
      quote:            input.quote,
      status:           CandidateStatus::Pending,
      catalog_entry_id: None,
      review:           None,
      annotation:       None,
      created_at:       Utc::now(),
    };

    let id_str        = encode_uuid(candidate.candidate_id);
    let image_ref     = candidate.image_ref.clone();
    let category      = candidate.category.clone();
    let notes         = candidate.notes.clone();
    let analysis_json = serde_json::to_string(&candidate.analysis)?;
    let image_json    = serde_json::to_string(&candidate.image)?;
    let quote_json    = serde_json::to_string(&candidate.quote)?;
    let at_str        = encode_dt(candidate.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO candidates (
             candidate_id, image_ref, category, notes,
             analysis_json, image_json, quote_json, status, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'pending', ?8)",
          rusqlite::params![
            id_str,
            image_ref,
            category,
            notes,
            analysis_json,
            image_json,
            quote_json,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(candidate)
  }

  async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCandidate> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {CANDIDATE_COLUMNS} FROM candidates
                 WHERE candidate_id = ?1"
              ),
              rusqlite::params![id_str],
              RawCandidate::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCandidate::into_candidate).transpose()
  }

  async fn list_candidates(
    &self,
    status: Option<CandidateStatus>,
  ) -> Result<Vec<Candidate>> {
    let status_str = status.map(encode_candidate_status);

    let raws: Vec<RawCandidate> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CANDIDATE_COLUMNS} FROM candidates
           WHERE ?1 IS NULL OR status = ?1
           ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![status_str], RawCandidate::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCandidate::into_candidate).collect()
  }

  async fn reject_candidate(&self, id: Uuid, review: Review) -> Result<bool> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(review.reviewed_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE candidates
           SET status = 'rejected', reviewer = ?2, reviewed_at = ?3,
               review_notes = ?4
           WHERE candidate_id = ?1 AND status = 'pending'",
          rusqlite::params![id_str, review.reviewer, at_str, review.notes],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn annotate_candidate(
    &self,
    id: Uuid,
    annotation: Option<String>,
  ) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE candidates SET annotation = ?2 WHERE candidate_id = ?1",
          rusqlite::params![id_str, annotation],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  // ── Categories ────────────────────────────────────────────────────────────

  async fn create_category(&self, input: NewCategory) -> Result<Category> {
    let category = Category {
      category_id: Uuid::new_v4(),
      slug:        input.slug(),
      name:        input.name,
      prefix:      input.prefix,
    };

    let id_str = encode_uuid(category.category_id);
    let name   = category.name.clone();
    let slug   = category.slug.clone();
    let prefix = category.prefix.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO categories (category_id, name, slug, prefix)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, slug, prefix],
        )?;
        Ok(())
      })
      .await?;

    Ok(category)
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let raws: Vec<RawCategory> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT category_id, name, slug, prefix FROM categories
           ORDER BY name",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawCategory {
              category_id: row.get(0)?,
              name:        row.get(1)?,
              slug:        row.get(2)?,
              prefix:      row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCategory::into_category).collect()
  }

  // ── Identifiers and entries ───────────────────────────────────────────────

  async fn max_sequence(&self, year: i32) -> Result<u32> {
    let max: u32 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COALESCE(MAX(sequence), 0) FROM sequence_claims
           WHERE year = ?1",
          rusqlite::params![year],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(max)
  }

  async fn commit_approval(
    &self,
    entry: CatalogEntry,
    review: Review,
  ) -> Result<ApprovalCommit> {
    let entry_id_str     = encode_uuid(entry.entry_id);
    let candidate_id_str = encode_uuid(entry.candidate_id);
    let category_id_str  = encode_uuid(entry.category_id);
    let identifier_str   = entry.identifier.to_string();
    let year             = entry.identifier.year();
    let sequence         = entry.identifier.sequence();
    let created_at_str   = encode_dt(entry.created_at);
    let reviewed_at_str  = encode_dt(review.reviewed_at);
    let condition_str    = entry.condition.to_string();
    let status_str       = encode_entry_status(entry.status);
    let title            = entry.title.clone();
    let slug             = entry.slug.clone();
    let description      = entry.description.clone();
    let price            = entry.price;

    let committed = self
      .conn
      .call(move |conn| {
        // Dropping `tx` without commit rolls everything back.
        let tx = conn.transaction()?;

        let updated = tx.execute(
          "UPDATE candidates
           SET status = 'approved', catalog_entry_id = ?2, reviewer = ?3,
               reviewed_at = ?4, review_notes = ?5
           WHERE candidate_id = ?1 AND status = 'pending'",
          rusqlite::params![
            candidate_id_str,
            entry_id_str,
            review.reviewer,
            reviewed_at_str,
            review.notes,
          ],
        )?;
        if updated == 0 {
          return Ok(Some(false));
        }

        let claim = tx.execute(
          "INSERT INTO sequence_claims (year, sequence, identifier, claimed_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![year, sequence, identifier_str, created_at_str],
        );
        match claim {
          Err(e) if is_unique_violation(&e, CLAIM_KEYS) => return Ok(None),
          other => other?,
        };

        let insert = tx.execute(
          "INSERT INTO entries (
             entry_id, identifier, candidate_id, title, slug, description,
             price, category_id, condition, status, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            entry_id_str,
            identifier_str,
            candidate_id_str,
            title,
            slug,
            description,
            price,
            category_id_str,
            condition_str,
            status_str,
            created_at_str,
          ],
        );
        match insert {
          Err(e) if is_unique_violation(&e, ENTRY_KEYS) => return Ok(None),
          other => other?,
        };

        tx.commit()?;
        Ok(Some(true))
      })
      .await?;

    Ok(match committed {
      Some(true) => ApprovalCommit::Committed(entry),
      Some(false) => ApprovalCommit::CandidateNotPending,
      None => ApprovalCommit::IdentifierTaken,
    })
  }

  async fn get_entry(&self, id: Uuid) -> Result<Option<CatalogEntry>> {
    let id_str = encode_uuid(id);
    self.entry_where("entry_id = ?1", id_str).await
  }

  async fn get_entry_by_identifier(
    &self,
    identifier: &Identifier,
  ) -> Result<Option<CatalogEntry>> {
    self.entry_where("identifier = ?1", identifier.to_string()).await
  }

  async fn list_entries(
    &self,
    query: &EntryQuery,
  ) -> Result<Vec<CatalogEntry>> {
    let status_str   = query.status.map(encode_entry_status);
    let category_str = query.category_id.map(encode_uuid);
    let limit_val    = query.limit.unwrap_or(100) as i64;
    let offset_val   = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ENTRY_COLUMNS} FROM entries
           WHERE (?1 IS NULL OR status = ?1)
             AND (?2 IS NULL OR category_id = ?2)
           ORDER BY identifier
           LIMIT ?3 OFFSET ?4"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![status_str, category_str, limit_val, offset_val],
            RawEntry::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEntry::into_entry).collect()
  }

  async fn delete_entry(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM entries WHERE entry_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }
}

impl SqliteStore {
  async fn entry_where(
    &self,
    predicate: &'static str,
    value: String,
  ) -> Result<Option<CatalogEntry>> {
    let raw: Option<RawEntry> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE {predicate}"),
              rusqlite::params![value],
              RawEntry::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEntry::into_entry).transpose()
  }
}
