//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings with fixed microsecond precision so that
//! lexical order matches time order. Analysis payloads and price quotes are
//! stored as compact JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use curio_core::{
  candidate::{Candidate, CandidateStatus, Condition, Review},
  catalog::{CatalogEntry, EntryStatus},
  category::Category,
  identifier::Identifier,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_candidate_status(s: CandidateStatus) -> &'static str {
  match s {
    CandidateStatus::Pending => "pending",
    CandidateStatus::Approved => "approved",
    CandidateStatus::Rejected => "rejected",
  }
}

pub fn decode_candidate_status(s: &str) -> Result<CandidateStatus> {
  match s {
    "pending" => Ok(CandidateStatus::Pending),
    "approved" => Ok(CandidateStatus::Approved),
    "rejected" => Ok(CandidateStatus::Rejected),
    other => Err(unknown("candidates.status", other)),
  }
}

pub fn encode_entry_status(s: EntryStatus) -> &'static str {
  match s {
    EntryStatus::Active => "active",
    EntryStatus::Sold => "sold",
    EntryStatus::Archived => "archived",
  }
}

pub fn decode_entry_status(s: &str) -> Result<EntryStatus> {
  match s {
    "active" => Ok(EntryStatus::Active),
    "sold" => Ok(EntryStatus::Sold),
    "archived" => Ok(EntryStatus::Archived),
    other => Err(unknown("entries.status", other)),
  }
}

fn decode_condition(s: &str) -> Result<Condition> {
  s.parse().map_err(|_| unknown("entries.condition", s))
}

fn unknown(column: &'static str, value: &str) -> Error {
  Error::UnknownValue { column, value: value.to_owned() }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const CANDIDATE_COLUMNS: &str = "candidate_id, image_ref, category, notes,
  analysis_json, image_json, quote_json, status, catalog_entry_id,
  reviewer, reviewed_at, review_notes, annotation, created_at";

/// Raw strings read directly from a `candidates` row.
pub struct RawCandidate {
  pub candidate_id:     String,
  pub image_ref:        String,
  pub category:         String,
  pub notes:            Option<String>,
  pub analysis_json:    String,
  pub image_json:       String,
  pub quote_json:       String,
  pub status:           String,
  pub catalog_entry_id: Option<String>,
  pub reviewer:         Option<String>,
  pub reviewed_at:      Option<String>,
  pub review_notes:     Option<String>,
  pub annotation:       Option<String>,
  pub created_at:       String,
}

impl RawCandidate {
  /// Column order must match [`CANDIDATE_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      candidate_id:     row.get(0)?,
      image_ref:        row.get(1)?,
      category:         row.get(2)?,
      notes:            row.get(3)?,
      analysis_json:    row.get(4)?,
      image_json:       row.get(5)?,
      quote_json:       row.get(6)?,
      status:           row.get(7)?,
      catalog_entry_id: row.get(8)?,
      reviewer:         row.get(9)?,
      reviewed_at:      row.get(10)?,
      review_notes:     row.get(11)?,
      annotation:       row.get(12)?,
      created_at:       row.get(13)?,
    })
  }

  pub fn into_candidate(self) -> Result<Candidate> {
    let review = match (self.reviewer, self.reviewed_at) {
      (Some(reviewer), Some(at)) => Some(Review {
        reviewer,
        reviewed_at: decode_dt(&at)?,
        notes: self.review_notes,
      }),
      _ => None,
    };

    Ok(Candidate {
      candidate_id: decode_uuid(&self.candidate_id)?,
      image_ref: self.image_ref,
      category: self.category,
      notes: self.notes,
      analysis: serde_json::from_str(&self.analysis_json)?,
      image: serde_json::from_str(&self.image_json)?,
      quote: serde_json::from_str(&self.quote_json)?,
      status: decode_candidate_status(&self.status)?,
      catalog_entry_id: self
        .catalog_entry_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      review,
      annotation: self.annotation,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const ENTRY_COLUMNS: &str = "entry_id, identifier, candidate_id, title,
  slug, description, price, category_id, condition, status, created_at";

/// Raw values read directly from an `entries` row.
pub struct RawEntry {
  pub entry_id:     String,
  pub identifier:   String,
  pub candidate_id: String,
  pub title:        String,
  pub slug:         String,
  pub description:  String,
  pub price:        f64,
  pub category_id:  String,
  pub condition:    String,
  pub status:       String,
  pub created_at:   String,
}

impl RawEntry {
  /// Column order must match [`ENTRY_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entry_id:     row.get(0)?,
      identifier:   row.get(1)?,
      candidate_id: row.get(2)?,
      title:        row.get(3)?,
      slug:         row.get(4)?,
      description:  row.get(5)?,
      price:        row.get(6)?,
      category_id:  row.get(7)?,
      condition:    row.get(8)?,
      status:       row.get(9)?,
      created_at:   row.get(10)?,
    })
  }

  pub fn into_entry(self) -> Result<CatalogEntry> {
    Ok(CatalogEntry {
      entry_id:     decode_uuid(&self.entry_id)?,
      identifier:   decode_identifier(&self.identifier)?,
      candidate_id: decode_uuid(&self.candidate_id)?,
      title:        self.title,
      slug:         self.slug,
      description:  self.description,
      price:        self.price,
      category_id:  decode_uuid(&self.category_id)?,
      condition:    decode_condition(&self.condition)?,
      status:       decode_entry_status(&self.status)?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Stored identifiers were valid when written; re-validate them against the
/// year they were allocated in rather than today.
fn decode_identifier(s: &str) -> Result<Identifier> {
  let year = s
    .split('-')
    .nth(1)
    .and_then(|y| y.parse().ok())
    .unwrap_or(curio_core::identifier::MIN_YEAR);
  Ok(Identifier::parse_as_of(s, year)?)
}

/// Raw strings read directly from a `categories` row.
pub struct RawCategory {
  pub category_id: String,
  pub name:        String,
  pub slug:        String,
  pub prefix:      Option<String>,
}

impl RawCategory {
  pub fn into_category(self) -> Result<Category> {
    Ok(Category {
      category_id: decode_uuid(&self.category_id)?,
      name:        self.name,
      slug:        self.slug,
      prefix:      self.prefix,
    })
  }
}
