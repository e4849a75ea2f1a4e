//! A candidate is written once by the analysis merger and afterwards only
//! touched by the approval workflow, which may move it out of `Pending`
//! exactly once. Review annotations stay editable on terminal candidates.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString};
use uuid::Uuid;

use crate::pricing::PriceQuote;

// ─── Categorical attributes ──────────────────────────────────────────────────

/// Physical condition as assessed by the descriptive analysis.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumString,
  EnumIter,
  strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
  Excellent,
  VeryGood,
  Good,
  Fair,
  Poor,
}

/// How scarce the item is believed to be.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumString,
  EnumIter,
  strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Rarity {
  Common,
  Uncommon,
  Rare,
  VeryRare,
  ExtremelyRare,
}

/// The analysis' opinion on whether the item is what it claims to be.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  EnumString,
  EnumIter,
  strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Authenticity {
  BelievedAuthentic,
  Attributed,
  SchoolOf,
  PossiblyReproduction,
}

/// Normalise a human label ("Very Good", "very-good", "VERY_GOOD") to the
/// SCREAMING_SNAKE_CASE form the strum parsers expect.
fn normalise_label(label: &str) -> String {
  label
    .trim()
    .chars()
    .map(|c| match c {
      ' ' | '-' => '_',
      c => c.to_ascii_uppercase(),
    })
    .collect()
}

/// Parse any of the categorical enums from a free-form label.
pub fn parse_label<T: FromStr>(label: &str) -> Option<T> {
  T::from_str(&normalise_label(label)).ok()
}

// ─── Analysis payloads (validated) ───────────────────────────────────────────

/// The descriptive/pricing analysis after schema validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAnalysis {
  pub title:                String,
  pub description:          String,
  pub short_description:    String,
  pub condition:            Condition,
  pub rarity:               Rarity,
  pub authenticity:         Authenticity,
  /// Free-text era or year, e.g. "1965", "1920s", "Late 19th Century".
  pub estimated_era:        String,
  /// The model's own price estimate in USD; always finite and positive.
  pub suggested_price:      f64,
  /// The model's self-reported confidence, 0–100.
  pub model_confidence:     f64,
  pub price_reasoning:      String,
  pub investment_potential: String,
  pub historical_context:   String,
  pub keywords:             Vec<String>,
  pub seo_title:            String,
  pub seo_description:      String,
}

/// The image-quality analysis after schema validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAssessment {
  /// Integer score in `1..=10`.
  pub quality_score:          u8,
  pub has_defects:            bool,
  pub defect_description:     String,
  pub photography_notes:      String,
  pub suggested_improvements: Vec<String>,
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CandidateStatus {
  Pending,
  Approved,
  Rejected,
}

impl CandidateStatus {
  pub fn is_pending(&self) -> bool { matches!(self, Self::Pending) }

  /// The only legal transitions are out of `Pending`.
  pub fn can_transition_to(&self, next: CandidateStatus) -> bool {
    matches!(
      (self, next),
      (Self::Pending, Self::Approved) | (Self::Pending, Self::Rejected)
    )
  }
}

/// Who reviewed a candidate, when, and what they noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
  pub reviewer:    String,
  pub reviewed_at: DateTime<Utc>,
  pub notes:       Option<String>,
}

// ─── Candidate ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
  pub candidate_id:     Uuid,
  pub image_ref:        String,
  /// Category hint as typed by the operator; resolved only on approval.
  pub category:         String,
  /// Submission notes as sent to the analysis services. Fixed at ingest.
  pub notes:            Option<String>,
  pub analysis:         ItemAnalysis,
  pub image:            ImageAssessment,
  /// Pricing computed at ingest time; informational.
  pub quote:            PriceQuote,
  pub status:           CandidateStatus,
  /// Set exactly once, together with `status = Approved`.
  pub catalog_entry_id: Option<Uuid>,
  pub review:           Option<Review>,
  /// Administrator remark, editable in every status.
  pub annotation:       Option<String>,
  pub created_at:       DateTime<Utc>,
}

/// Input to [`crate::store::CatalogStore::create_candidate`].
/// Id, status and `created_at` are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewCandidate {
  pub image_ref: String,
  pub category:  String,
  pub notes:     Option<String>,
  pub analysis:  ItemAnalysis,
  pub image:     ImageAssessment,
  pub quote:     PriceQuote,
}
