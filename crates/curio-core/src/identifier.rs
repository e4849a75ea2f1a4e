//! Stock identifiers of the form `PREFIX-YYYY-NNN`.
//!
//! - `PREFIX`: 2–5 uppercase ASCII letters, usually derived from the category.
//! - `YYYY`: the allocation year, `2020..=current_year + 1`.
//! - `NNN`: zero-padded sequence, `1..=999`, scoped per year.
//!
//! Every constructor validates, so an [`Identifier`] value is always
//! well-formed. Validation never touches storage.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const MIN_YEAR: i32 = 2020;
pub const MAX_SEQUENCE: u32 = 999;
pub const MIN_PREFIX_LEN: usize = 2;
pub const MAX_PREFIX_LEN: usize = 5;
/// Prefix used when a category name yields no usable letters.
pub const FALLBACK_PREFIX: &str = "KOL";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier {
  prefix:   String,
  year:     i32,
  sequence: u32,
}

impl Identifier {
  /// Build and validate against the current calendar year.
  pub fn new(prefix: &str, year: i32, sequence: u32) -> Result<Self> {
    Self::new_as_of(prefix, year, sequence, Utc::now().year())
  }

  /// Build and validate against an explicit "current" year.
  pub fn new_as_of(
    prefix: &str,
    year: i32,
    sequence: u32,
    current_year: i32,
  ) -> Result<Self> {
    let id = Self { prefix: prefix.to_owned(), year, sequence };
    id.validate(current_year)?;
    Ok(id)
  }

  /// Parse a formatted identifier, validating against the current year.
  pub fn parse(s: &str) -> Result<Self> {
    Self::parse_as_of(s, Utc::now().year())
  }

  pub fn parse_as_of(s: &str, current_year: i32) -> Result<Self> {
    let invalid = |reason: &str| Error::InvalidIdentifier {
      value:  s.to_owned(),
      reason: reason.to_owned(),
    };

    let mut parts = s.split('-');
    let (Some(prefix), Some(year), Some(seq), None) =
      (parts.next(), parts.next(), parts.next(), parts.next())
    else {
      return Err(invalid("expected PREFIX-YYYY-NNN"));
    };

    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
      return Err(invalid("year must be exactly four digits"));
    }
    if seq.len() != 3 || !seq.bytes().all(|b| b.is_ascii_digit()) {
      return Err(invalid("sequence must be exactly three digits"));
    }

    // Both are pure digit strings of bounded length, so parsing cannot fail.
    let year: i32 = year.parse().map_err(|_| invalid("year is not a number"))?;
    let seq: u32 = seq
      .parse()
      .map_err(|_| invalid("sequence is not a number"))?;

    Self::new_as_of(prefix, year, seq, current_year)
  }

  fn validate(&self, current_year: i32) -> Result<()> {
    let invalid = |reason: String| Error::InvalidIdentifier {
      value: format!("{}-{}-{}", self.prefix, self.year, self.sequence),
      reason,
    };

    if !valid_prefix(&self.prefix) {
      return Err(invalid(format!(
        "prefix must be {MIN_PREFIX_LEN}-{MAX_PREFIX_LEN} uppercase letters"
      )));
    }
    if self.year < MIN_YEAR || self.year > current_year + 1 {
      return Err(invalid(format!(
        "year must be between {MIN_YEAR} and {}",
        current_year + 1
      )));
    }
    if self.sequence < 1 || self.sequence > MAX_SEQUENCE {
      return Err(invalid(format!(
        "sequence must be between 1 and {MAX_SEQUENCE}"
      )));
    }
    Ok(())
  }

  pub fn prefix(&self) -> &str { &self.prefix }

  pub fn year(&self) -> i32 { self.year }

  pub fn sequence(&self) -> u32 { self.sequence }
}

impl fmt::Display for Identifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{:04}-{:03}", self.prefix, self.year, self.sequence)
  }
}

impl FromStr for Identifier {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for Identifier {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

impl From<Identifier> for String {
  fn from(id: Identifier) -> Self { id.to_string() }
}

pub fn valid_prefix(prefix: &str) -> bool {
  (MIN_PREFIX_LEN..=MAX_PREFIX_LEN).contains(&prefix.len())
    && prefix.bytes().all(|b| b.is_ascii_uppercase())
}

/// Suggest an identifier prefix from a category name or slug.
pub fn suggested_prefix(category: &str) -> String {
  let lower = category.to_lowercase();

  if lower.contains("milit") {
    return "MILI".into();
  }
  if lower.contains("collect") {
    return "COLL".into();
  }
  if lower.contains("book") || lower.contains("rare") {
    return "BOOK".into();
  }
  if lower.contains("art") || lower.contains("fine") {
    return "ARTS".into();
  }

  let letters: String = category
    .chars()
    .filter(char::is_ascii_alphabetic)
    .take(4)
    .map(|c| c.to_ascii_uppercase())
    .collect();

  if letters.len() < MIN_PREFIX_LEN {
    FALLBACK_PREFIX.into()
  } else {
    letters
  }
}
