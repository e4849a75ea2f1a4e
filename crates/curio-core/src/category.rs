//! Catalog categories and free-text category resolution.
//!
//! Analyses produce a free-text category hint. On approval it must resolve
//! to exactly one stored category. Resolution order:
//!
//! 1. exact, case-insensitive match on name or slug;
//! 2. the alias table (operator-maintained disambiguation);
//! 3. a case-insensitive substring match in either direction, accepted only
//!    when exactly one category matches.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, identifier::suggested_prefix};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub category_id: Uuid,
  pub name:        String,
  pub slug:        String,
  /// Explicit identifier prefix; when absent one is suggested from the name.
  pub prefix:      Option<String>,
}

impl Category {
  pub fn identifier_prefix(&self) -> String {
    self
      .prefix
      .clone()
      .unwrap_or_else(|| suggested_prefix(&self.name))
  }
}

/// Input to [`crate::store::CatalogStore::create_category`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
  pub name:   String,
  pub slug:   Option<String>,
  pub prefix: Option<String>,
}

impl NewCategory {
  pub fn slug(&self) -> String {
    self.slug.clone().unwrap_or_else(|| {
      self
        .name
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
    })
  }
}

/// Free text (lowercased) → canonical category name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "HashMap<String, String>")]
pub struct CategoryAliases(HashMap<String, String>);

impl CategoryAliases {
  pub fn get(&self, input: &str) -> Option<&str> {
    self.0.get(&input.trim().to_lowercase()).map(String::as_str)
  }
}

impl From<HashMap<String, String>> for CategoryAliases {
  fn from(map: HashMap<String, String>) -> Self {
    Self(map.into_iter().map(|(k, v)| (k.trim().to_lowercase(), v)).collect())
  }
}

/// Resolve a free-text hint against a pre-fetched category set.
pub fn resolve_category<'a>(
  categories: &'a [Category],
  aliases: &CategoryAliases,
  input: &str,
) -> Result<&'a Category> {
  let needle = input.trim().to_lowercase();
  if needle.is_empty() {
    return Err(Error::CategoryNotFound(input.to_owned()));
  }

  let exact = |name: &str| {
    categories.iter().find(|c| {
      c.name.to_lowercase() == name || c.slug.to_lowercase() == name
    })
  };

  if let Some(c) = exact(&needle) {
    return Ok(c);
  }

  if let Some(target) = aliases.get(&needle)
    && let Some(c) = exact(&target.trim().to_lowercase())
  {
    return Ok(c);
  }

  let matches: Vec<&Category> = categories
    .iter()
    .filter(|c| {
      let name = c.name.to_lowercase();
      name.contains(&needle) || needle.contains(&name)
    })
    .collect();

  match matches.as_slice() {
    [] => Err(Error::CategoryNotFound(input.to_owned())),
    [only] => Ok(only),
    many => Err(Error::AmbiguousCategory {
      input:   input.to_owned(),
      matches: many.iter().map(|c| c.name.clone()).collect(),
    }),
  }
}
