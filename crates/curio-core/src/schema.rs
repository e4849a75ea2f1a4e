//! Structural validation of raw analysis payloads.
//!
//! Both analysis services answer with structured text. Validation is
//! fail-fast: the first offending field is reported with its path and the
//! value found. No required field is ever defaulted or coerced; only the
//! optional `confidence` field on the item analysis has a default.

use serde_json::{Map, Value};

use crate::{
  Error, Result,
  candidate::{
    Authenticity, Condition, ImageAssessment, ItemAnalysis, Rarity, parse_label,
  },
};

pub const KEYWORD_COUNT: usize = 5;
pub const SEO_TITLE_CHARS: std::ops::RangeInclusive<usize> = 50..=60;
pub const SEO_DESCRIPTION_CHARS: std::ops::RangeInclusive<usize> = 150..=160;
pub const QUALITY_SCORE: std::ops::RangeInclusive<u64> = 1..=10;
/// Used when the item analysis omits its self-reported confidence.
pub const DEFAULT_MODEL_CONFIDENCE: f64 = 50.0;

// ─── Text → JSON ─────────────────────────────────────────────────────────────

/// Pull a JSON object out of a model's text reply.
///
/// Tries a direct parse, then the first fenced code block, then the span
/// between the first `{` and the last `}`.
pub fn extract_json(text: &str) -> Result<Value> {
  let trimmed = text.trim();
  if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
    return Ok(v);
  }

  if let Some(start) = trimmed.find("```") {
    let rest = &trimmed[start + 3..];
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    if let Some(end) = rest.find("```")
      && let Ok(v) = serde_json::from_str::<Value>(rest[..end].trim())
    {
      return Ok(v);
    }
  }

  if let (Some(open), Some(close)) = (trimmed.find('{'), trimmed.rfind('}'))
    && open < close
    && let Ok(v) = serde_json::from_str::<Value>(&trimmed[open..=close])
  {
    return Ok(v);
  }

  Err(Error::schema("$", snippet(trimmed), "no JSON object found in reply"))
}

// ─── Item analysis ───────────────────────────────────────────────────────────

/// Validate the descriptive/pricing analysis.
pub fn validate_item_analysis(raw: &Value) -> Result<ItemAnalysis> {
  let obj = object(raw)?;

  let title = required_str(obj, "title")?;
  let description = required_str(obj, "description")?;
  let short_description = required_str(obj, "shortDescription")?;
  let estimated_era = required_str(obj, "estimatedEra")?;
  let condition: Condition = required_enum(obj, "condition")?;
  let rarity: Rarity = required_enum(obj, "rarity")?;
  let authenticity: Authenticity = required_enum(obj, "authenticity")?;

  let suggested_price = required_number(obj, "suggestedPrice")?;
  if suggested_price <= 0.0 {
    return Err(Error::schema(
      "suggestedPrice",
      suggested_price,
      "must be a positive number",
    ));
  }

  let model_confidence = match obj.get("confidence") {
    None | Some(Value::Null) => DEFAULT_MODEL_CONFIDENCE,
    Some(_) => {
      let c = required_number(obj, "confidence")?;
      if !(0.0..=100.0).contains(&c) {
        return Err(Error::schema("confidence", c, "must be within 0-100"));
      }
      c
    }
  };

  let price_reasoning = required_str(obj, "priceReasoning")?;
  let investment_potential = required_str(obj, "investmentPotential")?;
  let historical_context = required_str(obj, "historicalContext")?;

  let keywords = string_array(obj, "keywords")?;
  if keywords.len() != KEYWORD_COUNT {
    return Err(Error::schema(
      "keywords",
      keywords.len(),
      format!("must contain exactly {KEYWORD_COUNT} keywords"),
    ));
  }

  let seo_title = required_str(obj, "seoTitle")?;
  check_chars("seoTitle", &seo_title, &SEO_TITLE_CHARS)?;
  let seo_description = required_str(obj, "seoDescription")?;
  check_chars("seoDescription", &seo_description, &SEO_DESCRIPTION_CHARS)?;

  Ok(ItemAnalysis {
    title,
    description,
    short_description,
    condition,
    rarity,
    authenticity,
    estimated_era,
    suggested_price,
    model_confidence,
    price_reasoning,
    investment_potential,
    historical_context,
    keywords,
    seo_title,
    seo_description,
  })
}

// ─── Image assessment ────────────────────────────────────────────────────────

/// Validate the image-quality analysis.
pub fn validate_image_assessment(raw: &Value) -> Result<ImageAssessment> {
  let obj = object(raw)?;

  let score = match obj.get("imageQuality") {
    None => return Err(missing("imageQuality")),
    Some(v) => match v.as_u64() {
      Some(n) if QUALITY_SCORE.contains(&n) => n as u8,
      Some(n) => {
        return Err(Error::schema("imageQuality", n, "must be within 1-10"));
      }
      None => {
        return Err(Error::schema(
          "imageQuality",
          snippet(&v.to_string()),
          "must be an integer",
        ));
      }
    },
  };

  let has_defects = match obj.get("hasDefects") {
    None => return Err(missing("hasDefects")),
    Some(Value::Bool(b)) => *b,
    Some(v) => {
      return Err(Error::schema(
        "hasDefects",
        snippet(&v.to_string()),
        "must be a boolean",
      ));
    }
  };

  let defect_description = string_field(obj, "defectDescription")?;
  let photography_notes = required_str(obj, "photographyNotes")?;
  let suggested_improvements = string_array(obj, "suggestedImprovements")?;

  Ok(ImageAssessment {
    quality_score: score,
    has_defects,
    defect_description,
    photography_notes,
    suggested_improvements,
  })
}

// ─── Field helpers ───────────────────────────────────────────────────────────

fn object(raw: &Value) -> Result<&Map<String, Value>> {
  raw.as_object().ok_or_else(|| {
    Error::schema("$", snippet(&raw.to_string()), "payload must be an object")
  })
}

fn missing(field: &str) -> Error {
  Error::schema(field, "<missing>", "required field is missing")
}

/// A present string field; may be empty.
fn string_field(obj: &Map<String, Value>, field: &str) -> Result<String> {
  match obj.get(field) {
    None => Err(missing(field)),
    Some(Value::String(s)) => Ok(s.clone()),
    Some(v) => {
      Err(Error::schema(field, snippet(&v.to_string()), "must be a string"))
    }
  }
}

/// A present, non-blank string field.
fn required_str(obj: &Map<String, Value>, field: &str) -> Result<String> {
  let s = string_field(obj, field)?;
  if s.trim().is_empty() {
    return Err(Error::schema(field, "\"\"", "must not be empty"));
  }
  Ok(s)
}

fn required_number(obj: &Map<String, Value>, field: &str) -> Result<f64> {
  match obj.get(field) {
    None => Err(missing(field)),
    Some(v) => match v.as_f64() {
      Some(n) if n.is_finite() => Ok(n),
      _ => Err(Error::schema(
        field,
        snippet(&v.to_string()),
        "must be a finite number",
      )),
    },
  }
}

fn required_enum<T>(obj: &Map<String, Value>, field: &str) -> Result<T>
where
  T: std::str::FromStr,
{
  let label = required_str(obj, field)?;
  parse_label(&label)
    .ok_or_else(|| Error::schema(field, &label, "not a recognised value"))
}

fn string_array(obj: &Map<String, Value>, field: &str) -> Result<Vec<String>> {
  let items = match obj.get(field) {
    None => return Err(missing(field)),
    Some(Value::Array(items)) => items,
    Some(v) => {
      return Err(Error::schema(
        field,
        snippet(&v.to_string()),
        "must be an array of strings",
      ));
    }
  };

  items
    .iter()
    .enumerate()
    .map(|(i, item)| match item {
      Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
      other => Err(Error::schema(
        format!("{field}[{i}]"),
        snippet(&other.to_string()),
        "must be a non-empty string",
      )),
    })
    .collect()
}

fn check_chars(
  field: &str,
  value: &str,
  range: &std::ops::RangeInclusive<usize>,
) -> Result<()> {
  let n = value.chars().count();
  if range.contains(&n) {
    Ok(())
  } else {
    Err(Error::schema(
      field,
      format!("{n} chars"),
      format!("length must be {}-{} characters", range.start(), range.end()),
    ))
  }
}

fn snippet(s: &str) -> String {
  if s.chars().count() <= 60 {
    s.to_owned()
  } else {
    let head: String = s.chars().take(57).collect();
    format!("{head}...")
  }
}
