//! Deterministic pricing: categorical multipliers, source blending,
//! confidence scoring and the acceptable price range.
//!
//! Everything here is a pure function of its inputs plus the "current year"
//! held by [`PricingEngine`]. Every input has a fallback, so pricing never
//! fails; an unusable base price simply prices at zero.

use serde::{Deserialize, Serialize};

use crate::candidate::{Condition, ItemAnalysis, Rarity};

// ─── Tables ──────────────────────────────────────────────────────────────────

/// Lower bound on the combined multiplier (and on the final price, relative
/// to the base price).
pub const MULTIPLIER_MIN: f64 = 0.1;
/// Upper bound on the combined multiplier.
pub const MULTIPLIER_MAX: f64 = 10.0;

/// Confidence before any factor is applied.
pub const NEUTRAL_CONFIDENCE: i32 = 50;

pub const MODEL_WEIGHT: f64 = 0.5;
pub const HISTORICAL_WEIGHT: f64 = 0.3;
pub const MARKET_WEIGHT: f64 = 0.2;

const CATEGORY_MULTIPLIERS: &[(&str, f64)] = &[
  ("Vintage Watches", 1.8),
  ("Antique Furniture", 1.5),
  ("Fine Art", 2.5),
  ("Coins & Currency", 1.6),
  ("Stamps & Philately", 1.3),
  ("Jewelry", 2.0),
  ("Books & Manuscripts", 1.4),
  ("Ceramics & Pottery", 1.5),
  ("Glass", 1.2),
  ("Memorabilia", 1.3),
  ("Musical Instruments", 1.9),
  ("Toys & Games", 1.1),
  ("Sports Equipment", 1.2),
  ("Militaria", 1.4),
  ("Photography", 1.7),
];

const DECADE_BONUSES: &[(i32, f64)] = &[
  (1920, 1.15),
  (1930, 1.12),
  (1950, 1.10),
  (1960, 1.15),
  (1970, 1.08),
  (1980, 1.05),
];

/// Names of every category with a non-default multiplier.
pub fn known_categories() -> impl Iterator<Item = &'static str> {
  CATEGORY_MULTIPLIERS.iter().map(|(name, _)| *name)
}

pub fn category_multiplier(category: &str) -> f64 {
  let category = category.trim();
  CATEGORY_MULTIPLIERS
    .iter()
    .find(|(name, _)| name.eq_ignore_ascii_case(category))
    .map_or(1.0, |(_, m)| *m)
}

pub fn condition_multiplier(condition: Condition) -> f64 {
  match condition {
    Condition::Excellent => 1.0,
    Condition::VeryGood => 0.85,
    Condition::Good => 0.7,
    Condition::Fair => 0.5,
    Condition::Poor => 0.3,
  }
}

pub fn rarity_multiplier(rarity: Rarity) -> f64 {
  match rarity {
    Rarity::Common => 0.8,
    Rarity::Uncommon => 1.0,
    Rarity::Rare => 1.5,
    Rarity::VeryRare => 2.5,
    Rarity::ExtremelyRare => 4.0,
  }
}

/// Best-effort year from an era string.
///
/// The first standalone run of exactly four digits wins ("1965", "1920s",
/// "circa 1890"). Failing that, "19th century" style text maps to the
/// century's midpoint. Anything else has no year.
pub fn item_year(era: &str) -> Option<i32> {
  let bytes = era.as_bytes();
  let mut i = 0;
  while i < bytes.len() {
    if bytes[i].is_ascii_digit() {
      let start = i;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      if i - start == 4 {
        return era[start..i].parse().ok();
      }
    } else {
      i += 1;
    }
  }
  century_midpoint(era)
}

fn century_midpoint(era: &str) -> Option<i32> {
  let lower = era.to_lowercase();
  let idx = lower.find("century")?;
  let ordinal = lower[..idx].split_whitespace().last()?;
  let digits: String =
    ordinal.chars().take_while(char::is_ascii_digit).collect();
  let suffix = &ordinal[digits.len()..];
  if !matches!(suffix, "st" | "nd" | "rd" | "th") {
    return None;
  }
  let century: i32 = digits.parse().ok()?;
  (1..=21).contains(&century).then(|| (century - 1) * 100 + 50)
}

/// Age bands: `<10y` 0.9, `<25y` 1.0, `<50y` 1.2, `<100y` 1.5, else 2.0.
/// Unknown or future years are neutral.
pub fn age_multiplier(era: &str, current_year: i32) -> f64 {
  let Some(year) = item_year(era) else { return 1.0 };
  let age = current_year - year;
  match age {
    i32::MIN..0 => 1.0,
    0..10 => 0.9,
    10..25 => 1.0,
    25..50 => 1.2,
    50..100 => 1.5,
    _ => 2.0,
  }
}

pub fn decade_bonus(era: &str) -> f64 {
  let Some(year) = item_year(era) else { return 1.0 };
  let decade = year.div_euclid(10) * 10;
  DECADE_BONUSES
    .iter()
    .find(|(d, _)| *d == decade)
    .map_or(1.0, |(_, b)| *b)
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
  Up,
  Flat,
  Down,
}

impl Trend {
  fn multiplier(self) -> f64 {
    match self {
      Self::Up => 1.1,
      Self::Flat => 1.0,
      Self::Down => 0.9,
    }
  }
}

/// Current market figures for the item's category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTrend {
  pub average_price: f64,
  pub trend:         Trend,
  /// The figures are from the last 30 days.
  #[serde(default)]
  pub recent:        bool,
}

/// Everything the engine looks at. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingInput {
  /// The model's own estimate; the multipliers scale this.
  pub base_price:         f64,
  pub category:           String,
  pub condition:          Condition,
  pub rarity:             Rarity,
  pub era:                String,
  /// The model's self-reported confidence, 0–100.
  pub model_confidence:   f64,
  #[serde(default)]
  pub comparable_sales:   Vec<f64>,
  #[serde(default)]
  pub market:             Option<MarketTrend>,
  #[serde(default)]
  pub verified_condition: bool,
  #[serde(default)]
  pub authenticated:      bool,
}

impl PricingInput {
  /// Inputs derived from a validated analysis alone.
  pub fn from_analysis(category: &str, analysis: &ItemAnalysis) -> Self {
    Self {
      base_price:         analysis.suggested_price,
      category:           category.to_owned(),
      condition:          analysis.condition,
      rarity:             analysis.rarity,
      era:                analysis.estimated_era.clone(),
      model_confidence:   analysis.model_confidence,
      comparable_sales:   Vec::new(),
      market:             None,
      verified_condition: false,
      authenticated:      false,
    }
  }
}

// ─── Outputs ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Multipliers {
  pub category:  f64,
  pub condition: f64,
  pub rarity:    f64,
  pub age:       f64,
  pub decade:    f64,
  /// Product of the five, before clamping.
  pub combined:  f64,
  /// `combined` clamped to `[MULTIPLIER_MIN, MULTIPLIER_MAX]`.
  pub applied:   f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
  Model,
  Historical,
  Market,
}

impl PriceSource {
  pub fn nominal_weight(self) -> f64 {
    match self {
      Self::Model => MODEL_WEIGHT,
      Self::Historical => HISTORICAL_WEIGHT,
      Self::Market => MARKET_WEIGHT,
    }
  }
}

/// One source's estimate and the weight it actually received.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceEstimate {
  pub source: PriceSource,
  pub price:  f64,
  pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceSignal {
  ExcellentModelConfidence,
  GoodModelConfidence,
  ComparableSales,
  ManyComparableSales,
  RecentMarketData,
  SourcesAgree,
  VerifiedCondition,
  Authenticated,
  RareItem,
  LimitedComparables,
  TrendingUp,
  TrendingDown,
}

impl ConfidenceSignal {
  pub fn impact(self) -> i32 {
    match self {
      Self::ExcellentModelConfidence => 25,
      Self::GoodModelConfidence => 15,
      Self::ComparableSales => 20,
      Self::ManyComparableSales => 15,
      Self::RecentMarketData => 20,
      Self::SourcesAgree => 10,
      Self::VerifiedCondition => 15,
      Self::Authenticated => 20,
      Self::RareItem => -20,
      Self::LimitedComparables => -15,
      Self::TrendingUp => 10,
      Self::TrendingDown => -10,
    }
  }
}

/// Width of the acceptable range around the suggested price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeBand {
  /// Confidence ≥ 80: ±15%.
  Narrow,
  /// Confidence in [60, 80): ±25%.
  Medium,
  /// Confidence < 60: ±35%.
  Wide,
}

impl RangeBand {
  pub fn for_confidence(confidence: u8) -> Self {
    match confidence {
      80.. => Self::Narrow,
      60..80 => Self::Medium,
      _ => Self::Wide,
    }
  }

  pub fn spread(self) -> f64 {
    match self {
      Self::Narrow => 0.15,
      Self::Medium => 0.25,
      Self::Wide => 0.35,
    }
  }
}

/// The part of a pricing result worth persisting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
  pub suggested_price: f64,
  pub low:             f64,
  pub high:            f64,
  pub confidence:      u8,
  pub band:            RangeBand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
  pub quote:       PriceQuote,
  pub multipliers: Multipliers,
  pub sources:     Vec<SourceEstimate>,
  pub signals:     Vec<ConfidenceSignal>,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct PricingEngine {
  current_year: i32,
}

impl PricingEngine {
  pub fn new(current_year: i32) -> Self { Self { current_year } }

  /// An engine anchored to today's calendar year.
  pub fn current() -> Self {
    use chrono::Datelike as _;
    Self::new(chrono::Utc::now().year())
  }

  pub fn multipliers(
    &self,
    category: &str,
    condition: Condition,
    rarity: Rarity,
    era: &str,
  ) -> Multipliers {
    let category = category_multiplier(category);
    let condition = condition_multiplier(condition);
    let rarity = rarity_multiplier(rarity);
    let age = age_multiplier(era, self.current_year);
    let decade = decade_bonus(era);
    let combined = category * condition * rarity * age * decade;
    Multipliers {
      category,
      condition,
      rarity,
      age,
      decade,
      combined,
      applied: combined.clamp(MULTIPLIER_MIN, MULTIPLIER_MAX),
    }
  }

  /// Full pricing run.
  pub fn price(&self, input: &PricingInput) -> PricingResult {
    let base = usable(input.base_price).unwrap_or(0.0);
    let multipliers = self.multipliers(
      &input.category,
      input.condition,
      input.rarity,
      &input.era,
    );

    let model = base * multipliers.applied;
    let historical = historical_estimate(&input.comparable_sales);
    let market = input.market.as_ref().and_then(|m| {
      usable(m.average_price).and_then(|avg| {
        usable(avg * m.trend.multiplier() * multipliers.category)
      })
    });

    let (blended, sources) = blend(&[
      (PriceSource::Model, usable(model)),
      (PriceSource::Historical, historical),
      (PriceSource::Market, market),
    ]);

    let suggested = if base > 0.0 {
      blended.clamp(base * MULTIPLIER_MIN, base * MULTIPLIER_MAX)
    } else {
      blended
    };

    let signals = confidence_signals(input, historical, market);
    let confidence = confidence_score(&signals);
    let band = RangeBand::for_confidence(confidence);

    PricingResult {
      quote: PriceQuote {
        suggested_price: cents(suggested),
        low: cents(suggested * (1.0 - band.spread())),
        high: cents(suggested * (1.0 + band.spread())),
        confidence,
        band,
      },
      multipliers,
      sources,
      signals,
    }
  }
}

/// Weighted average over the sources that produced an estimate.
///
/// Nominal weights are 50/30/20 (model/historical/market). A missing
/// source's weight is redistributed over the present ones in proportion to
/// their nominal weights, i.e. every present weight is divided by the sum of
/// present nominal weights. With no sources the price is zero.
pub fn blend(
  estimates: &[(PriceSource, Option<f64>)],
) -> (f64, Vec<SourceEstimate>) {
  let present: Vec<(PriceSource, f64)> = estimates
    .iter()
    .filter_map(|(s, p)| p.and_then(usable).map(|p| (*s, p)))
    .collect();

  let total: f64 = present.iter().map(|(s, _)| s.nominal_weight()).sum();
  if total <= 0.0 {
    return (0.0, Vec::new());
  }

  let sources: Vec<SourceEstimate> = present
    .into_iter()
    .map(|(source, price)| SourceEstimate {
      source,
      price,
      weight: source.nominal_weight() / total,
    })
    .collect();

  let price = sources.iter().map(|s| s.price * s.weight).sum();
  (price, sources)
}

/// `0.5 × median + 0.5 × midpoint of the interquartile bounds`.
fn historical_estimate(comps: &[f64]) -> Option<f64> {
  let mut sorted: Vec<f64> =
    comps.iter().copied().filter_map(usable).collect();
  if sorted.is_empty() {
    return None;
  }
  sorted.sort_by(f64::total_cmp);
  let n = sorted.len();
  let median = sorted[n / 2];
  let q1 = sorted[n / 4];
  let q3 = sorted[(n * 3) / 4];
  usable(median * 0.5 + ((q1 + q3) / 2.0) * 0.5)
}

fn confidence_signals(
  input: &PricingInput,
  historical: Option<f64>,
  market: Option<f64>,
) -> Vec<ConfidenceSignal> {
  use ConfidenceSignal::*;

  let mut signals = Vec::new();

  if input.model_confidence >= 90.0 {
    signals.push(ExcellentModelConfidence);
  } else if input.model_confidence >= 70.0 {
    signals.push(GoodModelConfidence);
  }

  let comps = input.comparable_sales.iter().filter(|p| usable(**p).is_some());
  match comps.count() {
    0 => signals.push(LimitedComparables),
    n => {
      signals.push(ComparableSales);
      if n >= 5 {
        signals.push(ManyComparableSales);
      }
    }
  }

  if let Some(m) = &input.market {
    if m.recent {
      signals.push(RecentMarketData);
    }
    match m.trend {
      Trend::Up => signals.push(TrendingUp),
      Trend::Down => signals.push(TrendingDown),
      Trend::Flat => {}
    }
  }

  if let (Some(h), Some(m)) = (historical, market)
    && (h - m).abs() / ((h + m) / 2.0) < 0.2
  {
    signals.push(SourcesAgree);
  }

  if input.verified_condition {
    signals.push(VerifiedCondition);
  }
  if input.authenticated {
    signals.push(Authenticated);
  }
  if matches!(input.rarity, Rarity::VeryRare | Rarity::ExtremelyRare) {
    signals.push(RareItem);
  }

  signals
}

fn confidence_score(signals: &[ConfidenceSignal]) -> u8 {
  let raw =
    NEUTRAL_CONFIDENCE + signals.iter().map(|s| s.impact()).sum::<i32>();
  raw.clamp(0, 100) as u8
}

fn usable(price: f64) -> Option<f64> {
  (price.is_finite() && price > 0.0).then_some(price)
}

fn cents(x: f64) -> f64 { (x * 100.0).round() / 100.0 }

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator as _;

  use super::*;

  const NOW: i32 = 2026;

  fn input(
    category: &str,
    condition: Condition,
    rarity: Rarity,
    era: &str,
  ) -> PricingInput {
    PricingInput {
      base_price:         100.0,
      category:           category.into(),
      condition,
      rarity,
      era:                era.into(),
      model_confidence:   50.0,
      comparable_sales:   Vec::new(),
      market:             None,
      verified_condition: false,
      authenticated:      false,
    }
  }

  #[test]
  fn vintage_watch_example() {
    let engine = PricingEngine::new(NOW);
    let m = engine.multipliers(
      "Vintage Watches",
      Condition::Excellent,
      Rarity::Rare,
      "1965",
    );
    assert_eq!(m.category, 1.8);
    assert_eq!(m.condition, 1.0);
    assert_eq!(m.rarity, 1.5);
    assert_eq!(m.age, 1.5);
    assert_eq!(m.decade, 1.15);
    assert!((m.combined - 4.6575).abs() < 1e-9);

    let result = engine.price(&input(
      "Vintage Watches",
      Condition::Excellent,
      Rarity::Rare,
      "1965",
    ));
    assert_eq!(result.quote.suggested_price, 465.75);
  }

  #[test]
  fn unknown_category_and_invalid_years_are_neutral() {
    assert_eq!(category_multiplier("Beanie Babies"), 1.0);
    assert_eq!(category_multiplier("fine art"), 2.5);
    assert_eq!(age_multiplier("unknown", NOW), 1.0);
    assert_eq!(age_multiplier("2031", NOW), 1.0);
    assert_eq!(decade_bonus("unknown"), 1.0);
  }

  #[test]
  fn age_bands() {
    assert_eq!(age_multiplier("2020", NOW), 0.9);
    assert_eq!(age_multiplier("2010", NOW), 1.0);
    assert_eq!(age_multiplier("1990", NOW), 1.2);
    assert_eq!(age_multiplier("1950s", NOW), 1.5);
    assert_eq!(age_multiplier("circa 1880", NOW), 2.0);
    assert_eq!(age_multiplier("Late 19th Century", NOW), 2.0);
  }

  #[test]
  fn era_parsing() {
    assert_eq!(item_year("1920s"), Some(1920));
    assert_eq!(item_year("c. 1875-1880"), Some(1875));
    assert_eq!(item_year("18th century"), Some(1750));
    assert_eq!(item_year("12345"), None);
    assert_eq!(item_year("Edwardian"), None);
  }

  #[test]
  fn price_stays_within_base_bounds_for_every_tuple() {
    let engine = PricingEngine::new(NOW);
    let categories: Vec<&str> =
      known_categories().chain(["Unlisted", ""]).collect();
    let eras = ["2025", "2012", "1985", "1965", "1925", "1801", "x", "2090"];

    for category in &categories {
      for condition in Condition::iter() {
        for rarity in Rarity::iter() {
          for era in eras {
            let mut inp = input(category, condition, rarity, era);
            // Extreme comparables must not push the price out of bounds.
            inp.comparable_sales = vec![1.0e6, 2.0e6, 3.0e6];
            let q = engine.price(&inp).quote;
            assert!(
              (10.0..=1000.0).contains(&q.suggested_price),
              "{category}/{condition}/{rarity}/{era}: {}",
              q.suggested_price
            );
            assert!(q.confidence <= 100);
            assert!(q.low <= q.suggested_price && q.suggested_price <= q.high);
          }
        }
      }
    }
  }

  #[test]
  fn band_follows_thresholds() {
    assert_eq!(RangeBand::for_confidence(100), RangeBand::Narrow);
    assert_eq!(RangeBand::for_confidence(80), RangeBand::Narrow);
    assert_eq!(RangeBand::for_confidence(79), RangeBand::Medium);
    assert_eq!(RangeBand::for_confidence(60), RangeBand::Medium);
    assert_eq!(RangeBand::for_confidence(59), RangeBand::Wide);
    assert_eq!(RangeBand::for_confidence(0), RangeBand::Wide);
  }

  #[test]
  fn confidence_is_clamped() {
    let engine = PricingEngine::new(NOW);

    let mut high =
      input("Jewelry", Condition::Excellent, Rarity::Common, "1990");
    high.model_confidence = 95.0;
    high.comparable_sales = vec![100.0, 105.0, 110.0, 95.0, 100.0];
    high.market = Some(MarketTrend {
      average_price: 50.0,
      trend:         Trend::Up,
      recent:        true,
    });
    high.verified_condition = true;
    high.authenticated = true;
    let q = engine.price(&high).quote;
    assert_eq!(q.confidence, 100);
    assert_eq!(q.band, RangeBand::Narrow);
    assert_eq!(q.low, cents(q.suggested_price * 0.85));

    let mut low = input("Glass", Condition::Poor, Rarity::ExtremelyRare, "x");
    low.model_confidence = 10.0;
    low.market = Some(MarketTrend {
      average_price: 20.0,
      trend:         Trend::Down,
      recent:        false,
    });
    // 50 - 15 (no comps) - 10 (down) - 20 (rare) = 5
    let q = engine.price(&low).quote;
    assert_eq!(q.confidence, 5);
    assert_eq!(q.band, RangeBand::Wide);
    assert_eq!(q.high, cents(q.suggested_price * 1.35));
  }

  #[test]
  fn neutral_inputs_score_the_baseline_minus_missing_comps() {
    let engine = PricingEngine::new(NOW);
    let q = engine
      .price(&input("Glass", Condition::Good, Rarity::Uncommon, "1990"))
      .quote;
    assert_eq!(q.confidence, 35);
    assert_eq!(q.band, RangeBand::Wide);
  }

  #[test]
  fn blend_uses_nominal_weights_when_all_present() {
    let (price, sources) = blend(&[
      (PriceSource::Model, Some(100.0)),
      (PriceSource::Historical, Some(200.0)),
      (PriceSource::Market, Some(300.0)),
    ]);
    assert!((price - 170.0).abs() < 1e-9);
    let weights: Vec<f64> = sources.iter().map(|s| s.weight).collect();
    assert_eq!(weights, vec![0.5, 0.3, 0.2]);
  }

  #[test]
  fn blend_redistributes_missing_weight_proportionally() {
    let (price, sources) = blend(&[
      (PriceSource::Model, Some(100.0)),
      (PriceSource::Historical, None),
      (PriceSource::Market, Some(300.0)),
    ]);
    // 0.5 / 0.7 and 0.2 / 0.7
    assert_eq!(sources.len(), 2);
    assert!((sources[0].weight - 5.0 / 7.0).abs() < 1e-12);
    assert!((sources[1].weight - 2.0 / 7.0).abs() < 1e-12);
    assert!((price - (100.0 * 5.0 + 300.0 * 2.0) / 7.0).abs() < 1e-9);

    let (price, sources) = blend(&[
      (PriceSource::Model, Some(f64::NAN)),
      (PriceSource::Historical, Some(80.0)),
      (PriceSource::Market, None),
    ]);
    assert_eq!(price, 80.0);
    assert_eq!(sources[0].weight, 1.0);

    assert_eq!(blend(&[(PriceSource::Model, None)]).0, 0.0);
  }

  #[test]
  fn unusable_base_price_prices_at_zero() {
    let engine = PricingEngine::new(NOW);
    for base in [0.0, -5.0, f64::NAN, f64::INFINITY] {
      let mut inp = input("Glass", Condition::Good, Rarity::Rare, "1960");
      inp.base_price = base;
      let q = engine.price(&inp).quote;
      assert_eq!(q.suggested_price, 0.0);
      assert_eq!((q.low, q.high), (0.0, 0.0));
    }
  }
}
