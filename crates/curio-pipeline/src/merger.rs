//! Joint invocation of the two analysis services.

use std::{future::Future, time::Duration};

use curio_core::{
  analysis::{AnalysisRequest, AnalysisService},
  candidate::{Candidate, ImageAssessment, ItemAnalysis, NewCandidate},
  pricing::{PricingEngine, PricingInput},
  schema,
  store::CatalogStore,
};
use tracing::{debug, info};

use crate::{Error, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Both validated payloads for one request.
#[derive(Debug, Clone)]
pub struct MergedAnalysis {
  pub analysis: ItemAnalysis,
  pub image:    ImageAssessment,
}

/// Runs both analyses concurrently and validates their replies.
///
/// A failure or timeout of either call fails the whole merge. Nothing is
/// persisted until both replies have been validated.
pub struct AnalysisMerger<A> {
  service: A,
  timeout: Duration,
}

impl<A: AnalysisService> AnalysisMerger<A> {
  pub fn new(service: A) -> Self { Self { service, timeout: DEFAULT_TIMEOUT } }

  /// Per-call timeout; each service gets the full budget.
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub async fn merge(
    &self,
    request: &AnalysisRequest,
  ) -> Result<MergedAnalysis> {
    let (item_text, image_text) = tokio::try_join!(
      timed(
        "describe_item",
        self.timeout,
        self.service.describe_item(request)
      ),
      timed("assess_image", self.timeout, self.service.assess_image(request)),
    )?;

    debug!(image_ref = %request.image_ref, "both analyses returned");

    let analysis =
      schema::validate_item_analysis(&schema::extract_json(&item_text)?)?;
    let image =
      schema::validate_image_assessment(&schema::extract_json(&image_text)?)?;

    Ok(MergedAnalysis { analysis, image })
  }

  /// Merge, quote, and persist a `Pending` candidate.
  pub async fn ingest<S: CatalogStore>(
    &self,
    store: &S,
    engine: &PricingEngine,
    request: AnalysisRequest,
  ) -> Result<Candidate> {
    let merged = self.merge(&request).await?;

    let quote = engine
      .price(&PricingInput::from_analysis(&request.category, &merged.analysis))
      .quote;

    let candidate = store
      .create_candidate(NewCandidate {
        image_ref: request.image_ref,
        category: request.category,
        notes: request.notes,
        analysis: merged.analysis,
        image: merged.image,
        quote,
      })
      .await
      .map_err(Error::store)?;

    info!(
      candidate_id = %candidate.candidate_id,
      title = %candidate.analysis.title,
      suggested_price = candidate.quote.suggested_price,
      "candidate ingested"
    );
    Ok(candidate)
  }
}

async fn timed<T, E>(
  service: &'static str,
  after: Duration,
  call: impl Future<Output = Result<T, E>>,
) -> Result<T>
where
  E: std::error::Error + Send + Sync + 'static,
{
  match tokio::time::timeout(after, call).await {
    Ok(Ok(v)) => Ok(v),
    Ok(Err(e)) => Err(Error::Analysis { service, source: Box::new(e) }),
    Err(_) => Err(curio_core::Error::AnalysisTimeout { service, after }.into()),
  }
}
