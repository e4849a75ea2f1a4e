//! The two external analysis services, as seen by the merger.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// What the operator submitted for analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
  /// URL or storage key of the uploaded image.
  pub image_ref: String,
  /// Free-text category hint.
  pub category:  String,
  pub notes:     Option<String>,
}

/// A model-backed analysis service.
///
/// Both calls return the model's raw text reply. Extracting and validating
/// the JSON inside it is the caller's job (see [`crate::schema`]).
pub trait AnalysisService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Descriptive and pricing analysis of the item.
  fn describe_item<'a>(
    &'a self,
    request: &'a AnalysisRequest,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Photographic quality assessment of the image.
  fn assess_image<'a>(
    &'a self,
    request: &'a AnalysisRequest,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}
