//! HTTP-backed [`AnalysisService`].
//!
//! Each service is a single endpoint accepting
//! `POST {"image_url", "category", "notes"}` and answering with the model's
//! reply as the response body. The body is returned untouched; the merger
//! extracts and validates the JSON inside it.

use std::time::Duration;

use curio_core::analysis::{AnalysisRequest, AnalysisService};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::AnalysisConfig;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
  #[error("request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("{url} returned {status}: {body}")]
  Status { url: String, status: u16, body: String },
}

#[derive(Serialize)]
struct AnalysisBody<'a> {
  image_url: &'a str,
  category:  &'a str,
  notes:     Option<&'a str>,
}

#[derive(Clone)]
pub struct HttpAnalysisClient {
  client:            Client,
  description_url:   String,
  image_quality_url: String,
  api_key:           Option<String>,
}

impl HttpAnalysisClient {
  pub fn new(config: &AnalysisConfig) -> Result<Self, ClientError> {
    let client = Client::builder()
      .connect_timeout(Duration::from_secs(10))
      .build()?;
    Ok(Self {
      client,
      description_url: config.description_url.clone(),
      image_quality_url: config.image_quality_url.clone(),
      api_key: config.api_key.clone().filter(|k| !k.is_empty()),
    })
  }

  async fn post(
    &self,
    url: &str,
    request: &AnalysisRequest,
  ) -> Result<String, ClientError> {
    let body = AnalysisBody {
      image_url: &request.image_ref,
      category:  &request.category,
      notes:     request.notes.as_deref(),
    };

    let mut req = self.client.post(url).json(&body);
    if let Some(key) = &self.api_key {
      req = req.bearer_auth(key);
    }

    let resp = req.send().await?;
    let status = resp.status();
    let text = resp.text().await?;
    debug!(url, status = status.as_u16(), bytes = text.len(), "analysis reply");

    if !status.is_success() {
      return Err(ClientError::Status {
        url: url.to_owned(),
        status: status.as_u16(),
        body: truncate(&text, 200),
      });
    }
    Ok(text)
  }
}

impl AnalysisService for HttpAnalysisClient {
  type Error = ClientError;

  async fn describe_item(
    &self,
    request: &AnalysisRequest,
  ) -> Result<String, ClientError> {
    self.post(&self.description_url, request).await
  }

  async fn assess_image(
    &self,
    request: &AnalysisRequest,
  ) -> Result<String, ClientError> {
    self.post(&self.image_quality_url, request).await
  }
}

fn truncate(s: &str, max: usize) -> String {
  match s.char_indices().nth(max) {
    Some((i, _)) => format!("{}…", &s[..i]),
    None => s.to_owned(),
  }
}
