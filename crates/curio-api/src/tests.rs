//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use curio_core::{
  analysis::{AnalysisRequest, AnalysisService},
  category::NewCategory,
  store::CatalogStore,
};
use curio_pipeline::{AnalysisMerger, ApprovalPolicy, ApprovalWorkflow};
use curio_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{AppState, api_router};

// ─── Fake analysis ───────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("upstream returned 503")]
struct Upstream;

/// Category hints steer the fake: `"offline"` fails the image call and
/// `"blurry"` returns an out-of-range quality score.
struct FakeAnalysis;

impl AnalysisService for FakeAnalysis {
  type Error = Upstream;

  async fn describe_item(
    &self,
    request: &AnalysisRequest,
  ) -> Result<String, Upstream> {
    Ok(
      json!({
        "title": format!("{} piece", request.category),
        "description": "A carefully made decorative object.",
        "shortDescription": "Decorative object.",
        "estimatedEra": "1930s",
        "condition": "Good",
        "rarity": "Uncommon",
        "authenticity": "Attributed",
        "suggestedPrice": 80.0,
        "priceReasoning": "Similar pieces.",
        "investmentPotential": "Modest.",
        "historicalContext": "Interwar design.",
        "keywords": ["a", "b", "c", "d", "e"],
        "seoTitle": "Interwar Decorative Object in Good Original Condition",
        "seoDescription": "An attributed interwar decorative object in good original condition, carefully made and suitable for display in any period interior or private collection.",
      })
      .to_string(),
    )
  }

  async fn assess_image(
    &self,
    request: &AnalysisRequest,
  ) -> Result<String, Upstream> {
    let quality = match request.category.as_str() {
      "offline" => return Err(Upstream),
      "blurry" => 11,
      _ => 6,
    };
    Ok(
      json!({
        "imageQuality": quality,
        "hasDefects": true,
        "defectDescription": "Minor chip on base.",
        "photographyNotes": "Slightly underexposed.",
        "suggestedImprovements": ["Use a lightbox"],
      })
      .to_string(),
    )
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  for name in ["Fine Art", "Militaria"] {
    store
      .create_category(NewCategory {
        name:   name.into(),
        slug:   None,
        prefix: None,
      })
      .await
      .unwrap();
  }
  let state = AppState {
    workflow: Arc::new(ApprovalWorkflow::new(
      Arc::new(store),
      ApprovalPolicy::default(),
    )),
    merger:   Arc::new(AnalysisMerger::new(FakeAnalysis)),
    reviewer: Arc::from("admin"),
  };
  api_router(state)
}

async fn call(
  app: &Router,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(b) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(b.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn ingest(app: &Router, category: &str) -> Value {
  let (status, body) = call(
    app,
    "POST",
    "/candidates",
    Some(json!({
      "image_ref": "uploads/item.jpg",
      "category": category,
      "notes": "estate sale lot 14",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ingest_approve_and_read_back() {
  let app = app().await;
  let candidate = ingest(&app, "Fine Art").await;
  assert_eq!(candidate["status"], "pending");
  let id = candidate["candidate_id"].as_str().unwrap().to_owned();

  let (status, pending) =
    call(&app, "GET", "/candidates?status=pending", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(pending.as_array().unwrap().len(), 1);

  let (status, entry) = call(
    &app,
    "POST",
    &format!("/candidates/{id}/approve"),
    Some(json!({ "price": 150.0, "reviewer": "alice" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{entry}");
  let identifier = entry["identifier"].as_str().unwrap().to_owned();
  assert!(identifier.starts_with("ARTS-"));
  assert!(identifier.ends_with("-001"));

  let (status, fetched) =
    call(&app, "GET", &format!("/entries/{identifier}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched["price"], 150.0);

  let (_, candidate) =
    call(&app, "GET", &format!("/candidates/{id}"), None).await;
  assert_eq!(candidate["status"], "approved");
  assert_eq!(candidate["review"]["reviewer"], "alice");
  assert_eq!(candidate["catalog_entry_id"], entry["entry_id"]);

  let (status, entries) = call(&app, "GET", "/entries", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(entries.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn analysis_failures_map_to_gateway_and_schema_errors() {
  let app = app().await;

  let (status, body) = call(
    &app,
    "POST",
    "/candidates",
    Some(json!({ "image_ref": "x.jpg", "category": "offline" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert_eq!(body["kind"], "analysis");

  let (status, body) = call(
    &app,
    "POST",
    "/candidates",
    Some(json!({ "image_ref": "x.jpg", "category": "blurry" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["kind"], "schema_violation");
  assert!(body["error"].as_str().unwrap().contains("imageQuality"));

  let (_, all) = call(&app, "GET", "/candidates", None).await;
  assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn approval_errors_map_to_statuses() {
  let app = app().await;

  let (status, body) = call(
    &app,
    "POST",
    &format!("/candidates/{}/approve", Uuid::new_v4()),
    Some(json!({ "price": 10.0 })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["kind"], "not_found");

  let unmatched = ingest(&app, "Beanie Babies").await;
  let id = unmatched["candidate_id"].as_str().unwrap();
  let (status, body) = call(
    &app,
    "POST",
    &format!("/candidates/{id}/approve"),
    Some(json!({ "price": 10.0 })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["kind"], "resolution_failure");

  let (status, rejected) = call(
    &app,
    "POST",
    &format!("/candidates/{id}/reject"),
    Some(json!({ "notes": "not our line" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(rejected["status"], "rejected");
  assert_eq!(rejected["review"]["reviewer"], "admin");

  let (status, body) = call(
    &app,
    "POST",
    &format!("/candidates/{id}/approve"),
    Some(json!({ "price": 10.0 })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["kind"], "precondition");

  let (status, annotated) = call(
    &app,
    "POST",
    &format!("/candidates/{id}/annotation"),
    Some(json!({ "annotation": "returned" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(annotated["annotation"], "returned");
  assert_eq!(annotated["notes"], "estate sale lot 14");
  assert_eq!(annotated["review"]["notes"], "not our line");
}

#[tokio::test]
async fn bulk_approval_reports_per_item_failures() {
  let app = app().await;
  let a = ingest(&app, "Fine Art").await;
  let b = ingest(&app, "Beanie Babies").await;
  let c = ingest(&app, "Militaria").await;

  let (status, outcome) = call(
    &app,
    "POST",
    "/candidates/bulk-approve",
    Some(json!({
      "candidate_ids": [
        a["candidate_id"],
        b["candidate_id"],
        c["candidate_id"],
      ],
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{outcome}");
  assert_eq!(outcome["approved"], 2);
  assert_eq!(outcome["failed"], 1);
  let errors = outcome["errors"].as_array().unwrap();
  assert_eq!(errors.len(), 1);
  assert_eq!(errors[0]["candidate_id"], b["candidate_id"]);
  assert_eq!(errors[0]["kind"], "resolution_failure");

  let (status, body) = call(
    &app,
    "POST",
    "/candidates/bulk-approve",
    Some(json!({ "candidate_ids": [] })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["kind"], "invalid_input");
}

#[tokio::test]
async fn quote_and_entry_lookups() {
  let app = app().await;
  let c = ingest(&app, "Fine Art").await;
  let id = c["candidate_id"].as_str().unwrap();

  let (status, quote) = call(
    &app,
    "POST",
    &format!("/candidates/{id}/quote"),
    Some(json!({ "comparable_sales": [100.0, 120.0], "authenticated": true })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{quote}");
  let confidence = quote["quote"]["confidence"].as_u64().unwrap();
  assert!(confidence <= 100);
  assert_eq!(quote["sources"].as_array().unwrap().len(), 2);

  let (status, _) = call(&app, "GET", "/entries/not-an-id", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let (status, _) = call(&app, "GET", "/entries/ARTS-2024-999", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
