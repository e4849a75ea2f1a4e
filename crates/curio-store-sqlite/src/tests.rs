//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::Utc;
use curio_core::{
  candidate::{
    Authenticity, CandidateStatus, Condition, ImageAssessment, ItemAnalysis,
    NewCandidate, Rarity, Review,
  },
  catalog::{ApprovalCommit, EntryDraft, EntryStatus},
  category::{Category, NewCategory},
  identifier::Identifier,
  pricing::{PriceQuote, RangeBand},
  store::{CatalogStore, EntryQuery},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn analysis(title: &str) -> ItemAnalysis {
  ItemAnalysis {
    title:                title.into(),
    description:          "A bronze table lamp with a stepped base.".into(),
    short_description:    "Bronze table lamp.".into(),
    condition:            Condition::VeryGood,
    rarity:               Rarity::Uncommon,
    authenticity:         Authenticity::BelievedAuthentic,
    estimated_era:        "1920s".into(),
    suggested_price:      240.0,
    model_confidence:     75.0,
    price_reasoning:      "Comparable lamps.".into(),
    investment_potential: "Stable.".into(),
    historical_context:   "Art Deco period.".into(),
    keywords:             vec!["lamp".into(), "bronze".into()],
    seo_title:            "Bronze lamp".into(),
    seo_description:      "Bronze lamp.".into(),
  }
}

fn new_candidate(title: &str, category: &str) -> NewCandidate {
  NewCandidate {
    image_ref: format!("uploads/{title}.jpg"),
    category:  category.into(),
    notes:     None,
    analysis:  analysis(title),
    image:     ImageAssessment {
      quality_score:          7,
      has_defects:            false,
      defect_description:     String::new(),
      photography_notes:      "Fine.".into(),
      suggested_improvements: vec![],
    },
    quote:     PriceQuote {
      suggested_price: 240.0,
      low:             156.0,
      high:            324.0,
      confidence:      50,
      band:            RangeBand::Wide,
    },
  }
}

fn review(by: &str) -> Review {
  Review { reviewer: by.into(), reviewed_at: Utc::now(), notes: None }
}

async fn category(s: &SqliteStore, name: &str) -> Category {
  s.create_category(NewCategory { name: name.into(), slug: None, prefix: None })
    .await
    .unwrap()
}

fn draft(candidate_id: Uuid, category: &Category, title: &str) -> EntryDraft {
  EntryDraft {
    candidate_id,
    title: title.into(),
    description: "desc".into(),
    price: 250.0,
    category_id: category.category_id,
    prefix: category.identifier_prefix(),
    condition: Condition::VeryGood,
    review: review("admin"),
  }
}

fn id(prefix: &str, seq: u32) -> Identifier {
  Identifier::new(prefix, 2025, seq).unwrap()
}

// ─── Candidates ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_candidate() {
  let s = store().await;
  let created = s
    .create_candidate(new_candidate("lamp", "Art Deco"))
    .await
    .unwrap();
  assert_eq!(created.status, CandidateStatus::Pending);

  let fetched = s.get_candidate(created.candidate_id).await.unwrap().unwrap();
  assert_eq!(fetched.analysis, created.analysis);
  assert_eq!(fetched.image, created.image);
  assert_eq!(fetched.quote, created.quote);
  assert!(fetched.review.is_none());
  assert!(fetched.catalog_entry_id.is_none());
}

#[tokio::test]
async fn get_candidate_missing_returns_none() {
  let s = store().await;
  assert!(s.get_candidate(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_candidates_filters_by_status() {
  let s = store().await;
  let a = s.create_candidate(new_candidate("a", "x")).await.unwrap();
  s.create_candidate(new_candidate("b", "x")).await.unwrap();
  assert!(s.reject_candidate(a.candidate_id, review("admin")).await.unwrap());

  assert_eq!(s.list_candidates(None).await.unwrap().len(), 2);
  let pending =
    s.list_candidates(Some(CandidateStatus::Pending)).await.unwrap();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].analysis.title, "b");
  let rejected =
    s.list_candidates(Some(CandidateStatus::Rejected)).await.unwrap();
  assert_eq!(rejected[0].candidate_id, a.candidate_id);
}

#[tokio::test]
async fn reject_only_applies_to_pending() {
  let s = store().await;
  let c = s.create_candidate(new_candidate("a", "x")).await.unwrap();

  let mut r = review("carol");
  r.notes = Some("reproduction".into());
  assert!(s.reject_candidate(c.candidate_id, r).await.unwrap());
  assert!(!s.reject_candidate(c.candidate_id, review("dave")).await.unwrap());

  let fetched = s.get_candidate(c.candidate_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, CandidateStatus::Rejected);
  let rev = fetched.review.unwrap();
  assert_eq!(rev.reviewer, "carol");
  assert_eq!(rev.notes.as_deref(), Some("reproduction"));
}

#[tokio::test]
async fn annotate_works_in_any_status() {
  let s = store().await;
  let mut input = new_candidate("a", "x");
  input.notes = Some("estate sale lot 14".into());
  let c = s.create_candidate(input).await.unwrap();
  s.reject_candidate(c.candidate_id, review("admin")).await.unwrap();

  assert!(
    s.annotate_candidate(c.candidate_id, Some("check hallmark".into()))
      .await
      .unwrap()
  );
  let fetched = s.get_candidate(c.candidate_id).await.unwrap().unwrap();
  assert_eq!(fetched.annotation.as_deref(), Some("check hallmark"));
  assert_eq!(fetched.notes.as_deref(), Some("estate sale lot 14"));
  assert_eq!(fetched.status, CandidateStatus::Rejected);

  assert!(!s.annotate_candidate(Uuid::new_v4(), None).await.unwrap());
}

// ─── Categories ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn categories_are_listed_by_name() {
  let s = store().await;
  category(&s, "Militaria").await;
  category(&s, "Fine Art").await;

  let all = s.list_categories().await.unwrap();
  let names: Vec<_> = all.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(names, ["Fine Art", "Militaria"]);
  assert_eq!(all[0].slug, "fine-art");
}

#[tokio::test]
async fn duplicate_category_name_is_rejected() {
  let s = store().await;
  category(&s, "Militaria").await;
  let dup = s
    .create_category(NewCategory {
      name:   "militaria".into(),
      slug:   Some("other".into()),
      prefix: None,
    })
    .await;
  assert!(dup.is_err());
}

// ─── Approval commits ────────────────────────────────────────────────────────

#[tokio::test]
async fn commit_approval_writes_entry_and_candidate_together() {
  let s = store().await;
  let cat = category(&s, "Fine Art").await;
  let c = s.create_candidate(new_candidate("lamp", "art")).await.unwrap();

  let d = draft(c.candidate_id, &cat, "Bronze Lamp");
  let entry = d.into_entry(id("ARTS", 1));
  let outcome = s
    .commit_approval(entry.clone(), d.review.clone())
    .await
    .unwrap();
  assert!(matches!(
    outcome,
    ApprovalCommit::Committed(ref e) if e.entry_id == entry.entry_id
  ));

  let fetched = s.get_candidate(c.candidate_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, CandidateStatus::Approved);
  assert_eq!(fetched.catalog_entry_id, Some(entry.entry_id));
  assert_eq!(fetched.review.unwrap().reviewer, "admin");

  let stored = s.get_entry(entry.entry_id).await.unwrap().unwrap();
  assert_eq!(stored.identifier.to_string(), "ARTS-2025-001");
  assert_eq!(stored.slug, "bronze-lamp-arts-2025-001");
  assert_eq!(stored.status, EntryStatus::Active);
  assert_eq!(stored.condition, Condition::VeryGood);

  let by_id = s.get_entry_by_identifier(&id("ARTS", 1)).await.unwrap().unwrap();
  assert_eq!(by_id.entry_id, entry.entry_id);
  assert_eq!(s.max_sequence(2025).await.unwrap(), 1);
  assert_eq!(s.max_sequence(2024).await.unwrap(), 0);
}

#[tokio::test]
async fn taken_sequence_leaves_candidate_pending() {
  let s = store().await;
  let arts = category(&s, "Fine Art").await;
  let mili = category(&s, "Militaria").await;
  let a = s.create_candidate(new_candidate("a", "art")).await.unwrap();
  let b = s.create_candidate(new_candidate("b", "milit")).await.unwrap();

  let da = draft(a.candidate_id, &arts, "A");
  s.commit_approval(da.into_entry(id("ARTS", 1)), da.review.clone())
    .await
    .unwrap();

  // Same year and sequence under a different prefix is still taken.
  let db = draft(b.candidate_id, &mili, "B");
  let outcome = s
    .commit_approval(db.into_entry(id("MILI", 1)), db.review.clone())
    .await
    .unwrap();
  assert!(matches!(outcome, ApprovalCommit::IdentifierTaken));

  let fetched = s.get_candidate(b.candidate_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, CandidateStatus::Pending);
  assert!(fetched.catalog_entry_id.is_none());
  assert_eq!(s.list_entries(&EntryQuery::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn other_constraint_failures_are_errors_not_races() {
  let s = store().await;
  let c = s.create_candidate(new_candidate("a", "art")).await.unwrap();
  let unknown = Category {
    category_id: Uuid::new_v4(),
    name:        "Unlisted".into(),
    slug:        "unlisted".into(),
    prefix:      Some("UNLI".into()),
  };

  let d = draft(c.candidate_id, &unknown, "A");
  let result = s
    .commit_approval(d.into_entry(id("UNLI", 1)), d.review.clone())
    .await;
  assert!(matches!(result, Err(crate::Error::Database(_))), "{result:?}");

  let fetched = s.get_candidate(c.candidate_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, CandidateStatus::Pending);
  assert_eq!(s.max_sequence(2025).await.unwrap(), 0);
}

#[tokio::test]
async fn commit_on_rejected_candidate_is_refused() {
  let s = store().await;
  let cat = category(&s, "Fine Art").await;
  let c = s.create_candidate(new_candidate("a", "art")).await.unwrap();
  s.reject_candidate(c.candidate_id, review("admin")).await.unwrap();

  let d = draft(c.candidate_id, &cat, "A");
  let outcome = s
    .commit_approval(d.into_entry(id("ARTS", 1)), d.review.clone())
    .await
    .unwrap();
  assert!(matches!(outcome, ApprovalCommit::CandidateNotPending));
  assert_eq!(s.max_sequence(2025).await.unwrap(), 0);
}

#[tokio::test]
async fn deleted_entry_keeps_its_sequence_claimed() {
  let s = store().await;
  let cat = category(&s, "Fine Art").await;
  let a = s.create_candidate(new_candidate("a", "art")).await.unwrap();
  let b = s.create_candidate(new_candidate("b", "art")).await.unwrap();

  let da = draft(a.candidate_id, &cat, "A");
  let entry = da.into_entry(id("ARTS", 1));
  s.commit_approval(entry.clone(), da.review.clone()).await.unwrap();
  assert!(s.delete_entry(entry.entry_id).await.unwrap());
  assert!(s.get_entry(entry.entry_id).await.unwrap().is_none());

  assert_eq!(s.max_sequence(2025).await.unwrap(), 1);
  let db = draft(b.candidate_id, &cat, "B");
  let outcome = s
    .commit_approval(db.into_entry(id("ARTS", 1)), db.review.clone())
    .await
    .unwrap();
  assert!(matches!(outcome, ApprovalCommit::IdentifierTaken));
}

#[tokio::test]
async fn list_entries_filters_and_pages() {
  let s = store().await;
  let arts = category(&s, "Fine Art").await;
  let mili = category(&s, "Militaria").await;

  for (seq, cat) in [(1, &arts), (2, &mili), (3, &arts)] {
    let c = s.create_candidate(new_candidate("x", "y")).await.unwrap();
    let d = draft(c.candidate_id, cat, &format!("Item {seq}"));
    let entry = d.into_entry(id(&cat.identifier_prefix(), seq));
    s.commit_approval(entry, d.review.clone()).await.unwrap();
  }

  let art_only = s
    .list_entries(&EntryQuery {
      category_id: Some(arts.category_id),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(art_only.len(), 2);

  let page = s
    .list_entries(&EntryQuery {
      limit: Some(1),
      offset: Some(1),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.len(), 1);

  let sold = s
    .list_entries(&EntryQuery {
      status: Some(EntryStatus::Sold),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(sold.is_empty());
}
