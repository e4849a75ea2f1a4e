//! Async orchestration for the Curio listing pipeline.
//!
//! Everything here is generic over the collaborator traits in
//! [`curio_core`]: [`AnalysisService`](curio_core::analysis::AnalysisService)
//! for the two model-backed analyses and
//! [`CatalogStore`](curio_core::store::CatalogStore) for persistence.

pub mod allocator;
pub mod approval;
pub mod error;
pub mod merger;

pub use allocator::IdentifierAllocator;
pub use approval::{
  ApprovalPolicy, ApprovalWorkflow, BulkApproval, BulkFailure, BulkOutcome,
  BulkPricing, QuoteSignals,
};
pub use error::{Error, Result};
pub use merger::{AnalysisMerger, MergedAnalysis};
