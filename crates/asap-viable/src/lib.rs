//! Viable-case resolver (C7): given any one of {sid, trackingId,
//! policyNumber, refId, documentId}, cross-joins the backing stores and
//! returns a populated `ViableCase` plus any sibling cases discovered
//! along the way.

pub mod analyze;
pub mod repos;
pub mod resolver;

pub use analyze::{analyze_case, AnalyzeOptions, GateReason};
pub use repos::{Acord103Repo, AsapContactRepo, CaseQcRepo, DocGroupRepo, OrderRepo, SampleRepo};
pub use resolver::{ViableCaseResolver, SENTINEL_SID};
