use async_trait::async_trait;

use asap_model::{Acord103, CaseQc, Order, Sample};

/// Repositories the resolver cross-joins. Each is a narrow read port so
/// tests can inject fakes without standing up the full DB stack.
#[async_trait]
pub trait SampleRepo: Send + Sync {
    async fn by_sid(&self, sid: &str) -> Option<Sample>;
}

#[async_trait]
pub trait OrderRepo: Send + Sync {
    /// All ASAP orders for a sid; the first is primary, the rest surface
    /// as sibling viable cases under `MultipleOrdersOneSample`.
    async fn by_sid(&self, sid: &str) -> Vec<Order>;
    async fn by_tracking_id(&self, tracking_id: &str) -> Option<Order>;
    async fn by_ref_id(&self, ref_id: &str) -> Vec<Order>;
}

#[async_trait]
pub trait CaseQcRepo: Send + Sync {
    /// All case-QC rows for a tracking id; more than one surfaces as siblings.
    async fn by_tracking_id(&self, tracking_id: &str) -> Vec<CaseQc>;
}

#[async_trait]
pub trait Acord103Repo: Send + Sync {
    async fn by_tracking_id(&self, tracking_id: &str) -> Option<Acord103>;
    async fn by_policy_number(&self, policy_number: &str) -> Option<Acord103>;
}

/// Delta-QC document group lookup, keyed by document id, resolving to the
/// owning sid.
#[async_trait]
pub trait DocGroupRepo: Send + Sync {
    async fn sid_for_document_id(&self, document_id: &str) -> Option<String>;
    async fn document_group_ids_for_sid(&self, sid: &str) -> Vec<String>;
}

/// Resolves a sid to the ASAP contact id that owns it, used for the
/// `NonAsapSample` / `CarrierMismatch` discrepancy checks.
#[async_trait]
pub trait AsapContactRepo: Send + Sync {
    async fn contact_id_for_sid(&self, sid: &str) -> Option<String>;
}
