//! Field-source resolution ports. Kept separate from the orchestration
//! algorithm in `builder.rs` so each source can be faked independently in
//! tests (a carrier with no ACORD 103 configured never touches the 103
//! provider at all).

use async_trait::async_trait;

use asap_ports::xml::XmlNode;

/// LIMS field lookup, keyed by `(table, column, sid)`. The real
/// implementation probes the `snip` cursor first, then `sip`, since most
/// samples have migrated to `snip`.
#[async_trait]
pub trait LimsFieldSource: Send + Sync {
    async fn resolve(&self, table: &str, column: &str, sid: &str) -> Option<String>;
}

/// Fetches the latest ACORD 121 order XML blob for `(sourceCode,
/// trackingId)` and parses it.
#[async_trait]
pub trait Acord121Source: Send + Sync {
    async fn latest_order_xml(&self, source_code: &str, tracking_id: &str) -> Option<XmlNode>;
}

/// Loads the ACORD 103 XML for a trackingId from the contact's configured
/// `acord103Dir`.
#[async_trait]
pub trait Acord103Source: Send + Sync {
    async fn load(&self, tracking_id: &str) -> Option<XmlNode>;
}
