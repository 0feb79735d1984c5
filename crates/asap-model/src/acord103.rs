use serde::{Deserialize, Serialize};

/// A stored ACORD 103 XML blob, keyed by `trackingId`. At most one is live
/// per trackingId; superseded ones are retained (not deleted) for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acord103 {
    pub tracking_id: String,
    pub tracking_id_103: String,
    pub trans_ref_guid: String,
    pub policy_number: Option<String>,
    pub blob: Vec<u8>,
    pub superseded: bool,
    /// Set by `setToRetrieve`: instructs the store to restore the file from
    /// its processed snapshot so the next first-transmit stage finds it.
    pub retrieve_requested: bool,
}
