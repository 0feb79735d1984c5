use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only projection of an ACORD 121 order request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub tracking_id: String,
    pub sid: String,
    pub source_code: String,
    pub naic: Option<String>,
    pub policy_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub ssn: Option<String>,
    pub date_received: DateTime<Utc>,
    pub date_cancelled: Option<DateTime<Utc>>,
}

impl Order {
    pub fn is_cancelled(&self) -> bool {
        self.date_cancelled.is_some()
    }
}
