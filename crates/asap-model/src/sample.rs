use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Holds that make a sample non-releasable, per the LIMS `hold_flag` column.
pub const HOLD_FLAG_TILDE: char = '~';
pub const HOLD_FLAG_HASH: char = '#';

/// Read-only projection of a LIMS sample row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub sid: String,
    pub client_id: String,
    pub region_id: String,
    pub examiner: Option<String>,
    pub transmit_date: Option<DateTime<Utc>>,
    pub hold_flag: Option<char>,
}

impl Sample {
    pub fn is_releasable(&self) -> bool {
        !matches!(self.hold_flag, Some(HOLD_FLAG_TILDE) | Some(HOLD_FLAG_HASH))
    }
}
