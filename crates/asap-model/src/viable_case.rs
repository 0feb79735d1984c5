use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::acord103::Acord103;
use crate::caseqc::CaseQc;
use crate::ids::CaseId;
use crate::order::Order;
use crate::sample::Sample;

/// Non-fatal discrepancies the resolver records rather than raising.
/// Hand-rolled rather than pulled in via a flags crate: the set is small,
/// fixed, and never needs the combinator sugar a crate would buy us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViableCaseErrors(u16);

impl ViableCaseErrors {
    pub const NONE: Self = Self(0);
    pub const MULTIPLE_ORDERS_ONE_SAMPLE: Self = Self(1 << 0);
    pub const CASE_EXISTS_FOR_ORDER: Self = Self(1 << 1);
    pub const NON_ASAP_SAMPLE: Self = Self(1 << 2);
    pub const CARRIER_MISMATCH: Self = Self(1 << 3);
    pub const NO_SAMPLE_EXISTS: Self = Self(1 << 4);
    pub const MISSING_CONSENT: Self = Self(1 << 5);
    pub const MULTIPLE_SELQ_ORDERS: Self = Self(1 << 6);

    pub fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 != 0
    }

    pub fn insert(&mut self, flag: Self) {
        self.0 |= flag.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for ViableCaseErrors {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ViableCaseErrors {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// The identifier track that resolved this `ViableCase`, used to key
/// sibling cases in `viable_case_map`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierTrack {
    Sid,
    TrackingId,
    PolicyNumber,
    RefId,
    DocumentId,
}

/// A candidate ASAP case graph assembled by the resolver from whichever of
/// the six backing projections it could find, plus any sibling cases
/// discovered while cross-joining the stores.
#[derive(Debug, Clone, Default)]
pub struct ViableCase {
    pub case_id: Option<CaseId>,
    pub sample: Option<Sample>,
    pub order: Option<Order>,
    pub case_qc: Option<CaseQc>,
    pub acord103: Option<Acord103>,
    pub contact_id: Option<String>,
    /// Delta-QC document group ids attached to this case, if resolved.
    pub doc_group_ids: Vec<String>,
    pub errors: ViableCaseErrors,
    pub viable_case_map: BTreeMap<IdentifierTrack, Vec<ViableCase>>,
}

impl ViableCase {
    pub fn add_sibling(&mut self, track: IdentifierTrack, sibling: ViableCase) {
        self.viable_case_map.entry(track).or_default().push(sibling);
    }

    pub fn sid(&self) -> Option<&str> {
        self.sample.as_ref().map(|s| s.sid.as_str()).or(self.case_qc.as_ref().map(|q| q.sid.as_str()))
    }
}
