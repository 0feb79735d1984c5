use serde::{Deserialize, Serialize};

/// `New -> Pending <-> Pending -> Released`; only `Released` cases are
/// eligible to transmit. Transitions are monotone in normal flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CaseQcState {
    New,
    Pending,
    Released,
}

impl CaseQcState {
    /// Whether moving from `self` to `next` is a legal transition in
    /// normal flow (`New -> Pending`, `Pending <-> Pending`, `Pending ->
    /// Released`). Any other request is a logical-conflict error, not a
    /// state the store silently allows.
    pub fn can_transition_to(self, next: CaseQcState) -> bool {
        matches!(
            (self, next),
            (CaseQcState::New, CaseQcState::Pending)
                | (CaseQcState::Pending, CaseQcState::Pending)
                | (CaseQcState::Pending, CaseQcState::Released)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseQc {
    pub sid: String,
    pub tracking_id: String,
    pub state: CaseQcState,
}

impl CaseQc {
    pub fn is_released(&self) -> bool {
        self.state == CaseQcState::Released
    }
}
