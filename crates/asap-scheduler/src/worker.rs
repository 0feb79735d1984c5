use async_trait::async_trait;

use asap_model::Contact;

/// What one pass of a contact's worker accomplished, for the run-level
/// error summary. The scheduler never inspects *why* a stage failed —
/// that detail lives in the index/transmit crates' own logs — only
/// whether the contact's run-level error flag should be raised.
#[derive(Debug, Default, Clone)]
pub struct WorkerOutcome {
    pub exported: usize,
    pub indexed: usize,
    pub transmitted: usize,
    pub held: usize,
    pub errors: usize,
}

impl WorkerOutcome {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// One pass for one contact: retrieve exported cases -> index them ->
/// mark images-available; retrieve indexed cases -> stage+transmit -> on
/// success push status and images-released. If no new cases but
/// staged-but-unsent cases exist, still runs stage+transmit to drain
/// them. The concrete wiring (which index builder, which transmit
/// orchestrator) is composed by the binary; the scheduler only knows it
/// can ask a contact to run once.
#[async_trait]
pub trait ContactWorker: Send + Sync {
    async fn run_once(&self, contact: &Contact) -> WorkerOutcome;
}
