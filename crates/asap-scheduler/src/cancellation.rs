use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An inter-run stop flag a worker observes between stages. It never
/// aborts mid-stage: staging and transmission are transactional
/// boundaries, so cancellation only takes effect at the point a worker
/// would otherwise have started a new case.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
