//! Shared primitives used across every ASAP pipeline crate: atomic file
//! writes, an injectable clock, the pipeline-wide error taxonomy, and
//! logging setup.

pub mod atomic_write;
pub mod clock;
pub mod error;
pub mod logging;
pub mod paths;

pub use atomic_write::write_file_atomic;
pub use clock::{Clock, SystemClock};
pub use error::{AsapError, AsapResult};
