//! Config store (C1): loads carrier definitions, index schemas, path
//! layouts, and DB connection descriptors once at startup and serves them
//! read-only for the rest of the run.

pub mod model;
pub mod store;

pub use model::{DbDescriptor, GlobalSettings, RawConfig};
pub use store::{ConfigError, ConfigStore};
