use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use asap_model::Contact;

/// Global settings: report id, the three subfolder names every contact's
/// `docDir` uses, the Delta-QC sid field name, and the billing codes that
/// mean "do not bill, do not send".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub report_id: String,
    #[serde(default = "default_build_subdir")]
    pub build_subdir: String,
    #[serde(default = "default_error_subdir")]
    pub error_subdir: String,
    #[serde(default = "default_processed_subdir")]
    pub processed_subdir: String,
    pub delta_qc_sid_field: String,
    #[serde(default)]
    pub no_bill_codes: Vec<String>,
    #[serde(default)]
    pub no_bill_no_send_codes: Vec<String>,
    /// Bounded worker count for the scheduler's per-contact pool.
    #[serde(default = "default_concurrency_cap")]
    pub concurrency_cap: usize,
    /// History-insert retry attempts (spec: 5 attempts, 100ms sleep).
    #[serde(default = "default_history_retry_attempts")]
    pub history_retry_attempts: u32,
    #[serde(default = "default_history_retry_sleep_ms")]
    pub history_retry_sleep_ms: u64,
}

fn default_build_subdir() -> String {
    "build".to_string()
}
fn default_error_subdir() -> String {
    "error".to_string()
}
fn default_processed_subdir() -> String {
    "processed".to_string()
}
fn default_concurrency_cap() -> usize {
    1
}
fn default_history_retry_attempts() -> u32 {
    5
}
fn default_history_retry_sleep_ms() -> u64 {
    100
}

/// A logical DB connection descriptor (`xmit`, `sip`, `snip`, `delta_qc`,
/// `acord`, `case_qc`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbDescriptor {
    pub logical_name: String,
    pub dsn: String,
}

/// The on-disk TOML shape the store loads. Mirrors the asap_settings /
/// asap_db_settings / asap_contact_* tables named in the external
/// interfaces: one file, not a live database, is the source of truth here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawConfig {
    pub settings: GlobalSettings,
    #[serde(default)]
    pub databases: Vec<DbDescriptor>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    File,
    Default,
}

pub type Attribution = BTreeMap<String, ConfigSource>;
