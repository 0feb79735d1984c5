use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::index::Index;

/// Carrier-exception handling the orchestrator uses instead of a hardcoded
/// contact-id string compare when `stageIndexedCase` fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnStageExceptionPolicy {
    /// Move the case back into `retrans/` so the next run retries it.
    Restage,
    /// Leave the case where it landed and require manual intervention.
    Leave,
}

impl Default for OnStageExceptionPolicy {
    fn default() -> Self {
        OnStageExceptionPolicy::Restage
    }
}

/// A (client, region, examiner) triple the pipeline treats as one
/// downstream destination. Loaded once at startup and shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub contact_id: String,
    pub client_id: String,
    pub region_id: String,
    pub examiner: Option<String>,
    pub source_code: String,

    pub doc_dir: Utf8PathBuf,
    pub acord103_dir: Option<Utf8PathBuf>,
    pub index_dir: Utf8PathBuf,
    pub xmit_dir: Utf8PathBuf,

    pub index: Index,

    /// doc-type -> client-facing display name.
    pub doc_type_client_name: BTreeMap<String, String>,
    /// doc-type -> billing code; `NO_BILL_NO_SEND` documents are never attached to a case.
    pub doc_type_billing_code: BTreeMap<String, String>,

    /// Registry id of the `IndexHooks`/`TransmitHooks` implementation bound to this contact.
    pub carrier_hook_id: String,

    pub on_stage_exception_policy: OnStageExceptionPolicy,
}

pub const NO_BILL_NO_SEND: &str = "NO_BILL_NO_SEND";

impl Contact {
    /// `fBill`/`fSend` derived from a doc-type's billing code at add-time.
    pub fn billing_flags_for_doc_type(&self, doc_type_name: &str) -> (bool, bool) {
        match self.doc_type_billing_code.get(doc_type_name) {
            Some(code) if code == NO_BILL_NO_SEND => (false, false),
            Some(_) => (true, true),
            None => (false, false),
        }
    }

    pub fn processed_doc_dir(&self, processed_subdir: &str) -> Utf8PathBuf {
        self.doc_dir.join(processed_subdir)
    }

    pub fn error_doc_dir(&self, error_subdir: &str) -> Utf8PathBuf {
        self.doc_dir.join(error_subdir)
    }

    pub fn build_doc_dir(&self, build_subdir: &str) -> Utf8PathBuf {
        self.doc_dir.join(build_subdir)
    }
}
