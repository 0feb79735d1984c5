use serde::{Deserialize, Serialize};

/// A filesystem file plus a row controlling its liveness across runs.
/// Rows survive across runs; a file marked for deletion must not be
/// re-discovered by globbing until the underlying unlink succeeds and the
/// row transitions back to `Null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackedFileState {
    Null,
    MarkedForDeletion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedFile {
    pub contact_id: String,
    pub relative_path: String,
    pub file_name: String,
    pub state: TrackedFileState,
    /// Base64-equivalent content snapshot, present only when `addFile` was
    /// called with `upload_content = true`.
    pub blob: Option<Vec<u8>>,
}

impl TrackedFile {
    pub fn is_purge_eligible(&self) -> bool {
        self.state == TrackedFileState::Null
    }
}
