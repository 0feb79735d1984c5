use asap_model::{TrackedFile, TrackedFileState};
use asap_utils::{atomic_write, error::AsapResult};
use camino::Utf8Path;
use std::collections::BTreeMap;

type Key = (String, String, String); // (contact_id, relative_path, file_name)

/// The persistent `(contactId, relativePath, fileName, stateId, blob?)`
/// table. Rows survive across runs; this struct is the in-memory
/// representation, loaded from and flushed to a JSON snapshot on disk so
/// a killed process doesn't lose tracked-file state.
#[derive(Debug, Default, Clone)]
pub struct FileStateTable {
    rows: BTreeMap<Key, TrackedFile>,
}

impl FileStateTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_for(file: &TrackedFile) -> Key {
        (file.contact_id.clone(), file.relative_path.clone(), file.file_name.clone())
    }

    pub fn load(path: &Utf8Path) -> AsapResult<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let text = atomic_write::read_file_tolerant(path)?;
        let rows: Vec<TrackedFile> = serde_json::from_str(&text).unwrap_or_default();
        Ok(Self { rows: rows.into_iter().map(|f| (Self::key_for(&f), f)).collect() })
    }

    pub fn save(&self, path: &Utf8Path) -> AsapResult<()> {
        let rows: Vec<&TrackedFile> = self.rows.values().collect();
        let json = serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string());
        atomic_write::write_file_atomic(path, &json)
    }

    pub fn upsert(&mut self, file: TrackedFile) {
        self.rows.insert(Self::key_for(&file), file);
    }

    pub fn get(&self, contact_id: &str, relative_path: &str, file_name: &str) -> Option<&TrackedFile> {
        self.rows.get(&(contact_id.to_string(), relative_path.to_string(), file_name.to_string()))
    }

    pub fn set_state(&mut self, contact_id: &str, relative_path: &str, file_name: &str, state: TrackedFileState) -> bool {
        if let Some(row) = self.rows.get_mut(&(contact_id.to_string(), relative_path.to_string(), file_name.to_string())) {
            row.state = state;
            true
        } else {
            false
        }
    }

    pub fn rows_marked_for_deletion<'a>(&'a self, contact_id: &'a str, relative_path: &'a str) -> impl Iterator<Item = &'a TrackedFile> {
        self.rows.values().filter(move |f| f.contact_id == contact_id && f.relative_path == relative_path && f.state == TrackedFileState::MarkedForDeletion)
    }

    pub fn null_rows(&self) -> impl Iterator<Item = &TrackedFile> {
        self.rows.values().filter(|f| f.state == TrackedFileState::Null)
    }

    pub fn remove(&mut self, contact_id: &str, relative_path: &str, file_name: &str) {
        self.rows.remove(&(contact_id.to_string(), relative_path.to_string(), file_name.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn file(contact: &str, rel: &str, name: &str, state: TrackedFileState) -> TrackedFile {
        TrackedFile { contact_id: contact.into(), relative_path: rel.into(), file_name: name.into(), state, blob: None }
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("table.json")).unwrap();
        let mut table = FileStateTable::new();
        table.upsert(file("C1", "doc", "a.tif", TrackedFileState::Null));
        table.save(&path).unwrap();

        let loaded = FileStateTable::load(&path).unwrap();
        assert!(loaded.get("C1", "doc", "a.tif").is_some());
    }
}
