use asap_model::{TrackedFile, TrackedFileState};
use asap_utils::error::AsapError;
use camino::{Utf8Path, Utf8PathBuf};
use globset::Glob;
use thiserror::Error;
use tracing::warn;

use crate::table::FileStateTable;

#[derive(Debug, Error)]
pub enum FileManagerError {
    #[error(transparent)]
    Io(#[from] AsapError),
    #[error("invalid glob pattern {0}")]
    BadGlob(String),
}

pub type FileManagerResult<T> = Result<T, FileManagerError>;

/// Layers the `(contactId, relativePath, fileName, stateId)` state table
/// over the filesystem. Every operation updates the table *and* the
/// underlying file, in the order that keeps a crash mid-operation safe to
/// retry: delete updates disk first, mark succeeds only after; add writes
/// the row before the file is assumed present by callers.
pub struct TrackedFileManager {
    table: FileStateTable,
    table_path: Utf8PathBuf,
}

impl TrackedFileManager {
    pub fn load(table_path: Utf8PathBuf) -> FileManagerResult<Self> {
        let table = FileStateTable::load(&table_path).map_err(FileManagerError::Io)?;
        Ok(Self { table, table_path })
    }

    fn persist(&self) -> FileManagerResult<()> {
        self.table.save(&self.table_path).map_err(FileManagerError::Io)
    }

    /// Lists files on disk under `dir` matching `pattern`, excluding any
    /// whose tracked-file row is `MARKED_FOR_DELETION`.
    pub fn glob(&self, contact_id: &str, dir: &Utf8Path, pattern: &str) -> FileManagerResult<Vec<Utf8PathBuf>> {
        let matcher = Glob::new(pattern).map_err(|_| FileManagerError::BadGlob(pattern.to_string()))?.compile_matcher();
        let relative_path = dir.to_string();
        let entries = std::fs::read_dir(dir).map_err(|source| {
            FileManagerError::Io(AsapError::TransientIo { path: dir.to_path_buf(), source })
        })?;
        let mut out = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !matcher.is_match(name.as_ref()) {
                continue;
            }
            if let Some(row) = self.table.get(contact_id, &relative_path, &name) {
                if row.state == TrackedFileState::MarkedForDeletion {
                    continue;
                }
            }
            out.push(dir.join(name.as_ref()));
        }
        Ok(out)
    }

    /// Registers a new file. If `upload_content` is set, a content
    /// snapshot is retained for offline recovery.
    pub fn add_file(&mut self, contact_id: &str, relative_path: &str, file_name: &str, upload_content: bool) -> FileManagerResult<()> {
        let blob = if upload_content {
            let full = Utf8Path::new(relative_path).join(file_name);
            std::fs::read(&full).ok()
        } else {
            None
        };
        self.table.upsert(TrackedFile {
            contact_id: contact_id.to_string(),
            relative_path: relative_path.to_string(),
            file_name: file_name.to_string(),
            state: TrackedFileState::Null,
            blob,
        });
        self.persist()
    }

    /// Attempts the physical delete. On success, transitions the row to
    /// `Null`; on failure the row is left untouched (still
    /// `MarkedForDeletion`) so the next run retries.
    pub fn delete_file(&mut self, contact_id: &str, dir: &Utf8Path, file_name: &str) -> FileManagerResult<bool> {
        let relative_path = dir.to_string();
        self.table.set_state(contact_id, &relative_path, file_name, TrackedFileState::MarkedForDeletion);
        self.persist()?;

        let full = dir.join(file_name);
        match std::fs::remove_file(&full) {
            Ok(()) => {
                self.table.set_state(contact_id, &relative_path, file_name, TrackedFileState::Null);
                self.persist()?;
                Ok(true)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                self.table.set_state(contact_id, &relative_path, file_name, TrackedFileState::Null);
                self.persist()?;
                Ok(true)
            }
            Err(err) => {
                warn!(file = %full, error = %err, "delete failed, row stays marked for retry");
                Ok(false)
            }
        }
    }

    /// Copy + tracked delete.
    pub fn move_file(&mut self, contact_id: &str, src_dir: &Utf8Path, dst_dir: &Utf8Path, file_name: &str) -> FileManagerResult<()> {
        let src = src_dir.join(file_name);
        let dst = dst_dir.join(file_name);
        std::fs::create_dir_all(dst_dir).map_err(|source| FileManagerError::Io(AsapError::TransientIo { path: dst_dir.to_path_buf(), source }))?;
        std::fs::copy(&src, &dst).map_err(|source| FileManagerError::Io(AsapError::TransientIo { path: src.clone(), source }))?;
        self.add_file(contact_id, dst_dir.as_str(), file_name, false)?;
        self.delete_file(contact_id, src_dir, file_name)?;
        Ok(())
    }

    /// Deletes rows whose state is `Null`, i.e. already physically gone.
    pub fn purge_null_files(&mut self) -> FileManagerResult<usize> {
        let purge: Vec<(String, String, String)> = self.table.null_rows().map(|f| (f.contact_id.clone(), f.relative_path.clone(), f.file_name.clone())).collect();
        let count = purge.len();
        for (contact_id, relative_path, file_name) in purge {
            self.table.remove(&contact_id, &relative_path, &file_name);
        }
        self.persist()?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8(p: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(p.to_path_buf()).unwrap()
    }

    #[test]
    fn marked_for_deletion_is_excluded_from_glob() {
        let dir = TempDir::new().unwrap();
        let doc_dir = utf8(dir.path());
        std::fs::write(doc_dir.join("a.tif"), b"x").unwrap();
        std::fs::write(doc_dir.join("b.tif"), b"x").unwrap();

        let table_path = doc_dir.join("table.json");
        let mut mgr = TrackedFileManager::load(table_path).unwrap();
        mgr.add_file("C1", doc_dir.as_str(), "a.tif", false).unwrap();
        mgr.add_file("C1", doc_dir.as_str(), "b.tif", false).unwrap();

        // Force the row to MARKED_FOR_DELETION without a physical delete,
        // to assert the glob-exclusion invariant independent of
        // delete_file's filesystem outcome.
        mgr.table.set_state("C1", doc_dir.as_str(), "a.tif", asap_model::TrackedFileState::MarkedForDeletion);

        let found = mgr.glob("C1", &doc_dir, "*.tif").unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].as_str().ends_with("b.tif"));
    }

    #[test]
    fn purge_null_removes_rows() {
        let dir = TempDir::new().unwrap();
        let doc_dir = utf8(dir.path());
        let table_path = doc_dir.join("table.json");
        let mut mgr = TrackedFileManager::load(table_path).unwrap();
        mgr.add_file("C1", doc_dir.as_str(), "a.tif", false).unwrap();
        let purged = mgr.purge_null_files().unwrap();
        assert_eq!(purged, 1);
    }
}
