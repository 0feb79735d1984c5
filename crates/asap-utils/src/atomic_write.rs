//! Atomic file writes: write to a temp file in the destination directory,
//! fsync it, then rename into place. Avoids readers ever observing a
//! partially-written index, history row, or staged artifact.

use camino::Utf8Path;
use std::fs::File;
use std::io::Write;

use crate::error::{AsapError, AsapResult};

fn normalize_line_endings(content: &str) -> String {
    if content.contains('\r') {
        content.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        content.to_string()
    }
}

/// Write `content` to `path` atomically, normalizing CRLF/CR to LF first.
///
/// Creates parent directories as needed. On Unix, falls back to a
/// copy-then-replace if the temp file and destination land on different
/// filesystems (EXDEV).
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> AsapResult<()> {
    let normalized = normalize_line_endings(content);

    let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    std::fs::create_dir_all(parent).map_err(|source| AsapError::TransientIo {
        path: parent.to_path_buf(),
        source,
    })?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".asap-tmp-")
        .tempfile_in(parent)
        .map_err(|source| AsapError::TransientIo {
            path: parent.to_path_buf(),
            source,
        })?;

    tmp.write_all(normalized.as_bytes())
        .and_then(|_| tmp.as_file_mut().sync_all())
        .map_err(|source| AsapError::TransientIo {
            path: path.to_path_buf(),
            source,
        })?;

    match tmp.persist(path) {
        Ok(_) => Ok(()),
        Err(persist_err) => {
            // Cross-filesystem rename (EXDEV) falls back to copy + fsync.
            if persist_err.error.raw_os_error() == Some(18) {
                let tmp_path = persist_err.file.path().to_path_buf();
                std::fs::copy(&tmp_path, path).map_err(|source| AsapError::TransientIo {
                    path: path.to_path_buf(),
                    source,
                })?;
                let f = File::open(path).map_err(|source| AsapError::TransientIo {
                    path: path.to_path_buf(),
                    source,
                })?;
                f.sync_all().map_err(|source| AsapError::TransientIo {
                    path: path.to_path_buf(),
                    source,
                })?;
                let _ = std::fs::remove_file(&tmp_path);
                Ok(())
            } else {
                Err(AsapError::TransientIo {
                    path: path.to_path_buf(),
                    source: persist_err.error,
                })
            }
        }
    }
}

/// Read a file's contents, tolerating CRLF line endings written by upstream
/// tools that don't normalize.
pub fn read_file_tolerant(path: &Utf8Path) -> AsapResult<String> {
    let raw = std::fs::read_to_string(path).map_err(|source| AsapError::TransientIo {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(normalize_line_endings(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn writes_and_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("idx.txt");
        write_file_atomic(&path, "hello").unwrap();
        assert_eq!(read_file_tolerant(&path).unwrap(), "hello");
    }

    #[test]
    fn normalizes_crlf() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("idx.txt");
        write_file_atomic(&path, "a\r\nb\rc\n").unwrap();
        assert_eq!(read_file_tolerant(&path).unwrap(), "a\nb\nc\n");
    }

    #[test]
    fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("nested").join("deep").join("idx.txt");
        write_file_atomic(&path, "x").unwrap();
        assert_eq!(read_file_tolerant(&path).unwrap(), "x");
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("idx.txt");
        write_file_atomic(&path, "first").unwrap();
        write_file_atomic(&path, "second").unwrap();
        assert_eq!(read_file_tolerant(&path).unwrap(), "second");
    }

    #[test]
    fn empty_content_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("idx.txt");
        write_file_atomic(&path, "").unwrap();
        assert_eq!(read_file_tolerant(&path).unwrap(), "");
    }

    #[test]
    fn unicode_content_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("idx.txt");
        write_file_atomic(&path, "caf\u{e9} \u{2014} \u{1f4c4}").unwrap();
        assert_eq!(read_file_tolerant(&path).unwrap(), "caf\u{e9} \u{2014} \u{1f4c4}");
    }
}
