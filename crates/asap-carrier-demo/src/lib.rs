//! A demonstration carrier specialization, analogous to the source's
//! `TestCustomHandler`: implements just enough of `IndexHooks` and
//! `TransmitHooks` to exercise the pipeline end to end against a plain
//! pickup-directory transport instead of a real FTP/SFTP/PGP stack.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use camino::Utf8Path;
use tracing::info;

use asap_index::hooks::IndexHooks;
use asap_index::IndexError;
use asap_model::{Case, Document, Index};
use asap_transmit::{HookOutcome, TransmitHooks};
use asap_utils::atomic_write;

/// Fills the `REQUIRE` derived field with a fixed carrier-required flag
/// and nothing else — the minimal custom handler a carrier needs when it
/// has no document-specific logic.
pub struct DemoIndexHooks;

impl IndexHooks for DemoIndexHooks {
    fn process_derived_fields(&self, _case: &Case, _document: Option<&Document>, index: &mut Index) -> Result<(), IndexError> {
        for field in index.fields.iter_mut() {
            if field.name == "REQUIRE" {
                field.value = Some("Y".to_string());
            }
        }
        Ok(())
    }
}

/// Stages by copying each document + index pair into `xmitDir`, bundling
/// the 103 only on a first-and-full transmit. Transmits by moving the
/// staged files straight into `xmitDir/sent/` (a stand-in for an FTP
/// upload), which is enough to exercise the orchestrator's state machine
/// without a real transport port.
pub struct DemoTransmitHooks {
    pub acord103_dir: Option<camino::Utf8PathBuf>,
    pub processed_doc_dir: camino::Utf8PathBuf,
    pub index_dir: camino::Utf8PathBuf,
    pre_staged: AtomicBool,
}

impl DemoTransmitHooks {
    pub fn new(acord103_dir: Option<camino::Utf8PathBuf>, processed_doc_dir: camino::Utf8PathBuf, index_dir: camino::Utf8PathBuf) -> Self {
        Self { acord103_dir, processed_doc_dir, index_dir, pre_staged: AtomicBool::new(false) }
    }
}

#[async_trait]
impl TransmitHooks for DemoTransmitHooks {
    async fn pre_stage(&self) -> HookOutcome {
        self.pre_staged.store(true, Ordering::SeqCst);
        HookOutcome::Ok
    }

    async fn stage_indexed_case(&self, case: &Case, xmit_dir: &Utf8Path, is_first_transmit: bool, is_full_transmit: bool) -> HookOutcome {
        if let Err(e) = std::fs::create_dir_all(xmit_dir) {
            return HookOutcome::Failed(e.to_string());
        }

        for document in case.documents() {
            let tif = self.processed_doc_dir.join(&document.file_name);
            let idx = self.index_dir.join(format!("{}.IDX", document.file_stem().unwrap_or(document.document_id.0.as_str())));
            if let Err(e) = copy_if_present(&tif, &xmit_dir.join(&document.file_name)) {
                return HookOutcome::Failed(e.to_string());
            }
            if let Err(e) = copy_if_present(&idx, &xmit_dir.join(idx.file_name().unwrap_or_default())) {
                return HookOutcome::Failed(e.to_string());
            }
        }

        if is_first_transmit && is_full_transmit {
            if let Some(dir) = &self.acord103_dir {
                let src = dir.join(format!("{}.XML", case.tracking_id));
                let dst = xmit_dir.join(format!("{}.XML", case.tracking_id));
                if let Err(e) = copy_if_present(&src, &dst) {
                    return HookOutcome::Failed(e.to_string());
                }
            }
        }

        HookOutcome::Ok
    }

    async fn transmit_staged_cases(&self, xmit_dir: &Utf8Path) -> HookOutcome {
        let sent_dir = xmit_dir.join("sent");
        if let Err(e) = std::fs::create_dir_all(&sent_dir) {
            return HookOutcome::Failed(e.to_string());
        }
        let entries = match std::fs::read_dir(xmit_dir) {
            Ok(e) => e,
            Err(e) => return HookOutcome::Failed(e.to_string()),
        };
        for entry in entries.flatten() {
            if entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Err(e) = std::fs::rename(entry.path(), sent_dir.join(&name)) {
                return HookOutcome::Failed(e.to_string());
            }
        }
        HookOutcome::Ok
    }

    async fn post_transmit(&self, case: &Case) -> HookOutcome {
        info!(sid = %case.sid, "demo carrier post-transmit notification");
        HookOutcome::Ok
    }
}

fn copy_if_present(src: &Utf8Path, dst: &Utf8Path) -> std::io::Result<()> {
    if !src.exists() {
        return Ok(());
    }
    let bytes = std::fs::read(src)?;
    atomic_write::write_file_atomic(dst, &String::from_utf8_lossy(&bytes)).map_err(|e| std::io::Error::other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use asap_model::{CaseId, DocumentId, IndexField, IndexFieldSource, IndexType};
    use camino::Utf8PathBuf;
    use chrono::Utc;
    use tempfile::TempDir;

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    fn case_with_doc() -> Case {
        let mut case = Case::new(CaseId::new("S1"), "S1", "T1", "ASAP", "C1");
        case.add_document(Document {
            document_id: DocumentId::new("D1"),
            doc_type_name: "APPLICATION".into(),
            page_count: 1,
            file_name: "00000001.tif".into(),
            date_created: Utc::now(),
            f_bill: true,
            f_send: true,
        });
        case
    }

    #[test]
    fn process_derived_fields_sets_require_flag() {
        let mut index = Index {
            fields: vec![IndexField {
                name: "REQUIRE".into(),
                source: IndexFieldSource::Derived,
                reference: None,
                required: false,
                max_length: None,
                format: None,
                value: None,
            }],
            delim: "\n".into(),
            subdelim: "=".into(),
            index_type: IndexType::Case,
        };
        let case = case_with_doc();
        DemoIndexHooks.process_derived_fields(&case, None, &mut index).unwrap();
        assert_eq!(index.fields[0].value.as_deref(), Some("Y"));
    }

    #[tokio::test]
    async fn stage_then_transmit_moves_files_into_sent() {
        let root = TempDir::new().unwrap();
        let processed_dir = utf8_dir(&root).join("processed");
        let index_dir = utf8_dir(&root).join("idx");
        let xmit_dir = utf8_dir(&root).join("xmit");
        std::fs::create_dir_all(&processed_dir).unwrap();
        std::fs::create_dir_all(&index_dir).unwrap();
        std::fs::write(processed_dir.join("00000001.tif"), b"image bytes").unwrap();
        std::fs::write(index_dir.join("00000001.IDX"), "POLNO=ABC\n").unwrap();

        let hooks = DemoTransmitHooks::new(None, processed_dir, index_dir);
        let case = case_with_doc();

        let outcome = hooks.stage_indexed_case(&case, &xmit_dir, true, true).await;
        assert!(matches!(outcome, HookOutcome::Ok));
        assert!(xmit_dir.join("00000001.tif").exists());
        assert!(xmit_dir.join("00000001.IDX").exists());

        let outcome = hooks.transmit_staged_cases(&xmit_dir).await;
        assert!(matches!(outcome, HookOutcome::Ok));
        assert!(xmit_dir.join("sent").join("00000001.tif").exists());
        assert!(!xmit_dir.join("00000001.tif").exists());
    }
}
