use std::sync::Arc;

use asap_model::{Case, Contact, Document, Index, IndexFieldSource, IndexType};
use asap_ports::xml::lookup_path;
use asap_utils::atomic_write;
use camino::Utf8PathBuf;
use thiserror::Error;
use tracing::warn;

use crate::hooks::IndexHooks;
use crate::sources::{Acord103Source, Acord121Source, LimsFieldSource};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("acord103Dir not configured for contact {contact_id} but an ACORD103-sourced field was declared")]
    Acord103NotConfigured { contact_id: String },
    #[error("required field(s) {0:?} resolved empty; index not written")]
    RequiredFieldsEmpty(Vec<String>),
    #[error("carrier hook failed: {0}")]
    HookFailed(String),
    #[error(transparent)]
    Io(#[from] asap_utils::error::AsapError),
}

pub type IndexBuildResult<T> = Result<T, IndexError>;

pub struct IndexBuilder {
    lims: Arc<dyn LimsFieldSource>,
    acord121: Arc<dyn Acord121Source>,
    acord103: Arc<dyn Acord103Source>,
}

impl IndexBuilder {
    pub fn new(lims: Arc<dyn LimsFieldSource>, acord121: Arc<dyn Acord121Source>, acord103: Arc<dyn Acord103Source>) -> Self {
        Self { lims, acord121, acord103 }
    }

    /// Builds and writes every IDX for `case` against `contact`'s index
    /// schema, running `hooks` at the documented points. On any failure
    /// in field resolution or writing, the index is reset and an error
    /// naming the failure is returned; the caller is responsible for
    /// quarantining the case's files to the error subfolder.
    pub async fn build_indexes_for_case(&self, case: &Case, contact: &Contact, hooks: &dyn IndexHooks) -> IndexBuildResult<Vec<Utf8PathBuf>> {
        if !hooks.is_ready_to_index(case) {
            return Ok(Vec::new());
        }

        let mut index = contact.index.clone();
        index.reset_all();

        hooks.pre_process_index(case, &mut index).map_err(|e| IndexError::HookFailed(e.to_string()))?;

        self.resolve_lims_fields(&mut index, &case.sid).await;
        self.resolve_acord121_fields(&mut index, &case.source_code, &case.tracking_id).await;
        self.resolve_acord103_fields(&mut index, contact, &case.tracking_id).await?;

        let mut written = Vec::new();
        match index.index_type {
            IndexType::Case => {
                self.resolve_delta_qc_fields_for_case(&mut index, case);
                hooks.process_derived_fields(case, None, &mut index).map_err(|e| IndexError::HookFailed(e.to_string()))?;
                let path = contact.index_dir.join(format!("{}.IDX", case.tracking_id));
                self.write_index(&index, &path)?;
                written.push(path);
            }
            IndexType::Document => {
                for document in case.documents() {
                    self.resolve_delta_qc_fields_for_document(&mut index, case, document);
                    hooks.process_derived_fields(case, Some(document), &mut index).map_err(|e| IndexError::HookFailed(e.to_string()))?;
                    let stem = document.file_stem().unwrap_or(&document.document_id.0);
                    let path = contact.index_dir.join(format!("{stem}.IDX"));
                    self.write_index(&index, &path)?;
                    written.push(path);
                    index.reset_all();
                    self.resolve_lims_fields(&mut index, &case.sid).await;
                    self.resolve_acord121_fields(&mut index, &case.source_code, &case.tracking_id).await;
                    self.resolve_acord103_fields(&mut index, contact, &case.tracking_id).await?;
                }
            }
        }

        hooks.post_process_index(case, contact).map_err(|e| IndexError::HookFailed(e.to_string()))?;

        Ok(written)
    }

    async fn resolve_lims_fields(&self, index: &mut Index, sid: &str) {
        for field in index.fields.iter_mut().filter(|f| f.source == IndexFieldSource::Lims) {
            if let Some((table, column)) = field.lims_table_column() {
                field.value = self.lims.resolve(table, column, sid).await;
            }
        }
    }

    async fn resolve_acord121_fields(&self, index: &mut Index, source_code: &str, tracking_id: &str) {
        let needs_121 = index.fields.iter().any(|f| f.source == IndexFieldSource::Acord121);
        if !needs_121 {
            return;
        }
        let root = self.acord121.latest_order_xml(source_code, tracking_id).await;
        for field in index.fields.iter_mut().filter(|f| f.source == IndexFieldSource::Acord121) {
            let Some(path) = field.reference.as_deref() else { continue };
            match root.as_ref().and_then(|r| lookup_path(r, path)) {
                Some(node) => field.value = Some(node.text.clone()),
                None => warn!(field = %field.name, path, "ACORD 121 path did not resolve"),
            }
        }
    }

    async fn resolve_acord103_fields(&self, index: &mut Index, contact: &Contact, tracking_id: &str) -> IndexBuildResult<()> {
        let needs_103 = index.fields.iter().any(|f| f.source == IndexFieldSource::Acord103);
        if !needs_103 {
            return Ok(());
        }
        if contact.acord103_dir.is_none() {
            return Err(IndexError::Acord103NotConfigured { contact_id: contact.contact_id.clone() });
        }
        let root = self.acord103.load(tracking_id).await;
        for field in index.fields.iter_mut().filter(|f| f.source == IndexFieldSource::Acord103) {
            let Some(path) = field.reference.as_deref() else { continue };
            match root.as_ref().and_then(|r| lookup_path(r, path)) {
                Some(node) => field.value = Some(node.text.clone()),
                None => warn!(field = %field.name, path, "ACORD 103 path did not resolve"),
            }
        }
        Ok(())
    }

    fn resolve_delta_qc_fields_for_case(&self, index: &mut Index, case: &Case) {
        for field in index.fields.iter_mut().filter(|f| f.source == IndexFieldSource::DeltaQc) {
            field.value = delta_qc_value(field.reference.as_deref(), case, None);
        }
    }

    fn resolve_delta_qc_fields_for_document(&self, index: &mut Index, case: &Case, document: &Document) {
        for field in index.fields.iter_mut().filter(|f| f.source == IndexFieldSource::DeltaQc) {
            field.value = delta_qc_value(field.reference.as_deref(), case, Some(document));
        }
    }

    fn write_index(&self, index: &Index, path: &Utf8PathBuf) -> IndexBuildResult<()> {
        let line = index.write_line().map_err(IndexError::RequiredFieldsEmpty)?;
        atomic_write::write_file_atomic(path, &line)?;
        Ok(())
    }
}

fn delta_qc_value(reference: Option<&str>, case: &Case, document: Option<&Document>) -> Option<String> {
    match reference {
        Some("docCount") => Some(case.document_count().to_string()),
        Some("trackingId") => Some(case.tracking_id.clone()),
        Some("dateCreated") => document.map(|d| d.date_created.to_rfc3339()),
        Some("pageCount") => document.map(|d| d.page_count.to_string()),
        Some("docTypeName") => document.map(|d| d.doc_type_name.clone()),
        Some("clientDocName") => document.map(|d| d.doc_type_name.clone()),
        _ => None,
    }
}
