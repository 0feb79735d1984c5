//! Case/document/contact data model shared by every pipeline stage.
//!
//! Types here are plain records: no cyclic back-references (a `Document`
//! does not point back to its `Case`; callers carry both together), and no
//! singleton state. `CaseId` is a lightweight handle used where a
//! back-reference would otherwise be unavoidable (e.g. routing a case to
//! an error folder).

pub mod acord103;
pub mod caseqc;
pub mod contact;
pub mod document;
pub mod history;
pub mod ids;
pub mod index;
pub mod order;
pub mod sample;
pub mod tracked_file;
pub mod viable_case;

pub use acord103::Acord103;
pub use caseqc::{CaseQc, CaseQcState};
pub use contact::{Contact, OnStageExceptionPolicy};
pub use document::Document;
pub use history::{HistoryAction, HistoryItem};
pub use ids::{CaseId, DocumentId};
pub use index::{Index, IndexField, IndexFieldSource, IndexType};
pub use order::Order;
pub use sample::Sample;
pub use tracked_file::{TrackedFile, TrackedFileState};
pub use viable_case::{IdentifierTrack, ViableCase, ViableCaseErrors};

use std::collections::BTreeMap;

/// A case mid-pipeline: a sid/trackingId pair, the contact it belongs to,
/// and the documents attached so far. Owned exclusively by the worker
/// processing its contact during a run.
#[derive(Debug, Clone)]
pub struct Case {
    pub id: CaseId,
    pub sid: String,
    pub tracking_id: String,
    pub source_code: String,
    pub contact_id: String,
    documents: BTreeMap<DocumentId, Document>,
}

impl Case {
    pub fn new(id: CaseId, sid: impl Into<String>, tracking_id: impl Into<String>, source_code: impl Into<String>, contact_id: impl Into<String>) -> Self {
        Self {
            id,
            sid: sid.into(),
            tracking_id: tracking_id.into(),
            source_code: source_code.into(),
            contact_id: contact_id.into(),
            documents: BTreeMap::new(),
        }
    }

    /// Attaches a document, provided its billing code is not
    /// no-bill-no-send (checked by the caller before invoking this).
    pub fn add_document(&mut self, doc: Document) {
        self.documents.insert(doc.document_id.clone(), doc);
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn document(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}
