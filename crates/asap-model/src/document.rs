use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::DocumentId;

/// An imaged document attached to exactly one case. Immutable once
/// constructed by the document factory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub document_id: DocumentId,
    pub doc_type_name: String,
    pub page_count: u32,
    /// 8.3-form file name; the numeric base is the first page id, left-padded to 8 digits.
    pub file_name: String,
    pub date_created: DateTime<Utc>,
    pub f_bill: bool,
    pub f_send: bool,
}

impl Document {
    /// Builds the 8.3 base name (left-padded first-page id) used as the
    /// image file stem and, for document-type indexes, the IDX stem.
    pub fn file_stem(&self) -> Option<&str> {
        self.file_name.split('.').next()
    }

    pub fn first_page_id(&self) -> Option<u32> {
        self.file_stem().and_then(|s| s.parse().ok())
    }
}

pub fn pad_page_id(page_id: u32) -> String {
    format!("{page_id:08}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_eight_digits() {
        assert_eq!(pad_page_id(42), "00000042");
    }

    #[test]
    fn file_stem_strips_extension() {
        let doc = Document {
            document_id: DocumentId::new("D1"),
            doc_type_name: "APPLICATION".into(),
            page_count: 3,
            file_name: "00000042.tif".into(),
            date_created: Utc::now(),
            f_bill: true,
            f_send: true,
        };
        assert_eq!(doc.file_stem(), Some("00000042"));
        assert_eq!(doc.first_page_id(), Some(42));
    }
}
