//! Index builder (C8): resolves every index field from its declared
//! source (LIMS, ACORD 121, ACORD 103, Delta-QC, derived) and writes one
//! IDX per case or per document, per the contact's index type.

pub mod builder;
pub mod hooks;
pub mod sources;

pub use builder::{IndexBuilder, IndexBuildResult, IndexError};
pub use hooks::{DefaultIndexHooks, IndexHooks};
pub use sources::{Acord103Source, Acord121Source, LimsFieldSource};

#[cfg(test)]
mod tests {
    use super::*;
    use asap_model::*;
    use asap_ports::xml::XmlNode;
    use async_trait::async_trait;
    use camino::Utf8PathBuf;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    struct FakeLims;
    #[async_trait]
    impl LimsFieldSource for FakeLims {
        async fn resolve(&self, _table: &str, column: &str, _sid: &str) -> Option<String> {
            match column {
                "ssn" => Some("123456789".to_string()),
                _ => None,
            }
        }
    }

    struct FakeAcord121;
    #[async_trait]
    impl Acord121Source for FakeAcord121 {
        async fn latest_order_xml(&self, _source_code: &str, _tracking_id: &str) -> Option<XmlNode> {
            let mut policy = XmlNode { tag: "Policy".into(), ..Default::default() };
            policy.children.push(XmlNode { tag: "PolicyNumber".into(), text: "ABC12345".into(), ..Default::default() });
            Some(policy)
        }
    }

    struct NoAcord103;
    #[async_trait]
    impl Acord103Source for NoAcord103 {
        async fn load(&self, _tracking_id: &str) -> Option<XmlNode> {
            None
        }
    }

    fn field(name: &str, source: IndexFieldSource, reference: Option<&str>, required: bool) -> IndexField {
        IndexField { name: name.into(), source, reference: reference.map(String::from), required, max_length: None, format: None, value: None }
    }

    fn contact(index_dir: Utf8PathBuf) -> Contact {
        Contact {
            contact_id: "C1".into(),
            client_id: "CL1".into(),
            region_id: "R1".into(),
            examiner: None,
            source_code: "ASAP".into(),
            doc_dir: index_dir.join("docs"),
            acord103_dir: None,
            index_dir,
            xmit_dir: Utf8PathBuf::from("/tmp/xmit"),
            index: Index {
                fields: vec![
                    field("POLNO", IndexFieldSource::Acord121, Some("Policy.PolicyNumber"), true),
                    field("SSN", IndexFieldSource::Lims, Some("sample.ssn"), true),
                    field("PAGES", IndexFieldSource::DeltaQc, Some("docCount"), false),
                    field("REQUIRE", IndexFieldSource::Derived, None, false),
                ],
                delim: "\n".into(),
                subdelim: "=".into(),
                index_type: IndexType::Case,
            },
            doc_type_client_name: BTreeMap::new(),
            doc_type_billing_code: BTreeMap::new(),
            carrier_hook_id: "demo".into(),
            on_stage_exception_policy: OnStageExceptionPolicy::Restage,
        }
    }

    fn case_with_two_docs() -> Case {
        let mut case = Case::new(CaseId::new("S1"), "S1", "T1", "ASAP", "C1");
        for i in 1..=2 {
            case.add_document(Document {
                document_id: DocumentId::new(format!("D{i}")),
                doc_type_name: "APPLICATION".into(),
                page_count: 1,
                file_name: format!("{i:08}.tif"),
                date_created: Utc::now(),
                f_bill: true,
                f_send: true,
            });
        }
        case
    }

    #[tokio::test]
    async fn happy_path_case_index_has_four_lines_one_file() {
        let dir = TempDir::new().unwrap();
        let index_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let contact = contact(index_dir.clone());
        let case = case_with_two_docs();

        let builder = IndexBuilder::new(std::sync::Arc::new(FakeLims), std::sync::Arc::new(FakeAcord121), std::sync::Arc::new(NoAcord103));
        let written = builder.build_indexes_for_case(&case, &contact, &DefaultIndexHooks).await.unwrap();

        assert_eq!(written.len(), 1, "type=CASE writes exactly one IDX");
        let content = std::fs::read_to_string(&written[0]).unwrap();
        assert_eq!(content.lines().count(), 4);
        assert!(content.contains("POLNO=ABC12345"));
        assert!(content.contains("SSN=123456789"));
    }

    #[tokio::test]
    async fn document_type_writes_one_idx_per_document() {
        let dir = TempDir::new().unwrap();
        let index_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let mut contact = contact(index_dir.clone());
        contact.index.index_type = IndexType::Document;
        let case = case_with_two_docs();

        let builder = IndexBuilder::new(std::sync::Arc::new(FakeLims), std::sync::Arc::new(FakeAcord121), std::sync::Arc::new(NoAcord103));
        let written = builder.build_indexes_for_case(&case, &contact, &DefaultIndexHooks).await.unwrap();

        assert_eq!(written.len(), 2, "type=DOCUMENT writes one IDX per document");
    }

    #[tokio::test]
    async fn acord103_field_without_configured_dir_errors() {
        let dir = TempDir::new().unwrap();
        let index_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let mut contact = contact(index_dir);
        contact.index.fields.push(field("REFNUM", IndexFieldSource::Acord103, Some("Request.RefNum"), false));
        let case = case_with_two_docs();

        let builder = IndexBuilder::new(std::sync::Arc::new(FakeLims), std::sync::Arc::new(FakeAcord121), std::sync::Arc::new(NoAcord103));
        let result = builder.build_indexes_for_case(&case, &contact, &DefaultIndexHooks).await;
        assert!(matches!(result, Err(IndexError::Acord103NotConfigured { .. })));
    }
}
