//! Adapters wiring the file-backed db pool into every repository and
//! field-source port the viable-case resolver and index builder depend
//! on. Table layout: `sample`, `order`, `case_qc`, `acord103`,
//! `delta_qc_group`, `asap_contact_map`, one JSON array per logical db
//! directory (see [`crate::filedb`]).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use asap_model::{Acord103, CaseQc, CaseQcState, Document, DocumentId, Order, Sample};
use asap_ports::db::{Cursor, Row};
use asap_ports::xml::{ParsedXmlDocument, XmlNode};
use asap_viable::{Acord103Repo, AsapContactRepo, CaseQcRepo, DocGroupRepo, OrderRepo, SampleRepo};

fn parse_dt(row: &Row, column: &str) -> Option<DateTime<Utc>> {
    row.get(column).and_then(|v| DateTime::parse_from_rfc3339(v).ok()).map(|dt| dt.with_timezone(&Utc))
}

fn sample_from_row(row: &Row) -> Sample {
    Sample {
        sid: row.get("sid").cloned().unwrap_or_default(),
        client_id: row.get("client_id").cloned().unwrap_or_default(),
        region_id: row.get("region_id").cloned().unwrap_or_default(),
        examiner: row.get("examiner").cloned(),
        transmit_date: parse_dt(row, "transmit_date"),
        hold_flag: row.get("hold_flag").and_then(|v| v.chars().next()),
    }
}

fn order_from_row(row: &Row) -> Option<Order> {
    Some(Order {
        tracking_id: row.get("tracking_id")?.clone(),
        sid: row.get("sid")?.clone(),
        source_code: row.get("source_code").cloned().unwrap_or_default(),
        naic: row.get("naic").cloned(),
        policy_number: row.get("policy_number").cloned(),
        first_name: row.get("first_name").cloned(),
        last_name: row.get("last_name").cloned(),
        ssn: row.get("ssn").cloned(),
        date_received: parse_dt(row, "date_received").unwrap_or_else(Utc::now),
        date_cancelled: parse_dt(row, "date_cancelled"),
    })
}

fn case_qc_from_row(row: &Row) -> Option<CaseQc> {
    let state = match row.get("state").map(String::as_str) {
        Some("New") => CaseQcState::New,
        Some("Pending") => CaseQcState::Pending,
        Some("Released") => CaseQcState::Released,
        _ => return None,
    };
    Some(CaseQc { sid: row.get("sid")?.clone(), tracking_id: row.get("tracking_id")?.clone(), state })
}

fn acord103_from_row(row: &Row) -> Option<Acord103> {
    Some(Acord103 {
        tracking_id: row.get("tracking_id")?.clone(),
        tracking_id_103: row.get("tracking_id_103").cloned().unwrap_or_default(),
        trans_ref_guid: row.get("trans_ref_guid").cloned().unwrap_or_default(),
        policy_number: row.get("policy_number").cloned(),
        blob: row.get("blob").map(|b| b.as_bytes().to_vec()).unwrap_or_default(),
        superseded: row.get("superseded").map(|v| v == "true").unwrap_or(false),
        retrieve_requested: row.get("retrieve_requested").map(|v| v == "true").unwrap_or(false),
    })
}

/// Backs every `*Repo` trait the viable-case resolver needs against one
/// pair of cursors: `snip`/`sip` style LIMS data lives in one logical db,
/// order/case-qc/103/Delta-QC data in others, mirroring the source's
/// multi-database split.
pub struct FileRepos {
    pub lims: Arc<dyn Cursor>,
    pub acord: Arc<dyn Cursor>,
    pub case_qc: Arc<dyn Cursor>,
    pub delta_qc: Arc<dyn Cursor>,
}

#[async_trait]
impl SampleRepo for FileRepos {
    async fn by_sid(&self, sid: &str) -> Option<Sample> {
        let rows = self.lims.query("sample", "sid", sid).await.ok()?;
        rows.first().map(sample_from_row)
    }
}

#[async_trait]
impl OrderRepo for FileRepos {
    async fn by_sid(&self, sid: &str) -> Vec<Order> {
        self.acord.query("order", "sid", sid).await.unwrap_or_default().iter().filter_map(order_from_row).collect()
    }

    async fn by_tracking_id(&self, tracking_id: &str) -> Option<Order> {
        let rows = self.acord.query("order", "tracking_id", tracking_id).await.ok()?;
        rows.first().and_then(order_from_row)
    }

    async fn by_ref_id(&self, ref_id: &str) -> Vec<Order> {
        self.acord.query("order", "ref_id", ref_id).await.unwrap_or_default().iter().filter_map(order_from_row).collect()
    }
}

#[async_trait]
impl CaseQcRepo for FileRepos {
    async fn by_tracking_id(&self, tracking_id: &str) -> Vec<CaseQc> {
        self.case_qc.query("case_qc", "tracking_id", tracking_id).await.unwrap_or_default().iter().filter_map(case_qc_from_row).collect()
    }
}

#[async_trait]
impl Acord103Repo for FileRepos {
    async fn by_tracking_id(&self, tracking_id: &str) -> Option<Acord103> {
        let rows = self.acord.query("acord103", "tracking_id", tracking_id).await.ok()?;
        rows.first().and_then(acord103_from_row)
    }

    async fn by_policy_number(&self, policy_number: &str) -> Option<Acord103> {
        let rows = self.acord.query("acord103", "policy_number", policy_number).await.ok()?;
        rows.first().and_then(acord103_from_row)
    }
}

#[async_trait]
impl DocGroupRepo for FileRepos {
    async fn sid_for_document_id(&self, document_id: &str) -> Option<String> {
        let rows = self.delta_qc.query("delta_qc_group", "document_id", document_id).await.ok()?;
        rows.first().and_then(|r| r.get("sid").cloned())
    }

    async fn document_group_ids_for_sid(&self, sid: &str) -> Vec<String> {
        self.delta_qc
            .query("delta_qc_group", "sid", sid)
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|r| r.get("document_id").cloned())
            .collect()
    }
}

#[async_trait]
impl AsapContactRepo for FileRepos {
    async fn contact_id_for_sid(&self, sid: &str) -> Option<String> {
        let rows = self.lims.query("asap_contact_map", "sid", sid).await.ok()?;
        rows.first().and_then(|r| r.get("contact_id").cloned())
    }
}

/// LIMS field resolution against the `snip`/`sip`-style logical db: probes
/// `snip` first, falling back to `sip`, matching the documented migration
/// order.
pub struct FileLimsSource {
    pub snip: Arc<dyn Cursor>,
    pub sip: Arc<dyn Cursor>,
}

#[async_trait]
impl asap_index::LimsFieldSource for FileLimsSource {
    async fn resolve(&self, table: &str, column: &str, sid: &str) -> Option<String> {
        if let Ok(rows) = self.snip.query(table, "sid", sid).await {
            if let Some(value) = rows.first().and_then(|r| r.get(column).cloned()) {
                return Some(value);
            }
        }
        let rows = self.sip.query(table, "sid", sid).await.ok()?;
        rows.first().and_then(|r| r.get(column).cloned())
    }
}

/// Fetches the latest ACORD 121 order request XML for `(sourceCode,
/// trackingId)` from the `acord` logical db's `order_xml` table.
pub struct FileAcord121Source {
    pub acord: Arc<dyn Cursor>,
}

#[async_trait]
impl asap_index::Acord121Source for FileAcord121Source {
    async fn latest_order_xml(&self, source_code: &str, tracking_id: &str) -> Option<XmlNode> {
        let rows = self.acord.query("order_xml", "tracking_id", tracking_id).await.ok()?;
        let row = rows.into_iter().find(|r| r.get("source_code").map(String::as_str) == Some(source_code))?;
        let xml = row.get("xml")?;
        ParsedXmlDocument::parse(xml).ok().map(ParsedXmlDocument::into_root)
    }
}

/// Loads the 103 XML blob for a trackingId from the contact's
/// `acord103Dir`, written there by [`asap_acord103::Acord103Store::materialize_live_file`].
pub struct FileAcord103Source {
    pub acord103_dir: Option<camino::Utf8PathBuf>,
}

#[async_trait]
impl asap_index::Acord103Source for FileAcord103Source {
    async fn load(&self, tracking_id: &str) -> Option<XmlNode> {
        let dir = self.acord103_dir.as_ref()?;
        let path = dir.join(format!("{tracking_id}.XML"));
        let text = std::fs::read_to_string(path).ok()?;
        ParsedXmlDocument::parse(&text).ok().map(ParsedXmlDocument::into_root)
    }
}

/// Hydrates a Delta-QC document group id into the full [`Document`] record
/// a `Case` attaches, since `ViableCase` only carries the bare id.
pub struct DocumentHydrator {
    pub delta_qc: Arc<dyn Cursor>,
}

impl DocumentHydrator {
    pub async fn hydrate(&self, document_id: &str) -> Option<Document> {
        let rows = self.delta_qc.query("document", "document_id", document_id).await.ok()?;
        let row = rows.first()?;
        Some(Document {
            document_id: DocumentId::new(document_id),
            doc_type_name: row.get("doc_type_name").cloned().unwrap_or_default(),
            page_count: row.get("page_count").and_then(|v| v.parse().ok()).unwrap_or(1),
            file_name: row.get("file_name").cloned().unwrap_or_default(),
            date_created: parse_dt(row, "date_created").unwrap_or_else(Utc::now),
            f_bill: false,
            f_send: false,
        })
    }
}

/// Resolves a reconciliation feed's file names back to their owning
/// `(sid, document_id)` via the Delta-QC logical db's `document` table.
///
/// `DocumentByFileName` is a synchronous trait (the feed is parsed and
/// resolved in one blocking pass), so this reads the table file directly
/// rather than going through the async [`Cursor`] port.
pub struct FileDocumentLookup {
    pub delta_qc_dir: camino::Utf8PathBuf,
}

impl asap_transmit::DocumentByFileName for FileDocumentLookup {
    fn resolve(&self, image_file_name: &str) -> Option<(String, String)> {
        let path = self.delta_qc_dir.join("document.json");
        let text = std::fs::read_to_string(path).ok()?;
        let rows: Vec<Row> = serde_json::from_str(&text).ok()?;
        let row = rows.iter().find(|r| r.get("file_name").map(String::as_str) == Some(image_file_name))?;
        Some((row.get("sid")?.clone(), row.get("document_id")?.clone()))
    }
}
