//! End-to-end exercise of a full run: seed the file-backed logical
//! databases directly (the same JSON-per-table shape `FileDbPool`
//! reads/writes), boot a `Pipeline` against a single demo-carrier
//! contact, and check what actually lands on disk — the index line, the
//! transmit history rows, and the files the demo transport moved into
//! `xmit/sent/`.

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use serde_json::json;
use tempfile::TempDir;

use asap_config::{ConfigStore, GlobalSettings, RawConfig};
use asap_model::{Contact, Index, IndexField, IndexFieldSource, IndexType, OnStageExceptionPolicy};
use asap_pipeline::Pipeline;
use asap_scheduler::CancellationToken;

fn utf8(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
}

fn write_table(home: &Utf8PathBuf, logical: &str, table: &str, rows: serde_json::Value) {
    let dir = home.join("db").join(logical);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{table}.json")), serde_json::to_string_pretty(&rows).unwrap()).unwrap();
}

fn demo_contact(home: &Utf8PathBuf) -> Contact {
    let doc_dir = home.join("contacts/c1/docs");
    let mut doc_type_billing_code = BTreeMap::new();
    doc_type_billing_code.insert("APPLICATION".to_string(), "BILL".to_string());

    Contact {
        contact_id: "C1".to_string(),
        client_id: "CL1".to_string(),
        region_id: "R1".to_string(),
        examiner: None,
        source_code: "ASAP".to_string(),
        doc_dir,
        acord103_dir: None,
        index_dir: home.join("contacts/c1/idx"),
        xmit_dir: home.join("contacts/c1/xmit"),
        index: Index {
            fields: vec![
                IndexField {
                    name: "POLNO".to_string(),
                    source: IndexFieldSource::Acord121,
                    reference: Some("Order.PolNumber".to_string()),
                    required: true,
                    max_length: None,
                    format: None,
                    value: None,
                },
                IndexField {
                    name: "SSN".to_string(),
                    source: IndexFieldSource::Acord121,
                    reference: Some("Order.Ssn".to_string()),
                    required: true,
                    max_length: None,
                    format: None,
                    value: None,
                },
                IndexField {
                    name: "PAGES".to_string(),
                    source: IndexFieldSource::DeltaQc,
                    reference: Some("docCount".to_string()),
                    required: false,
                    max_length: None,
                    format: None,
                    value: None,
                },
                IndexField {
                    name: "REQUIRE".to_string(),
                    source: IndexFieldSource::Derived,
                    reference: None,
                    required: false,
                    max_length: None,
                    format: None,
                    value: None,
                },
            ],
            delim: "\n".to_string(),
            subdelim: "=".to_string(),
            index_type: IndexType::Case,
        },
        doc_type_client_name: BTreeMap::new(),
        doc_type_billing_code,
        carrier_hook_id: "demo".to_string(),
        on_stage_exception_policy: OnStageExceptionPolicy::default(),
    }
}

/// Seeds every logical db table a released, dual-document case needs to
/// resolve as `Ready` and index cleanly: `sample`, `order`, `case_qc`,
/// `order_xml`, `asap_contact_map`, `delta_qc_group`, `document`.
fn seed_case(home: &Utf8PathBuf) {
    write_table(home, "snip", "sample", json!([{"sid": "S1", "client_id": "CL1", "region_id": "R1"}]));
    write_table(home, "snip", "asap_contact_map", json!([{"sid": "S1", "contact_id": "C1"}]));

    write_table(
        home,
        "acord",
        "order",
        json!([{
            "tracking_id": "T1",
            "sid": "S1",
            "source_code": "ASAP",
            "policy_number": "ABC12345",
            "date_received": "2026-07-01T00:00:00Z",
        }]),
    );
    write_table(
        home,
        "acord",
        "order_xml",
        json!([{
            "tracking_id": "T1",
            "source_code": "ASAP",
            "xml": "<Order><PolNumber>ABC12345</PolNumber><Ssn>123456789</Ssn></Order>",
        }]),
    );

    write_table(home, "case_qc", "case_qc", json!([{"sid": "S1", "tracking_id": "T1", "state": "Released"}]));

    write_table(
        home,
        "delta_qc",
        "delta_qc_group",
        json!([
            {"sid": "S1", "document_id": "D1"},
            {"sid": "S1", "document_id": "D2"},
        ]),
    );
    write_table(
        home,
        "delta_qc",
        "document",
        json!([
            {"document_id": "D1", "doc_type_name": "APPLICATION", "page_count": "2", "file_name": "00000001.tif", "date_created": "2026-07-01T00:00:00Z"},
            {"document_id": "D2", "doc_type_name": "APPLICATION", "page_count": "1", "file_name": "00000002.tif", "date_created": "2026-07-01T00:00:00Z"},
        ]),
    );
}

fn bootstrap(home: &Utf8PathBuf, contact: Contact) -> Pipeline {
    let settings = GlobalSettings {
        report_id: "RPT1".to_string(),
        build_subdir: "build".to_string(),
        error_subdir: "error".to_string(),
        processed_subdir: "processed".to_string(),
        delta_qc_sid_field: "sid".to_string(),
        no_bill_codes: vec![],
        no_bill_no_send_codes: vec!["NO_BILL_NO_SEND".to_string()],
        concurrency_cap: 1,
        history_retry_attempts: 1,
        history_retry_sleep_ms: 1,
    };
    let raw = RawConfig { settings, databases: vec![], contacts: vec![contact] };
    let config = ConfigStore::from_raw(raw);
    Pipeline::bootstrap(config, home)
}

#[tokio::test]
async fn happy_path_case_type_index_and_transmit() {
    let dir = TempDir::new().unwrap();
    let home = utf8(&dir);
    seed_case(&home);
    let contact = demo_contact(&home);

    let processed_dir = contact.processed_doc_dir("processed");
    std::fs::create_dir_all(&processed_dir).unwrap();
    std::fs::write(processed_dir.join("00000001.tif"), b"page one").unwrap();
    std::fs::write(processed_dir.join("00000002.tif"), b"page two").unwrap();

    let pipeline = bootstrap(&home, contact);
    let report = pipeline.run(CancellationToken::new()).await;

    assert!(!report.has_errors(), "run should complete without a contact-level error");
    assert_eq!(report.total_transmitted(), 1, "exactly one case should transmit");

    let idx_path = home.join("contacts/c1/idx/T1.IDX");
    let idx_text = std::fs::read_to_string(&idx_path).expect("case-type IDX file should be written under the contact's indexDir");
    assert!(idx_text.contains("POLNO=ABC12345"));
    assert!(idx_text.contains("SSN=123456789"));
    assert!(idx_text.contains("PAGES=2"), "PAGES resolves to the case's document count, not a per-document page count");
    assert!(idx_text.contains("REQUIRE=Y"), "the demo carrier's derived-field hook always stamps REQUIRE=Y");

    let sent_dir = home.join("contacts/c1/xmit/sent");
    assert!(sent_dir.join("00000001.tif").exists());
    assert!(sent_dir.join("00000002.tif").exists());

    let history_path = home.join("db/xmit/asap_document_history.json");
    let history_text = std::fs::read_to_string(&history_path).expect("transmit should have written history rows");
    let rows: Vec<serde_json::Value> = serde_json::from_str(&history_text).unwrap();
    let transmit_rows: Vec<_> = rows.iter().filter(|r| r["action"] == "transmit").collect();
    assert_eq!(transmit_rows.len(), 2, "one transmit row per document");
}

/// A case where one of its two documents already carries a `transmit`
/// history row from an earlier run (seeded directly, bypassing the
/// pipeline) must resend only the undelivered document, not the whole
/// case again — the partial-resend path `build_case`'s delivered-filter
/// exists for.
#[tokio::test]
async fn partial_resend_only_sends_undelivered_document() {
    let dir = TempDir::new().unwrap();
    let home = utf8(&dir);
    seed_case(&home);
    let contact = demo_contact(&home);

    let processed_dir = contact.processed_doc_dir("processed");
    std::fs::create_dir_all(&processed_dir).unwrap();
    std::fs::write(processed_dir.join("00000001.tif"), b"page one").unwrap();
    std::fs::write(processed_dir.join("00000002.tif"), b"page two").unwrap();

    write_table(
        &home,
        "xmit",
        "asap_document_history",
        json!([{
            "sid": "S1", "document_id": "D1", "contact_id": "C1",
            "action": "transmit", "actiondate": "2026-07-01T00:00:00Z",
        }]),
    );

    let pipeline = bootstrap(&home, contact);
    let report = pipeline.run(CancellationToken::new()).await;

    assert_eq!(report.total_transmitted(), 1, "the case still has an undelivered document, so it transmits again");

    let sent_dir = home.join("contacts/c1/xmit/sent");
    assert!(sent_dir.join("00000002.tif").exists(), "the undelivered document is sent");
    assert!(!sent_dir.join("00000001.tif").exists(), "the already-delivered document is not resent");

    let history_path = home.join("db/xmit/asap_document_history.json");
    let rows: Vec<serde_json::Value> = serde_json::from_str(&std::fs::read_to_string(&history_path).unwrap()).unwrap();
    let transmit_rows: Vec<_> = rows.iter().filter(|r| r["action"] == "transmit").collect();
    assert_eq!(transmit_rows.len(), 2, "the seeded D1 row plus one new row for D2");
}

#[tokio::test]
async fn second_run_with_no_new_input_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let home = utf8(&dir);
    seed_case(&home);
    let contact = demo_contact(&home);

    let processed_dir = contact.processed_doc_dir("processed");
    std::fs::create_dir_all(&processed_dir).unwrap();
    std::fs::write(processed_dir.join("00000001.tif"), b"page one").unwrap();
    std::fs::write(processed_dir.join("00000002.tif"), b"page two").unwrap();

    let pipeline = bootstrap(&home, contact);
    let first = pipeline.run(CancellationToken::new()).await;
    assert_eq!(first.total_transmitted(), 1);

    let history_path = home.join("db/xmit/asap_document_history.json");
    let after_first: Vec<serde_json::Value> = serde_json::from_str(&std::fs::read_to_string(&history_path).unwrap()).unwrap();

    let second = pipeline.run(CancellationToken::new()).await;
    assert_eq!(second.total_transmitted(), 0, "case_qc is still Released but history already shows a prior transmit, so it must not re-fire");

    let after_second: Vec<serde_json::Value> = serde_json::from_str(&std::fs::read_to_string(&history_path).unwrap()).unwrap();
    assert_eq!(after_first.len(), after_second.len(), "a no-op re-run must not append new history rows");
}

/// A carrier feedback feed that only names one of the two transmitted
/// images must reconcile only that one, leaving the other's gap visible
/// in history rather than silently marking the whole case reconciled.
#[tokio::test]
async fn recon_feed_with_gap_reconciles_only_the_named_image() {
    let dir = TempDir::new().unwrap();
    let home = utf8(&dir);
    seed_case(&home);
    let contact = demo_contact(&home);

    let processed_dir = contact.processed_doc_dir("processed");
    std::fs::create_dir_all(&processed_dir).unwrap();
    std::fs::write(processed_dir.join("00000001.tif"), b"page one").unwrap();
    std::fs::write(processed_dir.join("00000002.tif"), b"page two").unwrap();

    let pipeline = bootstrap(&home, contact);
    let report = pipeline.run(CancellationToken::new()).await;
    assert_eq!(report.total_transmitted(), 1);

    let recon_report = pipeline.ingest_recon_feed("CL1|2026-07-02T00:00:00Z|00000001.tif\n", "C1").await;
    assert_eq!(recon_report.reconciled, vec!["00000001.tif".to_string()]);
    assert!(recon_report.malformed_lines.is_empty());

    let history_path = home.join("db/xmit/asap_document_history.json");
    let rows: Vec<serde_json::Value> = serde_json::from_str(&std::fs::read_to_string(&history_path).unwrap()).unwrap();
    let reconcile_rows: Vec<_> = rows.iter().filter(|r| r["action"] == "reconcile").collect();
    assert_eq!(reconcile_rows.len(), 1, "only the named image gets a reconcile row");
    assert_eq!(reconcile_rows[0]["document_id"], "D1");
}
