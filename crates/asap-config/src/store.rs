use camino::Utf8Path;
use std::collections::BTreeMap;
use thiserror::Error;

use asap_model::Contact;

use crate::model::{DbDescriptor, GlobalSettings, RawConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: Box<toml::de::Error>,
    },
    #[error("missing required setting: {0}")]
    MissingSetting(String),
    #[error("unknown contact: {0}")]
    UnknownContact(String),
    #[error("unknown logical database: {0}")]
    UnknownDatabase(String),
}

/// Loaded once at process startup, then shared read-only through a
/// `RunContext` for the rest of the run. There is deliberately no global
/// singleton here — passing `&ConfigStore` explicitly keeps every
/// dependency visible at the call site and testable with a fake config.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    settings: GlobalSettings,
    databases: BTreeMap<String, DbDescriptor>,
    contacts: BTreeMap<String, Contact>,
}

impl ConfigStore {
    pub fn from_raw(raw: RawConfig) -> Self {
        let databases = raw.databases.into_iter().map(|d| (d.logical_name.clone(), d)).collect();
        let contacts = raw.contacts.into_iter().map(|c| (c.contact_id.clone(), c)).collect();
        Self { settings: raw.settings, databases, contacts }
    }

    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_string(), source })?;
        let raw: RawConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_string(), source: Box::new(source) })?;
        Ok(Self::from_raw(raw))
    }

    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    /// Returns `None` rather than erroring: callers report a configuration
    /// error and the run does not partially proceed, matching the
    /// missing-setting contract.
    pub fn get_setting(&self, name: &str) -> Option<String> {
        match name {
            "report_id" => Some(self.settings.report_id.clone()),
            "delta_qc_sid_field" => Some(self.settings.delta_qc_sid_field.clone()),
            _ => None,
        }
    }

    pub fn get_contact(&self, contact_id: &str) -> Option<&Contact> {
        self.contacts.get(contact_id)
    }

    pub fn get_contacts(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.values()
    }

    pub fn get_db_descriptor(&self, logical_name: &str) -> Result<&DbDescriptor, ConfigError> {
        self.databases.get(logical_name).ok_or_else(|| ConfigError::UnknownDatabase(logical_name.to_string()))
    }

    pub fn require_contact(&self, contact_id: &str) -> Result<&Contact, ConfigError> {
        self.get_contact(contact_id).ok_or_else(|| ConfigError::UnknownContact(contact_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GlobalSettings;

    fn settings() -> GlobalSettings {
        GlobalSettings {
            report_id: "R1".into(),
            build_subdir: "build".into(),
            error_subdir: "error".into(),
            processed_subdir: "processed".into(),
            delta_qc_sid_field: "sid".into(),
            no_bill_codes: vec![],
            no_bill_no_send_codes: vec!["NO_BILL_NO_SEND".into()],
            concurrency_cap: 1,
            history_retry_attempts: 5,
            history_retry_sleep_ms: 100,
        }
    }

    #[test]
    fn missing_setting_returns_none_not_error() {
        let store = ConfigStore::from_raw(RawConfig { settings: settings(), databases: vec![], contacts: vec![] });
        assert!(store.get_setting("nonexistent").is_none());
    }

    #[test]
    fn unknown_database_is_an_error() {
        let store = ConfigStore::from_raw(RawConfig { settings: settings(), databases: vec![], contacts: vec![] });
        assert!(store.get_db_descriptor("sip").is_err());
    }
}
