//! Binds each contact's `carrierHookId` to a concrete `IndexHooks` +
//! `TransmitHooks` pair, built once at startup — a registry lookup, never
//! runtime class metaprogramming, per the hook contract's own docs.

use std::collections::BTreeMap;
use std::sync::Arc;

use asap_carrier_demo::{DemoIndexHooks, DemoTransmitHooks};
use asap_index::hooks::IndexHooks;
use asap_index::DefaultIndexHooks;
use asap_model::Contact;
use asap_transmit::TransmitHooks;

/// The pickup-directory transport the workspace ships with out of the
/// box; carriers with a real FTP/SFTP/PGP stack register their own id and
/// hook pair instead.
pub const DEMO_CARRIER_HOOK_ID: &str = "demo";

struct DefaultTransmitHooks;

#[async_trait::async_trait]
impl TransmitHooks for DefaultTransmitHooks {
    async fn stage_indexed_case(&self, _case: &asap_model::Case, xmit_dir: &camino::Utf8Path, _is_first_transmit: bool, _is_full_transmit: bool) -> asap_transmit::HookOutcome {
        match std::fs::create_dir_all(xmit_dir) {
            Ok(()) => asap_transmit::HookOutcome::Ok,
            Err(e) => asap_transmit::HookOutcome::Failed(e.to_string()),
        }
    }

    async fn transmit_staged_cases(&self, _xmit_dir: &camino::Utf8Path) -> asap_transmit::HookOutcome {
        asap_transmit::HookOutcome::Ok
    }
}

pub struct HookRegistry {
    index_hooks: BTreeMap<String, Arc<dyn IndexHooks>>,
    transmit_hooks: BTreeMap<String, Arc<dyn TransmitHooks>>,
}

impl HookRegistry {
    /// Registers the demo carrier under [`DEMO_CARRIER_HOOK_ID`] plus the
    /// inert defaults under `"default"`. A deployment with real carrier
    /// crates extends this with its own `register` calls before handing
    /// the registry to the worker.
    pub fn with_builtins(acord103_dir: Option<camino::Utf8PathBuf>, processed_doc_dir: camino::Utf8PathBuf, index_dir: camino::Utf8PathBuf) -> Self {
        let mut registry = Self { index_hooks: BTreeMap::new(), transmit_hooks: BTreeMap::new() };
        registry.register("default", Arc::new(DefaultIndexHooks), Arc::new(DefaultTransmitHooks));
        registry.register(DEMO_CARRIER_HOOK_ID, Arc::new(DemoIndexHooks), Arc::new(DemoTransmitHooks::new(acord103_dir, processed_doc_dir, index_dir)));
        registry
    }

    pub fn register(&mut self, carrier_hook_id: &str, index_hooks: Arc<dyn IndexHooks>, transmit_hooks: Arc<dyn TransmitHooks>) {
        self.index_hooks.insert(carrier_hook_id.to_string(), index_hooks);
        self.transmit_hooks.insert(carrier_hook_id.to_string(), transmit_hooks);
    }

    /// Falls back to `"default"` for an unregistered hook id rather than
    /// panicking: a misconfigured contact is held every run, not a crash.
    pub fn index_hooks(&self, contact: &Contact) -> Arc<dyn IndexHooks> {
        self.index_hooks
            .get(&contact.carrier_hook_id)
            .or_else(|| self.index_hooks.get("default"))
            .cloned()
            .expect("\"default\" hook id always registered by with_builtins")
    }

    pub fn transmit_hooks(&self, contact: &Contact) -> Arc<dyn TransmitHooks> {
        self.transmit_hooks
            .get(&contact.carrier_hook_id)
            .or_else(|| self.transmit_hooks.get("default"))
            .cloned()
            .expect("\"default\" hook id always registered by with_builtins")
    }
}
