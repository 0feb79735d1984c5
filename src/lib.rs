//! Wires the ten pipeline components into one running process: loads
//! config, stands up the file-backed db pool, builds the resolver/index
//! builder/transmit orchestrator/hook registry for each contact, and
//! drives the whole thing through the main scheduler.

pub mod cli;
pub mod filedb;
pub mod hooks;
pub mod repos;
pub mod worker;

use std::sync::Arc;

use camino::Utf8Path;

use asap_config::ConfigStore;
use asap_history::DocumentHistoryLog;
use asap_index::IndexBuilder;
use asap_ports::clock::SystemClock;
use asap_scheduler::{CancellationToken, ContactWorker, MainScheduler, RunReport};
use asap_transmit::{Reconciler, TransmitOrchestrator};
use asap_viable::{Acord103Repo, ViableCaseResolver};

use filedb::FileDbPool;
use hooks::HookRegistry;
use repos::{FileAcord103Source, FileAcord121Source, FileDocumentLookup, FileLimsSource, FileRepos};
use worker::{PipelineContactWorker, ReleasedCaseSource};

/// Everything a run needs beyond `ConfigStore`, built once from
/// `$ASAP_HOME` and shared by every per-contact worker. There is one
/// `IndexBuilder`/`TransmitOrchestrator`/`ViableCaseResolver` for the
/// whole run: none of them hold per-contact state, only per-contact
/// arguments are threaded through their methods.
pub struct Pipeline {
    config: Arc<ConfigStore>,
    pool: Arc<FileDbPool>,
    reconciler: Arc<Reconciler>,
    scheduler: MainScheduler,
}

impl Pipeline {
    /// Builds the full dependency graph against a file-backed db pool
    /// rooted at `asap_home/db`, and a single demo-carrier hook
    /// registration good enough to drive a contact end to end without a
    /// real carrier crate configured.
    pub fn bootstrap(config: ConfigStore, asap_home: &Utf8Path) -> Self {
        let config = Arc::new(config);
        let pool = Arc::new(FileDbPool::new(asap_home.join("db")));

        let lims = FileRepos {
            lims: pool.cursor_for("snip") as Arc<dyn asap_ports::db::Cursor>,
            acord: pool.cursor_for("acord") as Arc<dyn asap_ports::db::Cursor>,
            case_qc: pool.cursor_for("case_qc") as Arc<dyn asap_ports::db::Cursor>,
            delta_qc: pool.cursor_for("delta_qc") as Arc<dyn asap_ports::db::Cursor>,
        };
        let repos = Arc::new(lims);

        let resolver = Arc::new(ViableCaseResolver::new(repos.clone(), repos.clone(), repos.clone(), repos.clone(), repos.clone(), repos.clone()));

        let lims_source = Arc::new(FileLimsSource { snip: pool.cursor_for("snip"), sip: pool.cursor_for("sip") });
        let acord121_source = Arc::new(FileAcord121Source { acord: pool.cursor_for("acord") });

        let history = Arc::new(DocumentHistoryLog::new(
            pool.cursor_for("xmit") as Arc<dyn asap_ports::db::Cursor>,
            Arc::new(SystemClock),
            config.settings().history_retry_attempts,
            config.settings().history_retry_sleep_ms,
        ));
        let transmit = Arc::new(TransmitOrchestrator::new(history.clone()));
        let reconciler = Arc::new(Reconciler::new(history.clone()));

        let worker: Arc<dyn ContactWorker> = Arc::new(PerContactDispatchWorker {
            config: config.clone(),
            pool: pool.clone(),
            resolver,
            lims_source,
            acord121_source,
            transmit,
            repos,
            history,
        });

        let scheduler = MainScheduler::new(config.clone(), worker);
        Self { config, pool, reconciler, scheduler }
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub async fn run(&self, cancel: CancellationToken) -> RunReport {
        self.scheduler.run(cancel).await
    }

    /// Ingests a carrier reconciliation feed (`clientId|timestamp|imageFileName`
    /// lines) against document history, resolving each file name back to
    /// its owning `(sid, documentId)` through the Delta-QC document table.
    pub async fn ingest_recon_feed(&self, feed_text: &str, contact_id: &str) -> asap_transmit::ReconcileReport {
        let lookup = FileDocumentLookup { delta_qc_dir: self.pool.cursor_dir("delta_qc") };
        self.reconciler.ingest_feed(feed_text, &lookup, contact_id).await
    }
}

/// Builds a fresh [`IndexBuilder`] and [`HookRegistry`] per `run_once`
/// call, since both depend on the contact's own
/// `acord103Dir`/`processedDocDir`/`indexDir` layout; everything else
/// (resolver, transmit orchestrator) is shared across the whole run.
struct PerContactDispatchWorker {
    config: Arc<ConfigStore>,
    pool: Arc<FileDbPool>,
    resolver: Arc<ViableCaseResolver>,
    lims_source: Arc<FileLimsSource>,
    acord121_source: Arc<FileAcord121Source>,
    transmit: Arc<TransmitOrchestrator>,
    repos: Arc<FileRepos>,
    history: Arc<DocumentHistoryLog>,
}

#[async_trait::async_trait]
impl ContactWorker for PerContactDispatchWorker {
    async fn run_once(&self, contact: &asap_model::Contact) -> asap_scheduler::WorkerOutcome {
        let acord103_source = Arc::new(FileAcord103Source { acord103_dir: contact.acord103_dir.clone() });
        let index_builder = Arc::new(IndexBuilder::new(self.lims_source.clone(), self.acord121_source.clone(), acord103_source));

        let processed_dir = contact.processed_doc_dir(&self.config.settings().processed_subdir);
        let hooks = Arc::new(HookRegistry::with_builtins(contact.acord103_dir.clone(), processed_dir, contact.index_dir.clone()));

        let released = ReleasedCaseSource::new(self.pool.cursor_for("case_qc") as Arc<dyn asap_ports::db::Cursor>);
        let documents = repos::DocumentHydrator { delta_qc: self.pool.cursor_for("delta_qc") as Arc<dyn asap_ports::db::Cursor> };

        let acord103_repo = self.repos.clone() as Arc<dyn Acord103Repo>;
        let worker = PipelineContactWorker::new(
            released,
            self.resolver.clone(),
            documents,
            index_builder,
            self.transmit.clone(),
            hooks,
            acord103_repo,
            self.history.clone(),
        );
        worker.run_once(contact).await
    }
}
