use metrics_exporter_prometheus::PrometheusHandle;
use offer_decider::config::StorageConfig;
use offer_decider::decision::ClockTime;
use offer_decider::service::DeciderService;
use offer_decider::storage::{FileStore, MemoryStore};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Settings on disk, offer drafts for the lifetime of the process.
pub(crate) type LiveService = DeciderService<FileStore, MemoryStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn build_service(storage: &StorageConfig) -> Arc<LiveService> {
    let persistent = Arc::new(FileStore::in_dir(&storage.data_dir));
    let session = Arc::new(MemoryStore::new());
    Arc::new(DeciderService::new(persistent, session))
}

/// Clap value parser accepting only valid `HH:MM` times.
pub(crate) fn parse_clock(raw: &str) -> Result<String, String> {
    ClockTime::parse(raw)
        .map(|_| raw.to_string())
        .map_err(|err| err.to_string())
}
