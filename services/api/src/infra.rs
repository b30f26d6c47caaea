use gradebook::config::{StoreBackend, StoreConfig};
use gradebook::submissions::{
    MemoryRecordStore, RecordStore, SqliteRecordStore, StoreError, SubmissionService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) type SharedStore = Arc<dyn RecordStore>;
pub(crate) type SharedService = Arc<SubmissionService<dyn RecordStore>>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Opens the process-wide record store once; requests share it through the service.
pub(crate) fn open_store(config: &StoreConfig) -> Result<SharedStore, StoreError> {
    match config.backend {
        StoreBackend::Sqlite => {
            let store = SqliteRecordStore::open(&config.database_path, config.busy_timeout)?;
            info!(path = %config.database_path.display(), "using sqlite record store");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("using in-memory record store; submissions are lost on restart");
            Ok(Arc::new(MemoryRecordStore::default()))
        }
    }
}

pub(crate) fn submission_service(store: SharedStore, config: &StoreConfig) -> SharedService {
    Arc::new(SubmissionService::new(store, config.request_timeout))
}
