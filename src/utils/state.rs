use std::sync::Arc;
use std::time::Duration;

use tokio_util::task::TaskTracker;

use crate::config::Config;
use crate::session::Orchestrator;
use crate::session::progress::ProgressChannel;
use crate::session::store::SessionStore;
use crate::storage::Storage;
use crate::storage::driver::filesystem::FilesystemStorage;
use crate::storage::driver::object::ObjectStorage;

const PROGRESS_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub store: Arc<SessionStore>,
    pub progress: ProgressChannel,
    pub orchestrator: Orchestrator,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, tracker: TaskTracker) -> Self {
        let storage: Arc<dyn Storage> = match config.storage_typ.as_str() {
            "OBJECT" => Arc::new(ObjectStorage::new(
                &config.object_store_url,
                &config.object_container,
            )),
            _ => Arc::new(FilesystemStorage::new(&config.root_dir)),
        };

        let store = Arc::new(SessionStore::new());
        let progress = ProgressChannel::new(PROGRESS_CHANNEL_CAPACITY);
        let orchestrator = Orchestrator::new(
            store.clone(),
            storage.clone(),
            progress.clone(),
            tracker,
            Duration::from_secs(config.task_timeout_secs),
        );

        AppState {
            storage,
            store,
            progress,
            orchestrator,
            config: Arc::new(config),
        }
    }
}
