use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Listening host
    #[arg(long, env = "DEPOT_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Listening port
    #[arg(short, long, env = "DEPOT_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Storage backend type
    #[arg(short, long, env = "DEPOT_STORAGE", default_value = "FILESYSTEM")]
    pub storage: String,

    /// Root directory for filesystem storage
    #[arg(long, env = "DEPOT_ROOTDIR", default_value = "uploads")]
    pub root: String,

    /// Base URL of the remote object store (OBJECT storage only)
    #[arg(long, env = "DEPOT_OBJECT_STORE_URL", default_value = "")]
    pub object_store_url: String,

    /// Container holding uploaded objects (OBJECT storage only)
    #[arg(long, env = "DEPOT_OBJECT_CONTAINER", default_value = "uploads")]
    pub object_container: String,

    /// How long terminal sessions are kept before the reaper removes them
    #[arg(long, env = "DEPOT_RETENTION_SECONDS", default_value_t = 24 * 60 * 60)]
    pub retention_secs: u64,

    /// How often the session reaper sweeps
    #[arg(long, env = "DEPOT_REAPER_INTERVAL_SECONDS", default_value_t = 60 * 60)]
    pub reaper_interval_secs: u64,

    /// Per-file upload timeout for background batches
    #[arg(long, env = "DEPOT_TASK_TIMEOUT_SECONDS", default_value_t = 30)]
    pub task_timeout_secs: u64,
}
