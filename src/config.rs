#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage_typ: String,
    pub root_dir: String,
    pub object_store_url: String,
    pub object_container: String,
    pub retention_secs: u64,
    pub reaper_interval_secs: u64,
    pub task_timeout_secs: u64,
}
