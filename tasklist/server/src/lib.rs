pub mod config {
    use serde::Deserialize;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::storage::{BlobStore, FsBlobStore, InMemoryBlobStore};
    use crate::task::repository::{RetryPolicy, WriteMode};

    /// Which blob backend holds the task document.
    #[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum StorageBackend {
        #[default]
        Fs,
        Memory,
    }

    #[derive(Deserialize, Debug, Clone)]
    pub struct Config {
        #[serde(default = "default_port")]
        pub port: u16,
        #[serde(default = "default_cors_origin")]
        pub cors_origin: String,
        #[serde(default)]
        pub require_auth: bool,
        #[serde(default)]
        pub storage_backend: StorageBackend,
        #[serde(default = "default_storage_root")]
        pub storage_root: PathBuf,
        #[serde(default = "default_storage_container")]
        pub storage_container: String,
        #[serde(default = "default_storage_key")]
        pub storage_key: String,
        #[serde(default)]
        pub write_mode: WriteMode,
        #[serde(default = "default_storage_retries")]
        pub storage_retries: u32,
        #[serde(default = "default_storage_retry_delay_ms")]
        pub storage_retry_delay_ms: u64,
    }

    impl Config {
        /// Loads configuration from `TASKLIST_`-prefixed environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_source(config::Environment::with_prefix("TASKLIST").try_parsing(true))
        }

        /// Loads configuration from a single source, filling in defaults.
        pub fn from_source<S>(source: S) -> anyhow::Result<Self>
        where
            S: config::Source + Send + Sync + 'static,
        {
            let settings = config::Config::builder().add_source(source).build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }

        pub fn retry_policy(&self) -> RetryPolicy {
            RetryPolicy {
                max_retries: self.storage_retries,
                delay: Duration::from_millis(self.storage_retry_delay_ms),
            }
        }

        /// Builds the blob store selected by `storage_backend`.
        pub fn blob_store(&self) -> Arc<dyn BlobStore> {
            match self.storage_backend {
                StorageBackend::Fs => Arc::new(FsBlobStore::new(
                    &self.storage_root,
                    &self.storage_container,
                )),
                StorageBackend::Memory => Arc::new(InMemoryBlobStore::new()),
            }
        }
    }

    impl Default for Config {
        fn default() -> Self {
            Self {
                port: default_port(),
                cors_origin: default_cors_origin(),
                require_auth: false,
                storage_backend: StorageBackend::default(),
                storage_root: default_storage_root(),
                storage_container: default_storage_container(),
                storage_key: default_storage_key(),
                write_mode: WriteMode::default(),
                storage_retries: default_storage_retries(),
                storage_retry_delay_ms: default_storage_retry_delay_ms(),
            }
        }
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_cors_origin() -> String {
        "http://127.0.0.1:5500".to_string()
    }

    fn default_storage_root() -> PathBuf {
        PathBuf::from("./data")
    }

    fn default_storage_container() -> String {
        "tasks".to_string()
    }

    fn default_storage_key() -> String {
        "tasks.json".to_string()
    }

    fn default_storage_retries() -> u32 {
        2
    }

    fn default_storage_retry_delay_ms() -> u64 {
        50
    }

}

pub mod auth;
pub mod storage;
pub mod task;
pub mod web;
