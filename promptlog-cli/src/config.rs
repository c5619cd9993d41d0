use crate::constants::PROMPTLOG_CLI;
use confy::ConfyError;
use promptlog_core::manager::SortOrder;
use promptlog_core::storage_service::{PromptStorageService, StorageMode};
use promptlog_core::store::FileStore;
use serde::{Deserialize, Serialize};
use std::env::home_dir;
use std::path::PathBuf;

#[derive(Serialize, Deserialize)]
pub struct PromptlogCliConfig {
    pub store_path: String,
    #[serde(default)]
    pub default_sort_order: SortOrder,
}

impl Default for PromptlogCliConfig {
    fn default() -> Self {
        let store_path = home_dir()
            .map(|p| p.join("promptlog").join("store"))
            .unwrap_or_else(|| PathBuf::from("promptlog/store"));

        Self {
            store_path: store_path.display().to_string(),
            default_sort_order: SortOrder::Ascending,
        }
    }
}

pub fn load_config() -> PromptlogCliConfig {
    let config: Result<PromptlogCliConfig, ConfyError> = confy::load(PROMPTLOG_CLI, None);
    match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Problem loading config ({}). Exiting...", e);
            std::process::exit(exitcode::CONFIG);
        }
    }
}

/// Opens the storage service over the configured store directory, or `store_path` when given.
pub fn open_service(
    config: &PromptlogCliConfig,
    store_path: Option<String>,
    mode: StorageMode,
) -> anyhow::Result<PromptStorageService<FileStore>> {
    let base_path = PathBuf::from(store_path.unwrap_or_else(|| config.store_path.clone()));
    let service = PromptStorageService::open_with_sort_order(FileStore::new(base_path), mode, config.default_sort_order)?;
    Ok(service)
}
