//! # Prompt storage service
//!
//! A prompt manager that mirrors every mutation into a [`KeyValueStore`].
//!
//! The full state (`prompts` and `sortOrder`) is serialized as JSON under a single
//! key, [`STORAGE_KEY`], after each successful mutating call, so the in-memory
//! collection and the stored record are always equal between calls. On
//! [`open`](PromptStorageService::open) the stored record is loaded first.

use crate::manager::{PromptFilters, PromptManager, SortField, SortOrder};
use crate::prompt::{Prompt, PromptError};
use crate::record::{PromptRecord, TextRecord};
use crate::search;
use crate::store::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const STORAGE_KEY: &str = "promptStorageService";
pub const SCHEMA_VERSION: u32 = 1;

/// Whether durable storage may be used in the current execution context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageMode {
    /// Load from and write to the store.
    #[default]
    Durable,
    /// Never touch the store; the session is purely in-memory.
    Ephemeral,
}

#[derive(Debug, Error)]
pub enum StorageError<E: std::error::Error + 'static> {
    #[error("Store error: {0}")]
    Store(#[source] E),
    #[error("Failed to serialize prompts: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("Stored record under '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },
    #[error("Unsupported schema version {found}, expected {expected}")]
    UnsupportedSchema { found: u32, expected: u32 },
    #[error("Invalid prompt: {0}")]
    InvalidRecord(#[source] PromptError),
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredState<'a, P> {
    schema_version: u32,
    prompts: &'a [P],
    sort_order: SortOrder,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadedState<P> {
    #[serde(default = "default_schema_version")]
    schema_version: u32,
    prompts: Vec<P>,
    #[serde(default)]
    sort_order: SortOrder,
}

pub struct PromptStorageService<S, P = Prompt> {
    store: S,
    mode: StorageMode,
    manager: PromptManager<P>,
}

impl<S, P> PromptStorageService<S, P>
where
    S: KeyValueStore,
    P: PromptRecord + Clone + Serialize + DeserializeOwned,
{
    /// Opens the service over `store`.
    ///
    /// In [`StorageMode::Durable`] the record under [`STORAGE_KEY`] is loaded; if there is
    /// none the service starts empty with ascending order. In [`StorageMode::Ephemeral`]
    /// the store is never read or written.
    ///
    /// # Returns
    ///
    /// * `Ok(PromptStorageService)` - If the record was loaded or absent.
    /// * `StorageError::Corrupt` - If the stored record cannot be parsed. The record is left untouched.
    /// * `StorageError::UnsupportedSchema` - If the record was written by another schema version.
    /// * `StorageError::InvalidRecord` - If a stored prompt breaks a field invariant.
    pub fn open(store: S, mode: StorageMode) -> Result<Self, StorageError<S::Error>> {
        Self::open_with_sort_order(store, mode, SortOrder::default())
    }

    /// Like [`open`](Self::open), but a service that starts empty uses `sort_order`.
    ///
    /// A stored record always keeps its own sort order. Nothing is written on open.
    pub fn open_with_sort_order(
        store: S,
        mode: StorageMode,
        sort_order: SortOrder,
    ) -> Result<Self, StorageError<S::Error>> {
        let loaded = match mode {
            StorageMode::Durable => Self::load(&store)?,
            StorageMode::Ephemeral => {
                warn!("Durable storage unavailable, prompts will only be kept in memory");
                None
            }
        };
        let manager = loaded.unwrap_or_else(|| PromptManager::with_prompts(Vec::new(), sort_order));

        Ok(PromptStorageService { store, mode, manager })
    }

    fn load(store: &S) -> Result<Option<PromptManager<P>>, StorageError<S::Error>> {
        let Some(raw) = store.get(STORAGE_KEY).map_err(StorageError::Store)? else {
            info!("No stored prompts found, starting empty");
            return Ok(None);
        };

        let state: LoadedState<P> = serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
            key: STORAGE_KEY.to_string(),
            source,
        })?;

        if state.schema_version != SCHEMA_VERSION {
            return Err(StorageError::UnsupportedSchema {
                found: state.schema_version,
                expected: SCHEMA_VERSION,
            });
        }

        for prompt in &state.prompts {
            prompt.validate().map_err(StorageError::InvalidRecord)?;
        }

        info!(count = state.prompts.len(), sort_order = %state.sort_order, "Loaded stored prompts");
        Ok(Some(PromptManager::with_prompts(state.prompts, state.sort_order)))
    }

    fn save(&mut self) -> Result<(), StorageError<S::Error>> {
        if self.mode == StorageMode::Ephemeral {
            return Ok(());
        }

        let state = StoredState {
            schema_version: SCHEMA_VERSION,
            prompts: self.manager.prompts(),
            sort_order: self.manager.sort_order(),
        };
        let serialized = serde_json::to_string(&state).map_err(StorageError::Serialization)?;

        debug!(count = self.manager.len(), "Persisting prompts");
        self.store.set(STORAGE_KEY, &serialized).map_err(StorageError::Store)
    }

    /// Applies `change` and persists the result. If persisting fails the change is rolled back.
    fn mutate<R>(&mut self, change: impl FnOnce(&mut PromptManager<P>) -> R) -> Result<R, StorageError<S::Error>> {
        let previous = self.manager.clone();
        let outcome = change(&mut self.manager);

        if let Err(err) = self.save() {
            warn!(error = %err, "Failed to persist prompts, rolling back");
            self.manager = previous;
            return Err(err);
        }
        Ok(outcome)
    }

    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn prompts(&self) -> &[P] {
        self.manager.prompts()
    }

    pub fn len(&self) -> usize {
        self.manager.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manager.is_empty()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.manager.sort_order()
    }

    pub fn get_prompt(&self, id: &str) -> Option<&P> {
        self.manager.get_prompt(id)
    }

    pub fn get_filtered_prompts(&self, filters: &PromptFilters) -> Vec<&P> {
        self.manager.get_filtered_prompts(filters)
    }

    pub fn set_sort_order(&mut self, sort_order: SortOrder) -> Result<(), StorageError<S::Error>> {
        self.mutate(|manager| manager.set_sort_order(sort_order))
    }

    pub fn add_prompt(&mut self, prompt: P) -> Result<(), StorageError<S::Error>> {
        self.mutate(|manager| manager.add_prompt(prompt))
    }

    pub fn remove_prompt(&mut self, prompt: &P) -> Result<usize, StorageError<S::Error>>
    where
        P: PartialEq,
    {
        self.mutate(|manager| manager.remove_prompt(prompt))
    }

    pub fn remove_prompt_by_id(&mut self, id: &str) -> Result<usize, StorageError<S::Error>> {
        self.mutate(|manager| manager.remove_prompt_by_id(id))
    }

    pub fn sort_prompts(&mut self, field: SortField) -> Result<(), StorageError<S::Error>> {
        self.mutate(|manager| manager.sort_prompts(field))
    }

    pub fn clear_prompts(&mut self) -> Result<(), StorageError<S::Error>> {
        self.mutate(|manager| manager.clear_prompts())
    }

    /// Edits the prompt with `id` through its validating setters and persists the result.
    ///
    /// The edit is applied to a copy, so a failing setter leaves the stored prompt unchanged.
    /// Returns `false` if no prompt has that id.
    pub fn update_prompt(
        &mut self,
        id: &str,
        edit: impl FnOnce(&mut P) -> Result<(), PromptError>,
    ) -> Result<bool, StorageError<S::Error>> {
        let Some(current) = self.manager.get_prompt(id) else {
            return Ok(false);
        };

        let mut edited = current.clone();
        edit(&mut edited).map_err(StorageError::InvalidRecord)?;

        self.mutate(|manager| {
            if let Some(slot) = manager.get_prompt_mut(id) {
                *slot = edited;
            }
        })?;
        Ok(true)
    }
}

impl<S, P> PromptStorageService<S, P>
where
    S: KeyValueStore,
    P: TextRecord,
{
    pub fn search_prompts(&self, term: &str) -> Vec<&P> {
        search::search(self.manager.prompts(), term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{AnyTextPrompt, PromptResult};
    use crate::store::{FileStore, MemoryStore};
    use crate::test_support::{dummy_base, dummy_multi_modal, dummy_text};
    use std::fmt;
    use tempfile::TempDir;

    fn open_memory(store: MemoryStore) -> PromptStorageService<MemoryStore> {
        PromptStorageService::open(store, StorageMode::Durable).expect("Failed to open storage service")
    }

    fn stored_json(service: &PromptStorageService<MemoryStore>) -> serde_json::Value {
        let raw = service.store().get(STORAGE_KEY).unwrap().expect("Expected a stored record");
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn test_open_empty_store() {
        let service = open_memory(MemoryStore::new());

        assert!(service.is_empty());
        assert_eq!(SortOrder::Ascending, service.sort_order());
        assert_eq!(StorageMode::Durable, service.mode());
        // Opening alone does not write anything
        assert!(service.store().get(STORAGE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_add_prompt_persists_snapshot() {
        let mut service = open_memory(MemoryStore::new());
        let prompt = Prompt::from(dummy_text("Text-to-Text", "Roses are red.", "Violets are blue."));

        service.add_prompt(prompt.clone()).unwrap();

        let json = stored_json(&service);
        assert_eq!(1, json["schemaVersion"]);
        assert_eq!("Ascending", json["sortOrder"]);
        assert_eq!(prompt.id(), json["prompts"][0]["id"]);
        assert_eq!("text", json["prompts"][0]["kind"]);
        assert_eq!("Roses are red.", json["prompts"][0]["input"]);
    }

    #[test]
    fn test_round_trip_through_fresh_service() {
        let mut service = open_memory(MemoryStore::new());
        let text = Prompt::from(dummy_text("Text-to-Text", "Roses are red.", ""));
        let multi = Prompt::from(dummy_multi_modal(2));
        let base = Prompt::from(dummy_base("Text-to-Text"));
        service.add_prompt(text.clone()).unwrap();
        service.add_prompt(multi.clone()).unwrap();
        service.add_prompt(base.clone()).unwrap();
        service.set_sort_order(SortOrder::Descending).unwrap();

        let reopened = open_memory(service.store().clone());

        assert_eq!(vec![text, multi, base], reopened.prompts());
        assert_eq!(SortOrder::Descending, reopened.sort_order());
    }

    #[test]
    fn test_default_sort_order_only_applies_to_new_store() {
        let service: PromptStorageService<MemoryStore> =
            PromptStorageService::open_with_sort_order(MemoryStore::new(), StorageMode::Durable, SortOrder::Descending)
                .unwrap();
        assert_eq!(SortOrder::Descending, service.sort_order());
        assert!(service.store().get(STORAGE_KEY).unwrap().is_none());

        let mut service = open_memory(MemoryStore::new());
        service.set_sort_order(SortOrder::Descending).unwrap();
        service.clear_prompts().unwrap();

        let reopened: PromptStorageService<MemoryStore> = PromptStorageService::open_with_sort_order(
            service.store().clone(),
            StorageMode::Durable,
            SortOrder::Ascending,
        )
        .unwrap();
        assert!(reopened.is_empty());
        assert_eq!(SortOrder::Descending, reopened.sort_order());
    }

    #[test]
    fn test_round_trip_keeps_normalized_result() {
        let mut service = open_memory(MemoryStore::new());
        let mut base = dummy_base("Text-to-Text");
        base.set_result(PromptResult::Other("Success".to_string())).unwrap();
        let prompt = Prompt::from(base);
        service.add_prompt(prompt.clone()).unwrap();

        let reopened = open_memory(service.store().clone());
        assert_eq!(vec![prompt], reopened.prompts());
        assert_eq!(&PromptResult::Success, reopened.prompts()[0].base().result());
    }

    #[test]
    fn test_round_trip_through_file_store() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = Prompt::from(dummy_multi_modal(1));

        let mut service: PromptStorageService<FileStore> =
            PromptStorageService::open(FileStore::new(temp_dir.path()), StorageMode::Durable).unwrap();
        service.add_prompt(prompt.clone()).unwrap();

        let reopened: PromptStorageService<FileStore> =
            PromptStorageService::open(FileStore::new(temp_dir.path()), StorageMode::Durable).unwrap();
        assert_eq!(vec![prompt], reopened.prompts());
        assert!(temp_dir.path().join("promptStorageService.json").exists());
    }

    #[test]
    fn test_removals_are_persisted() {
        let mut service = open_memory(MemoryStore::new());
        let first = Prompt::from(dummy_text("Text-to-Text", "first", ""));
        let second = Prompt::from(dummy_text("Text-to-Text", "second", ""));
        service.add_prompt(first.clone()).unwrap();
        service.add_prompt(second.clone()).unwrap();

        assert_eq!(1, service.remove_prompt(&first).unwrap());
        assert_eq!(1, stored_json(&service)["prompts"].as_array().unwrap().len());

        assert_eq!(1, service.remove_prompt_by_id(second.id()).unwrap());
        assert!(service.is_empty());
        assert!(stored_json(&service)["prompts"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_sort_prompts_is_persisted() {
        let mut service = open_memory(MemoryStore::new());
        let b = Prompt::from(dummy_base("b"));
        let a = Prompt::from(dummy_base("a"));
        service.add_prompt(b.clone()).unwrap();
        service.add_prompt(a.clone()).unwrap();

        service.sort_prompts(SortField::Type).unwrap();

        let reopened = open_memory(service.store().clone());
        assert_eq!(vec![a, b], reopened.prompts());
    }

    #[test]
    fn test_clear_prompts_empties_memory_and_record() {
        let mut service = open_memory(MemoryStore::new());
        service.add_prompt(Prompt::from(dummy_multi_modal(1))).unwrap();
        service.add_prompt(Prompt::from(dummy_base("Text-to-Text"))).unwrap();

        service.clear_prompts().unwrap();

        assert!(service.is_empty());
        assert!(stored_json(&service)["prompts"].as_array().unwrap().is_empty());
        assert!(open_memory(service.store().clone()).is_empty());
    }

    #[test]
    fn test_update_prompt() {
        let mut service = open_memory(MemoryStore::new());
        let prompt = Prompt::from(dummy_base("Text-to-Text"));
        service.add_prompt(prompt.clone()).unwrap();

        let updated = service
            .update_prompt(prompt.id(), |p| p.base_mut().set_result(PromptResult::Failure))
            .unwrap();
        assert!(updated);
        assert_eq!("Failure", stored_json(&service)["prompts"][0]["result"]);

        // The model is set before the version fails, yet nothing is kept
        let result = service.update_prompt(prompt.id(), |p| {
            p.base_mut().set_model("GPT")?;
            p.base_mut().set_version("")
        });
        match result {
            Err(StorageError::InvalidRecord(PromptError::InvalidPrompt(field))) => assert_eq!("version", field),
            _ => panic!("Expected InvalidRecord error"),
        }
        assert_eq!("Claude", service.prompts()[0].model());
        assert_eq!("Claude", stored_json(&service)["prompts"][0]["model"]);

        assert!(!service.update_prompt("missing", |_| Ok(())).unwrap());
    }

    #[test]
    fn test_ephemeral_mode_never_touches_store() {
        let mut seeded = MemoryStore::new();
        seeded.set(STORAGE_KEY, "not json").unwrap();

        let mut service: PromptStorageService<MemoryStore> =
            PromptStorageService::open(seeded, StorageMode::Ephemeral).expect("Ephemeral mode skips loading");
        assert!(service.is_empty());

        service.add_prompt(Prompt::from(dummy_base("Text-to-Text"))).unwrap();
        service.clear_prompts().unwrap();
        service.add_prompt(Prompt::from(dummy_base("Text-to-Text"))).unwrap();

        assert_eq!(1, service.len());
        assert_eq!(Some("not json".to_string()), service.store().get(STORAGE_KEY).unwrap());
    }

    #[test]
    fn test_corrupt_record_fails_to_open() {
        let mut store = MemoryStore::new();
        store.set(STORAGE_KEY, "{\"prompts\": [").unwrap();

        match PromptStorageService::<MemoryStore>::open(store, StorageMode::Durable) {
            Err(StorageError::Corrupt { key, .. }) => assert_eq!(STORAGE_KEY, key),
            Err(e) => panic!("Expected Corrupt error, got {}", e),
            Ok(_) => panic!("Expected Corrupt error"),
        }
    }

    #[test]
    fn test_unsupported_schema_fails_to_open() {
        let mut store = MemoryStore::new();
        store
            .set(STORAGE_KEY, r#"{"schemaVersion": 2, "prompts": [], "sortOrder": "Ascending"}"#)
            .unwrap();

        match PromptStorageService::<MemoryStore>::open(store, StorageMode::Durable) {
            Err(StorageError::UnsupportedSchema { found, expected }) => {
                assert_eq!(2, found);
                assert_eq!(SCHEMA_VERSION, expected);
            }
            _ => panic!("Expected UnsupportedSchema error"),
        }
    }

    #[test]
    fn test_invalid_stored_prompt_fails_to_open() {
        let mut store = MemoryStore::new();
        let record = r#"{"prompts": [{"kind": "base", "id": "1", "model": "", "version": "1",
            "type": "Text-to-Text", "date": "2025-01-23T00:00:00Z", "result": "Success"}]}"#;
        store.set(STORAGE_KEY, record).unwrap();

        match PromptStorageService::<MemoryStore>::open(store, StorageMode::Durable) {
            Err(StorageError::InvalidRecord(PromptError::InvalidPrompt(field))) => assert_eq!("model", field),
            _ => panic!("Expected InvalidRecord error"),
        }
    }

    #[test]
    fn test_record_without_schema_version_or_order() {
        let mut store = MemoryStore::new();
        let record = r#"{"prompts": [{"kind": "text", "id": "abc", "model": "Claude", "version": "Sonnet 3.5",
            "type": "Text-to-Text", "date": "2025-01-23T00:00:00Z", "result": "Successful",
            "input": "Roses are red.", "output": ""}]}"#;
        store.set(STORAGE_KEY, record).unwrap();

        let service = open_memory(store);
        assert_eq!(SortOrder::Ascending, service.sort_order());
        assert_eq!("abc", service.prompts()[0].id());
        assert_eq!(&PromptResult::Other("Successful".to_string()), service.prompts()[0].result());
    }

    #[test]
    fn test_text_service_search() {
        let mut service: PromptStorageService<MemoryStore, AnyTextPrompt> =
            PromptStorageService::open(MemoryStore::new(), StorageMode::Durable).unwrap();
        let roses = AnyTextPrompt::from(dummy_multi_modal(0));
        service.add_prompt(roses.clone()).unwrap();
        service.add_prompt(AnyTextPrompt::from(dummy_text("Text-to-Text", "Sugar is sweet.", ""))).unwrap();

        assert_eq!(vec![&roses], service.search_prompts("ROSES"));
    }

    #[derive(Debug)]
    struct BrokenStoreError;

    impl fmt::Display for BrokenStoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "store is read-only")
        }
    }

    impl std::error::Error for BrokenStoreError {}

    #[derive(Default)]
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        type Error = BrokenStoreError;

        fn get(&self, _key: &str) -> Result<Option<String>, BrokenStoreError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), BrokenStoreError> {
            Err(BrokenStoreError)
        }

        fn remove(&mut self, _key: &str) -> Result<(), BrokenStoreError> {
            Err(BrokenStoreError)
        }
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let mut service: PromptStorageService<ReadOnlyStore> =
            PromptStorageService::open(ReadOnlyStore, StorageMode::Durable).unwrap();

        match service.add_prompt(Prompt::from(dummy_base("Text-to-Text"))) {
            Err(StorageError::Store(BrokenStoreError)) => {}
            _ => panic!("Expected Store error"),
        }
        assert!(service.is_empty());

        assert!(service.set_sort_order(SortOrder::Descending).is_err());
        assert_eq!(SortOrder::Ascending, service.sort_order());
    }
}
