//! # promptlog Core
//!
//! This crate provides the core functionality for promptlog, a record keeper for
//! interactions with generative AI models.
//!
//! Each interaction is a prompt: the model and version that handled it, a free-form
//! type label, the date, the outcome, and for text prompts the input and output text
//! plus any attachments. Prompts are collected in managers that add, remove, filter,
//! sort and search them, and a storage service persists a manager into a key-value store.
//!
//! # Modules
//!
//! - [`attachment`] - Typed payloads attached to multimodal prompts
//! - [`prompt`] - Prompt entities and validation
//! - [`record`] - Capability traits the managers are generic over
//! - [`manager`] - In-memory prompt managers with filter, sort and search
//! - [`search`] - Free-text matching over prompt fields
//! - [`store`] - Key-value store trait with memory and file implementations
//! - [`storage_service`] - A prompt manager persisted into a key-value store
//!
//! # Examples
//!
//! ```rust
//! use chrono::Utc;
//! use promptlog_core::prompt::{Prompt, PromptBase, PromptResult, TextPrompt};
//! use promptlog_core::storage_service::{PromptStorageService, StorageMode};
//! use promptlog_core::store::MemoryStore;
//!
//! let base = PromptBase::new("Claude", "Sonnet 3.5", "Text-to-Text", Utc::now(), PromptResult::Success)
//!     .expect("Failed to create prompt");
//! let prompt = TextPrompt::new(base, "Roses are red.", "Violets are blue.").expect("Failed to create prompt");
//!
//! let mut service: PromptStorageService<MemoryStore> =
//!     PromptStorageService::open(MemoryStore::new(), StorageMode::Durable).expect("Failed to open storage");
//! service.add_prompt(Prompt::from(prompt)).expect("Failed to save prompt");
//!
//! let reopened: PromptStorageService<MemoryStore> =
//!     PromptStorageService::open(service.store().clone(), StorageMode::Durable).expect("Failed to open storage");
//! assert_eq!(1, reopened.len());
//! ```

pub mod attachment;
pub mod manager;
pub mod prompt;
pub mod record;
pub mod search;
pub mod storage_service;
pub mod store;

#[cfg(test)]
mod test_support;
