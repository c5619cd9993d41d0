//! # Prompt managers
//!
//! In-memory collections of prompts.
//!
//! - [`PromptManager`] keeps prompts in insertion order and supports add, remove, filter and sort.
//! - [`TextPromptManager`] restricts the collection to text prompts and adds free-text search.

use crate::prompt::{AnyTextPrompt, Prompt, PromptError, PromptResult};
use crate::record::{PromptRecord, TextRecord};
use crate::search;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            _ => Err(PromptError::InvalidSortOrder(s.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => f.write_str("Ascending"),
            SortOrder::Descending => f.write_str("Descending"),
        }
    }
}

/// The prompt field to sort on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Model,
    Version,
    Type,
    Date,
    Result,
}

impl FromStr for SortField {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(SortField::Id),
            "model" => Ok(SortField::Model),
            "version" => Ok(SortField::Version),
            "type" => Ok(SortField::Type),
            "date" => Ok(SortField::Date),
            "result" => Ok(SortField::Result),
            _ => Err(PromptError::InvalidSortField(s.to_string())),
        }
    }
}

impl SortField {
    fn compare<P: PromptRecord>(self, a: &P, b: &P) -> Ordering {
        match self {
            SortField::Id => a.id().cmp(b.id()),
            SortField::Model => a.model().cmp(b.model()),
            SortField::Version => a.version().cmp(b.version()),
            SortField::Type => a.prompt_type().cmp(b.prompt_type()),
            SortField::Date => a.date().cmp(&b.date()),
            SortField::Result => a.result().as_str().cmp(b.result().as_str()),
        }
    }
}

/// Filters for [`PromptManager::get_filtered_prompts`].
///
/// Every `Some` field must match exactly; `None` fields match anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptFilters {
    pub model: Option<String>,
    pub version: Option<String>,
    pub prompt_type: Option<String>,
    pub result: Option<PromptResult>,
}

impl PromptFilters {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn prompt_type(mut self, prompt_type: impl Into<String>) -> Self {
        self.prompt_type = Some(prompt_type.into());
        self
    }

    pub fn result(mut self, result: impl Into<PromptResult>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn matches<P: PromptRecord>(&self, prompt: &P) -> bool {
        self.model.as_deref().is_none_or(|model| prompt.model() == model)
            && self.version.as_deref().is_none_or(|version| prompt.version() == version)
            && self.prompt_type.as_deref().is_none_or(|prompt_type| prompt.prompt_type() == prompt_type)
            && self.result.as_ref().is_none_or(|result| prompt.result().as_str() == result.as_str())
    }
}

/// An ordered, in-memory collection of prompts.
#[derive(Debug, Clone)]
pub struct PromptManager<P = Prompt> {
    prompts: Vec<P>,
    sort_order: SortOrder,
}

impl<P> Default for PromptManager<P> {
    fn default() -> Self {
        PromptManager {
            prompts: Vec::new(),
            sort_order: SortOrder::default(),
        }
    }
}

impl<P: PromptRecord> PromptManager<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a manager around an existing collection, keeping its order.
    pub fn with_prompts(prompts: Vec<P>, sort_order: SortOrder) -> Self {
        PromptManager { prompts, sort_order }
    }

    pub fn prompts(&self) -> &[P] {
        &self.prompts
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Sets the order used by the next [`sort_prompts`](Self::sort_prompts) call.
    /// The current collection is not re-sorted.
    pub fn set_sort_order(&mut self, sort_order: SortOrder) {
        self.sort_order = sort_order;
    }

    pub fn add_prompt(&mut self, prompt: P) {
        debug!(id = prompt.id(), kind = %prompt.kind(), "Adding prompt");
        self.prompts.push(prompt);
    }

    /// Removes every entry equal to `prompt` and returns how many were removed.
    pub fn remove_prompt(&mut self, prompt: &P) -> usize
    where
        P: PartialEq,
    {
        let before = self.prompts.len();
        self.prompts.retain(|p| p != prompt);
        let removed = before - self.prompts.len();
        debug!(id = prompt.id(), removed, "Removed prompt");
        removed
    }

    /// Removes every entry whose id is `id` and returns how many were removed.
    pub fn remove_prompt_by_id(&mut self, id: &str) -> usize {
        let before = self.prompts.len();
        self.prompts.retain(|p| p.id() != id);
        let removed = before - self.prompts.len();
        debug!(id, removed, "Removed prompt by id");
        removed
    }

    pub fn get_prompt(&self, id: &str) -> Option<&P> {
        self.prompts.iter().find(|p| p.id() == id)
    }

    pub fn get_prompt_mut(&mut self, id: &str) -> Option<&mut P> {
        self.prompts.iter_mut().find(|p| p.id() == id)
    }

    pub fn get_filtered_prompts(&self, filters: &PromptFilters) -> Vec<&P> {
        self.prompts.iter().filter(|p| filters.matches(*p)).collect()
    }

    /// Sorts the collection in place on `field`, following the current sort order.
    ///
    /// The sort is stable in both directions: prompts with equal keys keep their
    /// previous relative order.
    pub fn sort_prompts(&mut self, field: SortField) {
        let order = self.sort_order;
        debug!(?field, %order, "Sorting prompts");
        self.prompts.sort_by(|a, b| match order {
            SortOrder::Ascending => field.compare(a, b),
            SortOrder::Descending => field.compare(b, a),
        });
    }

    pub fn clear_prompts(&mut self) {
        debug!(count = self.prompts.len(), "Clearing prompts");
        self.prompts.clear();
    }
}

/// A [`PromptManager`] over text prompts with free-text search.
///
/// Every [`PromptManager`] operation is reachable through `Deref`.
#[derive(Debug, Clone)]
pub struct TextPromptManager<P = AnyTextPrompt> {
    manager: PromptManager<P>,
}

impl<P> Default for TextPromptManager<P> {
    fn default() -> Self {
        TextPromptManager {
            manager: PromptManager::default(),
        }
    }
}

impl<P: TextRecord> TextPromptManager<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompts(prompts: Vec<P>, sort_order: SortOrder) -> Self {
        TextPromptManager {
            manager: PromptManager::with_prompts(prompts, sort_order),
        }
    }

    /// Returns the prompts where any field contains `term`, case-insensitively.
    ///
    /// The term is trimmed first; an empty term returns every prompt.
    pub fn search_prompts(&self, term: &str) -> Vec<&P> {
        search::search(self.manager.prompts(), term)
    }
}

impl<P> Deref for TextPromptManager<P> {
    type Target = PromptManager<P>;

    fn deref(&self) -> &Self::Target {
        &self.manager
    }
}

impl<P> DerefMut for TextPromptManager<P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.manager
    }
}
