//! # Prompt capabilities
//!
//! Managers are generic over what a prompt can do rather than over a concrete type:
//! - [`PromptRecord`] - access to the base fields every prompt has.
//! - [`TextRecord`] - access to input and output text as well.

use crate::prompt::{AnyTextPrompt, MultiModalPrompt, Prompt, PromptBase, PromptError, PromptKind, PromptResult, TextPrompt};
use chrono::{DateTime, Utc};
use std::fmt;

pub trait PromptRecord: fmt::Display {
    fn base(&self) -> &PromptBase;
    fn base_mut(&mut self) -> &mut PromptBase;
    fn kind(&self) -> PromptKind;

    /// Re-checks every field invariant, e.g. after deserialization.
    fn validate(&self) -> Result<(), PromptError>;

    /// The stringified value of every field, attachments included.
    fn searchable_values(&self) -> Vec<String>;

    fn id(&self) -> &str {
        self.base().id()
    }

    fn model(&self) -> &str {
        self.base().model()
    }

    fn version(&self) -> &str {
        self.base().version()
    }

    fn prompt_type(&self) -> &str {
        self.base().prompt_type()
    }

    fn date(&self) -> DateTime<Utc> {
        self.base().date()
    }

    fn result(&self) -> &PromptResult {
        self.base().result()
    }
}

pub trait TextRecord: PromptRecord {
    fn text(&self) -> &TextPrompt;
    fn text_mut(&mut self) -> &mut TextPrompt;

    fn input(&self) -> &str {
        self.text().input()
    }

    fn output(&self) -> &str {
        self.text().output()
    }

    fn set_input(&mut self, input: String) -> Result<(), PromptError> {
        self.text_mut().set_input(input)
    }

    fn set_output(&mut self, output: String) {
        self.text_mut().set_output(output)
    }
}

impl PromptRecord for PromptBase {
    fn base(&self) -> &PromptBase {
        self
    }

    fn base_mut(&mut self) -> &mut PromptBase {
        self
    }

    fn kind(&self) -> PromptKind {
        PromptKind::Base
    }

    fn validate(&self) -> Result<(), PromptError> {
        PromptBase::validate(self)
    }

    fn searchable_values(&self) -> Vec<String> {
        self.field_values()
    }
}

impl PromptRecord for TextPrompt {
    fn base(&self) -> &PromptBase {
        TextPrompt::base(self)
    }

    fn base_mut(&mut self) -> &mut PromptBase {
        TextPrompt::base_mut(self)
    }

    fn kind(&self) -> PromptKind {
        PromptKind::Text
    }

    fn validate(&self) -> Result<(), PromptError> {
        TextPrompt::validate(self)
    }

    fn searchable_values(&self) -> Vec<String> {
        self.field_values()
    }
}

impl PromptRecord for MultiModalPrompt {
    fn base(&self) -> &PromptBase {
        self.text().base()
    }

    fn base_mut(&mut self) -> &mut PromptBase {
        self.text_mut().base_mut()
    }

    fn kind(&self) -> PromptKind {
        PromptKind::MultiModal
    }

    fn validate(&self) -> Result<(), PromptError> {
        MultiModalPrompt::validate(self)
    }

    fn searchable_values(&self) -> Vec<String> {
        self.field_values()
    }
}

impl PromptRecord for Prompt {
    fn base(&self) -> &PromptBase {
        Prompt::base(self)
    }

    fn base_mut(&mut self) -> &mut PromptBase {
        Prompt::base_mut(self)
    }

    fn kind(&self) -> PromptKind {
        Prompt::kind(self)
    }

    fn validate(&self) -> Result<(), PromptError> {
        Prompt::validate(self)
    }

    fn searchable_values(&self) -> Vec<String> {
        self.field_values()
    }
}

impl PromptRecord for AnyTextPrompt {
    fn base(&self) -> &PromptBase {
        AnyTextPrompt::text(self).base()
    }

    fn base_mut(&mut self) -> &mut PromptBase {
        AnyTextPrompt::text_mut(self).base_mut()
    }

    fn kind(&self) -> PromptKind {
        AnyTextPrompt::kind(self)
    }

    fn validate(&self) -> Result<(), PromptError> {
        AnyTextPrompt::validate(self)
    }

    fn searchable_values(&self) -> Vec<String> {
        self.field_values()
    }
}

impl TextRecord for TextPrompt {
    fn text(&self) -> &TextPrompt {
        self
    }

    fn text_mut(&mut self) -> &mut TextPrompt {
        self
    }
}

impl TextRecord for MultiModalPrompt {
    fn text(&self) -> &TextPrompt {
        MultiModalPrompt::text(self)
    }

    fn text_mut(&mut self) -> &mut TextPrompt {
        MultiModalPrompt::text_mut(self)
    }
}

impl TextRecord for AnyTextPrompt {
    fn text(&self) -> &TextPrompt {
        AnyTextPrompt::text(self)
    }

    fn text_mut(&mut self) -> &mut TextPrompt {
        AnyTextPrompt::text_mut(self)
    }
}
