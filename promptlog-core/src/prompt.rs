//! # Prompt
//!
//! Core prompt entities. A prompt is a record of one request/response interaction
//! with a generative AI model.
//!
//! The hierarchy is modelled as a tagged variant:
//! - [`PromptBase`] holds the fields every prompt carries (id, model, version, type, date, result).
//! - [`TextPrompt`] adds the input and output text.
//! - [`MultiModalPrompt`] adds input and output [`Attachment`] collections to a text prompt.
//! - [`Prompt`] is the tagged union of the three, discriminated by [`PromptKind`].
//! - [`AnyTextPrompt`] is the subset of prompts that carry text.
//!
//! Every constructor and setter validates its input and never leaves an entity
//! half-updated.

use crate::attachment::Attachment;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("Invalid prompt {0}")]
    InvalidPrompt(&'static str),
    #[error("Invalid attachment {0}")]
    InvalidAttachment(&'static str),
    #[error("Invalid prompt date: {0}")]
    InvalidDate(String),
    #[error("A valid sort order must be provided, got '{0}'")]
    InvalidSortOrder(String),
    #[error("Unknown sort field '{0}'")]
    InvalidSortField(String),
    #[error("Expected a text prompt, got a {0} prompt")]
    NotTextPrompt(PromptKind),
}

/// The outcome of a prompt.
///
/// `Other` keeps free-text statuses written by older records (e.g. "Successful")
/// without forcing them into one of the closed variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PromptResult {
    Success,
    Failure,
    Other(String),
}

impl PromptResult {
    pub fn as_str(&self) -> &str {
        match self {
            PromptResult::Success => "Success",
            PromptResult::Failure => "Failure",
            PromptResult::Other(status) => status,
        }
    }

    fn is_valid(&self) -> bool {
        !self.as_str().is_empty()
    }

    /// Maps `Other("Success")` and `Other("Failure")` onto their closed variants.
    fn normalized(self) -> Self {
        match self {
            PromptResult::Other(status) => PromptResult::from(status),
            closed => closed,
        }
    }
}

impl From<String> for PromptResult {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Success" => PromptResult::Success,
            "Failure" => PromptResult::Failure,
            _ => PromptResult::Other(value),
        }
    }
}

impl From<&str> for PromptResult {
    fn from(value: &str) -> Self {
        PromptResult::from(value.to_string())
    }
}

impl From<PromptResult> for String {
    fn from(result: PromptResult) -> Self {
        match result {
            PromptResult::Other(status) => status,
            closed => closed.as_str().to_string(),
        }
    }
}

impl fmt::Display for PromptResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PromptKind {
    Base,
    Text,
    MultiModal,
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptKind::Base => f.write_str("base"),
            PromptKind::Text => f.write_str("text"),
            PromptKind::MultiModal => f.write_str("multimodal"),
        }
    }
}

/// Parses a prompt date from either an RFC 3339 timestamp or a plain `YYYY-MM-DD` date.
///
/// Plain dates are taken as midnight UTC.
pub fn parse_date(value: &str) -> Result<DateTime<Utc>, PromptError> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| PromptError::InvalidDate(value.to_string()))
}

fn require(value: &str, field: &'static str) -> Result<(), PromptError> {
    if value.is_empty() {
        return Err(PromptError::InvalidPrompt(field));
    }
    Ok(())
}

/// The fields shared by every prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptBase {
    id: String,
    model: String,
    version: String,
    #[serde(rename = "type")]
    prompt_type: String,
    date: DateTime<Utc>,
    result: PromptResult,
}

impl PromptBase {
    /// Creates a new base prompt with a freshly generated id.
    ///
    /// # Returns
    ///
    /// * `Ok(PromptBase)` - If every field is valid.
    /// * `PromptError::InvalidPrompt` - Naming the first empty field, checked in the order
    ///   model, version, type, result.
    pub fn new(
        model: impl Into<String>,
        version: impl Into<String>,
        prompt_type: impl Into<String>,
        date: DateTime<Utc>,
        result: impl Into<PromptResult>,
    ) -> Result<PromptBase, PromptError> {
        let base = PromptBase {
            id: Uuid::new_v4().to_string(),
            model: model.into(),
            version: version.into(),
            prompt_type: prompt_type.into(),
            date,
            result: result.into().normalized(),
        };
        base.validate()?;
        Ok(base)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn prompt_type(&self) -> &str {
        &self.prompt_type
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn result(&self) -> &PromptResult {
        &self.result
    }

    pub fn set_model(&mut self, model: impl Into<String>) -> Result<(), PromptError> {
        let model = model.into();
        require(&model, "model")?;
        self.model = model;
        Ok(())
    }

    pub fn set_version(&mut self, version: impl Into<String>) -> Result<(), PromptError> {
        let version = version.into();
        require(&version, "version")?;
        self.version = version;
        Ok(())
    }

    pub fn set_prompt_type(&mut self, prompt_type: impl Into<String>) -> Result<(), PromptError> {
        let prompt_type = prompt_type.into();
        require(&prompt_type, "type")?;
        self.prompt_type = prompt_type;
        Ok(())
    }

    pub fn set_date(&mut self, date: DateTime<Utc>) {
        self.date = date;
    }

    /// Parses and sets the date. On a parse failure the current date is kept.
    pub fn set_date_str(&mut self, date: &str) -> Result<(), PromptError> {
        self.date = parse_date(date)?;
        Ok(())
    }

    pub fn set_result(&mut self, result: impl Into<PromptResult>) -> Result<(), PromptError> {
        let result = result.into().normalized();
        if !result.is_valid() {
            return Err(PromptError::InvalidPrompt("result"));
        }
        self.result = result;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), PromptError> {
        require(&self.id, "id")?;
        require(&self.model, "model")?;
        require(&self.version, "version")?;
        require(&self.prompt_type, "type")?;
        if !self.result.is_valid() {
            return Err(PromptError::InvalidPrompt("result"));
        }
        Ok(())
    }

    pub(crate) fn field_values(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.model.clone(),
            self.version.clone(),
            self.prompt_type.clone(),
            self.date.to_rfc3339(),
            self.result.to_string(),
        ]
    }
}

impl fmt::Display for PromptBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Prompt {} ({}) {} {} [{}] - {}",
            self.id,
            self.date.format("%Y-%m-%d"),
            self.model,
            self.version,
            self.prompt_type,
            self.result
        )
    }
}

/// A prompt with input text and (possibly empty) output text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPrompt {
    #[serde(flatten)]
    base: PromptBase,
    input: String,
    output: String,
}

impl TextPrompt {
    /// An empty `output` is allowed and represents a failed generation.
    pub fn new(base: PromptBase, input: impl Into<String>, output: impl Into<String>) -> Result<TextPrompt, PromptError> {
        let input = input.into();
        require(&input, "input")?;
        Ok(TextPrompt {
            base,
            input,
            output: output.into(),
        })
    }

    pub fn base(&self) -> &PromptBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut PromptBase {
        &mut self.base
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn set_input(&mut self, input: impl Into<String>) -> Result<(), PromptError> {
        let input = input.into();
        require(&input, "input")?;
        self.input = input;
        Ok(())
    }

    pub fn set_output(&mut self, output: impl Into<String>) {
        self.output = output.into();
    }

    pub fn validate(&self) -> Result<(), PromptError> {
        self.base.validate()?;
        require(&self.input, "input")
    }

    pub(crate) fn field_values(&self) -> Vec<String> {
        let mut values = self.base.field_values();
        values.push(self.input.clone());
        values.push(self.output.clone());
        values
    }
}

impl fmt::Display for TextPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Input: {}, Output: {}", self.base, self.input, self.output)
    }
}

/// A text prompt that also carries input and output attachments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiModalPrompt {
    #[serde(flatten)]
    text: TextPrompt,
    #[serde(default)]
    input_attachments: Vec<Attachment>,
    #[serde(default)]
    output_attachments: Vec<Attachment>,
}

impl MultiModalPrompt {
    pub fn new(text: TextPrompt, input_attachments: Vec<Attachment>, output_attachments: Vec<Attachment>) -> MultiModalPrompt {
        MultiModalPrompt {
            text,
            input_attachments,
            output_attachments,
        }
    }

    pub fn text(&self) -> &TextPrompt {
        &self.text
    }

    pub fn text_mut(&mut self) -> &mut TextPrompt {
        &mut self.text
    }

    pub fn input_attachments(&self) -> &[Attachment] {
        &self.input_attachments
    }

    pub fn output_attachments(&self) -> &[Attachment] {
        &self.output_attachments
    }

    /// All attachments, inputs first and then outputs.
    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.input_attachments.iter().chain(self.output_attachments.iter())
    }

    pub fn set_input_attachments(&mut self, attachments: Vec<Attachment>) {
        self.input_attachments = attachments;
    }

    pub fn set_output_attachments(&mut self, attachments: Vec<Attachment>) {
        self.output_attachments = attachments;
    }

    pub fn add_input_attachment(&mut self, attachment: Attachment) {
        self.input_attachments.push(attachment);
    }

    pub fn add_output_attachment(&mut self, attachment: Attachment) {
        self.output_attachments.push(attachment);
    }

    pub fn validate(&self) -> Result<(), PromptError> {
        self.text.validate()?;
        self.attachments().try_for_each(Attachment::validate)
    }

    pub(crate) fn field_values(&self) -> Vec<String> {
        let mut values = self.text.field_values();
        values.extend(self.attachments().map(|attachment| attachment.to_string()));
        values
    }
}

fn write_attachments(f: &mut fmt::Formatter<'_>, attachments: &[Attachment]) -> fmt::Result {
    f.write_str("[")?;
    for (i, attachment) in attachments.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", attachment)?;
    }
    f.write_str("]")
}

impl fmt::Display for MultiModalPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Input Attachments: ", self.text)?;
        write_attachments(f, &self.input_attachments)?;
        f.write_str(", Output Attachments: ")?;
        write_attachments(f, &self.output_attachments)
    }
}

/// Any prompt, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Prompt {
    Base(PromptBase),
    Text(TextPrompt),
    MultiModal(MultiModalPrompt),
}

impl Prompt {
    pub fn kind(&self) -> PromptKind {
        match self {
            Prompt::Base(_) => PromptKind::Base,
            Prompt::Text(_) => PromptKind::Text,
            Prompt::MultiModal(_) => PromptKind::MultiModal,
        }
    }

    pub fn base(&self) -> &PromptBase {
        match self {
            Prompt::Base(base) => base,
            Prompt::Text(text) => text.base(),
            Prompt::MultiModal(multi) => multi.text().base(),
        }
    }

    pub fn base_mut(&mut self) -> &mut PromptBase {
        match self {
            Prompt::Base(base) => base,
            Prompt::Text(text) => text.base_mut(),
            Prompt::MultiModal(multi) => multi.text_mut().base_mut(),
        }
    }

    pub fn as_text(&self) -> Option<&TextPrompt> {
        match self {
            Prompt::Base(_) => None,
            Prompt::Text(text) => Some(text),
            Prompt::MultiModal(multi) => Some(multi.text()),
        }
    }

    pub fn as_multi_modal(&self) -> Option<&MultiModalPrompt> {
        match self {
            Prompt::MultiModal(multi) => Some(multi),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), PromptError> {
        match self {
            Prompt::Base(base) => base.validate(),
            Prompt::Text(text) => text.validate(),
            Prompt::MultiModal(multi) => multi.validate(),
        }
    }

    pub(crate) fn field_values(&self) -> Vec<String> {
        match self {
            Prompt::Base(base) => base.field_values(),
            Prompt::Text(text) => text.field_values(),
            Prompt::MultiModal(multi) => multi.field_values(),
        }
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prompt::Base(base) => fmt::Display::fmt(base, f),
            Prompt::Text(text) => fmt::Display::fmt(text, f),
            Prompt::MultiModal(multi) => fmt::Display::fmt(multi, f),
        }
    }
}

impl From<PromptBase> for Prompt {
    fn from(base: PromptBase) -> Self {
        Prompt::Base(base)
    }
}

impl From<TextPrompt> for Prompt {
    fn from(text: TextPrompt) -> Self {
        Prompt::Text(text)
    }
}

impl From<MultiModalPrompt> for Prompt {
    fn from(multi: MultiModalPrompt) -> Self {
        Prompt::MultiModal(multi)
    }
}

/// A prompt that is known to carry input and output text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AnyTextPrompt {
    Text(TextPrompt),
    MultiModal(MultiModalPrompt),
}

impl AnyTextPrompt {
    pub fn kind(&self) -> PromptKind {
        match self {
            AnyTextPrompt::Text(_) => PromptKind::Text,
            AnyTextPrompt::MultiModal(_) => PromptKind::MultiModal,
        }
    }

    pub fn text(&self) -> &TextPrompt {
        match self {
            AnyTextPrompt::Text(text) => text,
            AnyTextPrompt::MultiModal(multi) => multi.text(),
        }
    }

    pub fn text_mut(&mut self) -> &mut TextPrompt {
        match self {
            AnyTextPrompt::Text(text) => text,
            AnyTextPrompt::MultiModal(multi) => multi.text_mut(),
        }
    }

    pub fn validate(&self) -> Result<(), PromptError> {
        match self {
            AnyTextPrompt::Text(text) => text.validate(),
            AnyTextPrompt::MultiModal(multi) => multi.validate(),
        }
    }

    pub(crate) fn field_values(&self) -> Vec<String> {
        match self {
            AnyTextPrompt::Text(text) => text.field_values(),
            AnyTextPrompt::MultiModal(multi) => multi.field_values(),
        }
    }
}

impl fmt::Display for AnyTextPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyTextPrompt::Text(text) => fmt::Display::fmt(text, f),
            AnyTextPrompt::MultiModal(multi) => fmt::Display::fmt(multi, f),
        }
    }
}

impl From<TextPrompt> for AnyTextPrompt {
    fn from(text: TextPrompt) -> Self {
        AnyTextPrompt::Text(text)
    }
}

impl From<MultiModalPrompt> for AnyTextPrompt {
    fn from(multi: MultiModalPrompt) -> Self {
        AnyTextPrompt::MultiModal(multi)
    }
}

impl TryFrom<Prompt> for AnyTextPrompt {
    type Error = PromptError;

    fn try_from(prompt: Prompt) -> Result<Self, Self::Error> {
        match prompt {
            Prompt::Base(_) => Err(PromptError::NotTextPrompt(PromptKind::Base)),
            Prompt::Text(text) => Ok(AnyTextPrompt::Text(text)),
            Prompt::MultiModal(multi) => Ok(AnyTextPrompt::MultiModal(multi)),
        }
    }
}

impl From<AnyTextPrompt> for Prompt {
    fn from(prompt: AnyTextPrompt) -> Self {
        match prompt {
            AnyTextPrompt::Text(text) => Prompt::Text(text),
            AnyTextPrompt::MultiModal(multi) => Prompt::MultiModal(multi),
        }
    }
}
