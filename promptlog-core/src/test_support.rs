use crate::attachment::Attachment;
use crate::prompt::{MultiModalPrompt, PromptBase, PromptResult, TextPrompt};
use chrono::{DateTime, TimeZone, Utc};

pub fn dummy_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 23, 0, 0, 0).unwrap()
}

pub fn dummy_base(prompt_type: &str) -> PromptBase {
    PromptBase::new("Claude", "Sonnet 3.5", prompt_type, dummy_date(), PromptResult::Success).unwrap()
}

pub fn dummy_text(prompt_type: &str, input: &str, output: &str) -> TextPrompt {
    TextPrompt::new(dummy_base(prompt_type), input, output).unwrap()
}

/// A "Text-to-Image" prompt with `attachments` generated images named `roses-<n>.png`.
pub fn dummy_multi_modal(attachments: usize) -> MultiModalPrompt {
    let text = dummy_text("Text-to-Image", "Generate an image of red roses.", "Sure!");
    let outputs = (1..=attachments)
        .map(|n| Attachment::new("image", format!("roses-{}.png", n)).unwrap())
        .collect();
    MultiModalPrompt::new(text, vec![], outputs)
}
