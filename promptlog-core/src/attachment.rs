use crate::prompt::PromptError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed payload attached to a multimodal prompt, e.g. an image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    attachment_type: String,
    payload: String,
}

impl Attachment {
    pub fn new(attachment_type: impl Into<String>, payload: impl Into<String>) -> Result<Attachment, PromptError> {
        let attachment = Attachment {
            attachment_type: attachment_type.into(),
            payload: payload.into(),
        };
        attachment.validate()?;
        Ok(attachment)
    }

    pub fn attachment_type(&self) -> &str {
        &self.attachment_type
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn set_attachment_type(&mut self, attachment_type: impl Into<String>) -> Result<(), PromptError> {
        let attachment_type = attachment_type.into();
        if attachment_type.is_empty() {
            return Err(PromptError::InvalidAttachment("type"));
        }
        self.attachment_type = attachment_type;
        Ok(())
    }

    pub fn set_payload(&mut self, payload: impl Into<String>) -> Result<(), PromptError> {
        let payload = payload.into();
        if payload.is_empty() {
            return Err(PromptError::InvalidAttachment("payload"));
        }
        self.payload = payload;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), PromptError> {
        if self.attachment_type.is_empty() {
            return Err(PromptError::InvalidAttachment("type"));
        }
        if self.payload.is_empty() {
            return Err(PromptError::InvalidAttachment("payload"));
        }
        Ok(())
    }
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type: {}, Payload: {}", self.attachment_type, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_attachment() {
        let attachment = Attachment::new("image", "https://example.com/roses.png").expect("Failed to create attachment");

        assert_eq!("image", attachment.attachment_type());
        assert_eq!("https://example.com/roses.png", attachment.payload());
    }

    #[test]
    fn test_new_attachment_empty_fields() {
        match Attachment::new("", "payload") {
            Err(PromptError::InvalidAttachment(field)) => assert_eq!("type", field),
            _ => panic!("Expected InvalidAttachment error"),
        }

        match Attachment::new("image", "") {
            Err(PromptError::InvalidAttachment(field)) => assert_eq!("payload", field),
            _ => panic!("Expected InvalidAttachment error"),
        }
    }

    #[test]
    fn test_setters_reject_empty_and_keep_value() {
        let mut attachment = Attachment::new("audio", "clip.wav").unwrap();

        assert!(attachment.set_attachment_type("").is_err());
        assert!(attachment.set_payload("").is_err());
        assert_eq!("audio", attachment.attachment_type());
        assert_eq!("clip.wav", attachment.payload());

        attachment.set_attachment_type("image").unwrap();
        attachment.set_payload("roses.png").unwrap();
        assert_eq!("image", attachment.attachment_type());
        assert_eq!("roses.png", attachment.payload());
    }

    #[test]
    fn test_display() {
        let attachment = Attachment::new("image", "roses.png").unwrap();
        assert_eq!("Type: image, Payload: roses.png", attachment.to_string());
    }

    #[test]
    fn test_deserialize_keeps_type_key() {
        let attachment: Attachment = serde_json::from_str(r#"{"type":"image","payload":"roses.png"}"#).unwrap();
        assert_eq!("image", attachment.attachment_type());

        let json = serde_json::to_string(&attachment).unwrap();
        assert!(json.contains(r#""type":"image""#));
    }
}
