//! Reply messages returned to the command dispatcher.
//!
//! CHANGELOG:
//! - 03/02/2026 - Initial implementation

use serde::Serialize;

use crate::contacts::Contact;
use crate::sms::history::OutboundMessage;

/// Structured payload attached to a reply for machine consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum ReplyElement {
    SmsSending {
        sms: OutboundMessage,
        contact: Contact,
    },
}

/// Human-readable text plus optional structured elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<ReplyElement>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            elements: Vec::new(),
        }
    }

    pub fn with_element(mut self, element: ReplyElement) -> Self {
        self.elements.push(element);
        self
    }
}

impl From<crate::error::ResolveError> for Reply {
    fn from(err: crate::error::ResolveError) -> Self {
        Reply::text(err.to_string())
    }
}
