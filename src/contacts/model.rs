//! Contact value types shared by the resolver, the recent-contact slot and
//! reply elements.
//!
//! CHANGELOG:
//! - 02/02/2026 - Initial implementation

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Kind of phone number attached to a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NumberType {
    #[default]
    Mobile,
    Home,
    Work,
    Other,
}

/// One phone number of a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactNumber {
    pub number: String,
    #[serde(rename = "type", default)]
    pub kind: NumberType,
}

impl ContactNumber {
    pub fn new(number: impl Into<String>, kind: NumberType) -> Self {
        Self {
            number: number.into(),
            kind,
        }
    }
}

/// A contact: optional display name plus typed numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub numbers: Vec<ContactNumber>,
}

impl Contact {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            display_name: Some(name.into()),
            numbers: Vec::new(),
        }
    }

    pub fn with_number(mut self, number: impl Into<String>, kind: NumberType) -> Self {
        self.add_number(number, kind);
        self
    }

    /// Add a number unless the same digits are already present.
    pub fn add_number(&mut self, number: impl Into<String>, kind: NumberType) {
        let number = number.into();
        let digits = digits_of(&number);
        if self.numbers.iter().any(|n| digits_of(&n.number) == digits) {
            return;
        }
        self.numbers.push(ContactNumber::new(number, kind));
    }

    pub fn has_numbers(&self) -> bool {
        !self.numbers.is_empty()
    }

    /// First number of the preferred type.
    pub fn best_number(&self, preferred: NumberType) -> Option<&ContactNumber> {
        self.numbers.iter().find(|n| n.kind == preferred)
    }
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\+?[0-9 ()./-]+$").expect("phone number pattern is valid")
    })
}

/// Whether `s` is syntactically a phone number (not a name).
///
/// Accepts an optional leading `+` followed by digits and the usual
/// separators, with at least three digits.
pub fn is_number(s: &str) -> bool {
    let s = s.trim();
    number_pattern().is_match(s) && s.chars().filter(|c| c.is_ascii_digit()).count() >= 3
}

/// Digits of a phone number, for comparison.
pub fn digits_of(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_number() {
        assert!(is_number("555-1234"));
        assert!(is_number("+1 (415) 555-1234"));
        assert!(is_number("0171/1234567"));
        assert!(!is_number("Jane Doe"));
        assert!(!is_number("ACME Bank"));
        assert!(!is_number("12"));
        assert!(!is_number(""));
        assert!(!is_number("555-CALL"));
    }

    #[test]
    fn test_best_number_prefers_type() {
        let contact = Contact::named("Jane Doe")
            .with_number("555-0000", NumberType::Home)
            .with_number("555-1234", NumberType::Mobile);
        assert_eq!(
            contact.best_number(NumberType::Mobile).map(|n| n.number.as_str()),
            Some("555-1234")
        );
    }

    #[test]
    fn test_best_number_requires_preferred_type() {
        let contact = Contact::named("Landline").with_number("555-0000", NumberType::Home);
        assert!(contact.best_number(NumberType::Mobile).is_none());
    }

    #[test]
    fn test_add_number_skips_duplicates() {
        let mut contact = Contact::default();
        contact.add_number("+1 555 1234", NumberType::Mobile);
        contact.add_number("+15551234", NumberType::Mobile);
        assert_eq!(contact.numbers.len(), 1);
    }

    #[test]
    fn test_number_type_serde() {
        let n: ContactNumber = serde_json::from_str(r#"{"number": "1", "type": "work"}"#).unwrap();
        assert_eq!(n.kind, NumberType::Work);
        let n: ContactNumber = serde_json::from_str(r#"{"number": "1"}"#).unwrap();
        assert_eq!(n.kind, NumberType::Mobile);
    }
}
