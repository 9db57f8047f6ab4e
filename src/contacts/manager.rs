//! Contact manager - load contacts from JSON and resolve queries against them.
//!
//! CHANGELOG:
//! - 03/02/2026 - lookup returns every match so callers can detect ambiguity
//! - 02/02/2026 - Typed numbers, legacy "phone" field read as mobile
//! - 02/02/2026 - Initial implementation

use super::fuzzy;
use super::model::{digits_of, is_number, Contact, ContactNumber, NumberType};
use super::ContactResolver;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// A contact entry as stored in contacts.json.
#[derive(Debug, Deserialize)]
struct ContactEntry {
    name: String,
    #[serde(default)]
    numbers: Vec<ContactNumber>,
    /// Legacy single-number field
    #[serde(default)]
    phone: Option<String>,
}

impl From<ContactEntry> for Contact {
    fn from(entry: ContactEntry) -> Self {
        let mut contact = Contact {
            display_name: Some(entry.name),
            numbers: entry.numbers,
        };
        if let Some(phone) = entry.phone {
            contact.add_number(phone, NumberType::Mobile);
        }
        contact
    }
}

/// Wrapper for contacts.json format (has "contacts" key).
#[derive(Debug, Deserialize)]
struct ContactsFile {
    contacts: Vec<ContactEntry>,
}

/// Manages contacts loaded from a JSON file.
pub struct ContactsManager {
    contacts: Vec<Contact>,
}

impl ContactsManager {
    /// Load contacts from a JSON file.
    ///
    /// Supports both formats:
    /// - `{"contacts": [...]}`
    /// - `[...]` (flat array)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read contacts file: {:?}", path.as_ref()))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        // Try wrapped format first ({"contacts": [...]})
        let entries = match serde_json::from_str::<ContactsFile>(content) {
            Ok(wrapper) => wrapper.contacts,
            Err(_) => serde_json::from_str::<Vec<ContactEntry>>(content)
                .with_context(|| "Failed to parse contacts JSON")?,
        };

        Ok(Self::new(entries.into_iter().map(Contact::from).collect()))
    }

    pub fn new(contacts: Vec<Contact>) -> Self {
        Self { contacts }
    }

    /// Get all contacts.
    pub fn all(&self) -> &[Contact] {
        &self.contacts
    }

    fn name_of(contact: &Contact) -> &str {
        contact.display_name.as_deref().unwrap_or("")
    }

    /// Find contacts whose number matches `phone` by digits.
    pub fn find_by_phone(&self, phone: &str) -> Vec<&Contact> {
        let wanted = digits_of(phone);
        self.contacts
            .iter()
            .filter(|c| c.numbers.iter().any(|n| digits_of(&n.number) == wanted))
            .collect()
    }

    /// All contacts matching a free-text query.
    ///
    /// Order of matching, first non-empty tier wins:
    /// 1. Phone number match (if the query is a number)
    /// 2. Exact name match (case-insensitive)
    /// 3. Partial name match (name contains query)
    /// 4. Fuzzy match with score >= threshold
    pub fn find_all(&self, query: &str) -> Vec<&Contact> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        if is_number(query) {
            return self.find_by_phone(query);
        }

        let query_lower = query.to_lowercase();
        let exact: Vec<&Contact> = self
            .contacts
            .iter()
            .filter(|c| Self::name_of(c).to_lowercase() == query_lower)
            .collect();
        if !exact.is_empty() {
            return exact;
        }

        let partial: Vec<&Contact> = self
            .contacts
            .iter()
            .filter(|c| Self::name_of(c).to_lowercase().contains(&query_lower))
            .collect();
        if !partial.is_empty() {
            return partial;
        }

        self.contacts
            .iter()
            .filter(|c| fuzzy::is_match(query, Self::name_of(c), fuzzy::DEFAULT_THRESHOLD))
            .collect()
    }

    /// Single best contact for a name (exact first, then best fuzzy score).
    pub fn find_best(&self, name: &str) -> Option<&Contact> {
        let name_lower = name.trim().to_lowercase();
        if let Some(contact) = self
            .contacts
            .iter()
            .find(|c| Self::name_of(c).to_lowercase() == name_lower)
        {
            return Some(contact);
        }

        let mut best_match: Option<(&Contact, f64)> = None;
        for contact in &self.contacts {
            let result = fuzzy::multi_match(name, Self::name_of(contact));
            if result.score >= fuzzy::DEFAULT_THRESHOLD
                && best_match.as_ref().map_or(true, |(_, score)| result.score > *score)
            {
                best_match = Some((contact, result.score));
            }
        }
        best_match.map(|(c, _)| c)
    }
}

impl ContactResolver for ContactsManager {
    fn lookup(&self, query: &str) -> Vec<Contact> {
        let found: Vec<Contact> = self.find_all(query).into_iter().cloned().collect();
        tracing::debug!(query, matches = found.len(), "contact lookup");
        found
    }

    fn fill_numbers(&self, contact: &mut Contact) {
        let Some(name) = contact.display_name.clone() else {
            return;
        };
        if let Some(found) = self.find_best(&name) {
            for number in &found.numbers {
                contact.add_number(number.number.clone(), number.kind);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTACTS: &str = r#"{"contacts": [
        {"name": "Jane Doe", "phone": "555-1234"},
        {"name": "John Doe", "numbers": [{"number": "555-9999", "type": "home"}]},
        {"name": "Johnny Appleseed", "numbers": [{"number": "+1 415 555 0000"}]}
    ]}"#;

    fn manager() -> ContactsManager {
        ContactsManager::from_json(CONTACTS).unwrap()
    }

    #[test]
    fn test_load_wrapped_and_flat() {
        assert_eq!(manager().all().len(), 3);
        let flat = ContactsManager::from_json(r#"[{"name": "A", "phone": "123"}]"#).unwrap();
        assert_eq!(flat.all().len(), 1);
        assert_eq!(flat.all()[0].numbers[0].kind, NumberType::Mobile);
    }

    #[test]
    fn test_exact_match_wins_over_partial() {
        let m = manager();
        let found = m.find_all("jane doe");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].display_name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_partial_match_can_be_ambiguous() {
        let m = manager();
        assert_eq!(m.find_all("Doe").len(), 2);
        assert_eq!(m.find_all("John").len(), 2);
    }

    #[test]
    fn test_no_match() {
        assert!(manager().find_all("Zed").is_empty());
        assert!(manager().find_all("  ").is_empty());
    }

    #[test]
    fn test_lookup_by_number() {
        let m = manager();
        let found = m.find_all("4155550000");
        assert_eq!(found.len(), 0);
        let found = m.find_all("+1 415 555 0000");
        assert_eq!(found[0].display_name.as_deref(), Some("Johnny Appleseed"));
    }

    #[test]
    fn test_fill_numbers_by_name() {
        let m = manager();
        let mut contact = Contact::named("Jane Doe");
        m.fill_numbers(&mut contact);
        assert_eq!(contact.numbers.len(), 1);
        assert_eq!(contact.numbers[0].number, "555-1234");

        let mut unknown = Contact::named("ACME Bank");
        m.fill_numbers(&mut unknown);
        assert!(!unknown.has_numbers());
    }
}
