//! Contacts: value types, the JSON-backed resolver and the recent contact slot.
//!
//! CHANGELOG:
//! - 02/02/2026 - Initial module structure

pub mod fuzzy;
pub mod manager;
pub mod model;
pub mod recent;

pub use model::{Contact, ContactNumber, NumberType};
pub use recent::{RecentContact, RecentContactStore};

/// Contact lookup collaborator.
pub trait ContactResolver: Send + Sync {
    /// All contacts matching a free-text query.
    fn lookup(&self, query: &str) -> Vec<Contact>;

    /// Fill in numbers for a contact known only by name.
    fn fill_numbers(&self, contact: &mut Contact);
}
