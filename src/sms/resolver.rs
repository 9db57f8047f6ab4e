//! Command resolution: sub-command + raw arguments -> receiver and text.
//!
//! CHANGELOG:
//! - 03/02/2026 - "reply" with a non-number sender fails when the contact has
//!   no numbers after lookup
//! - 02/02/2026 - Initial implementation

use std::sync::Arc;

use crate::contacts::model::is_number;
use crate::contacts::{Contact, ContactResolver, NumberType, RecentContactStore};
use crate::error::{DispatchError, ResolveError};

/// Separator between contact query and text in "send" arguments.
pub const SEND_SEPARATOR: &str = "  ";

/// Number type used when picking a receiver.
pub const PREFERRED_NUMBER_TYPE: NumberType = NumberType::Mobile;

/// Sub-commands served by the SMS module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubCommand {
    Send,
    Reply,
}

impl SubCommand {
    /// Map a routed (command, sub-command) pair. Anything else is a routing
    /// bug upstream.
    pub fn from_command(command: &str, sub_command: &str) -> Result<Self, DispatchError> {
        match (command, sub_command) {
            ("sms", "send") => Ok(SubCommand::Send),
            ("sms", "reply") | ("reply", "to") => Ok(SubCommand::Reply),
            _ => Err(DispatchError::UnknownSubCommand {
                command: command.to_string(),
                sub_command: sub_command.to_string(),
            }),
        }
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub receiver: String,
    pub text: String,
    pub contact: Contact,
}

/// Split "send" arguments on the first double space into (query, text).
pub fn split_send_args(args: &str) -> Option<(&str, &str)> {
    args.split_once(SEND_SEPARATOR)
}

pub struct CommandResolver {
    contacts: Option<Arc<dyn ContactResolver>>,
    recent: Arc<dyn RecentContactStore>,
}

impl CommandResolver {
    pub fn new(
        contacts: Option<Arc<dyn ContactResolver>>,
        recent: Arc<dyn RecentContactStore>,
    ) -> Self {
        Self { contacts, recent }
    }

    pub fn resolve(&self, sub_command: SubCommand, args: &str) -> Result<Resolution, ResolveError> {
        match sub_command {
            SubCommand::Reply => self.resolve_reply(args),
            SubCommand::Send => self.resolve_send(args),
        }
    }

    fn resolve_reply(&self, args: &str) -> Result<Resolution, ResolveError> {
        let recent = self.recent.get().ok_or(ResolveError::NoRecentContact)?;
        let mut contact = recent.contact.unwrap_or_default();

        let receiver = if is_number(&recent.contact_info) {
            contact.add_number(recent.contact_info.clone(), PREFERRED_NUMBER_TYPE);
            recent.contact_info
        } else {
            // Sender known only by name (e.g. a company): ask the contact
            // book for its numbers
            if contact.display_name.is_none() {
                contact.display_name = Some(recent.contact_info.clone());
            }
            if let Some(resolver) = &self.contacts {
                resolver.fill_numbers(&mut contact);
            }
            if !contact.has_numbers() {
                return Err(ResolveError::ContactHasNoNumber);
            }
            contact
                .best_number(PREFERRED_NUMBER_TYPE)
                .ok_or(ResolveError::ContactHasNoNumber)?
                .number
                .clone()
        };

        Ok(Resolution {
            receiver,
            text: args.to_string(),
            contact,
        })
    }

    fn resolve_send(&self, args: &str) -> Result<Resolution, ResolveError> {
        let (query, text) = match split_send_args(args) {
            Some((query, text)) => (query, Some(text)),
            None => (args, None),
        };

        let resolver = self
            .contacts
            .as_ref()
            .ok_or(ResolveError::ContactsUnavailable)?;

        let mut matches = resolver.lookup(query);
        let contact = match matches.len() {
            0 => return Err(ResolveError::ContactNotFound),
            1 => matches.remove(0),
            _ => return Err(ResolveError::AmbiguousContact),
        };
        let text = text.ok_or(ResolveError::MissingText)?;

        let receiver = contact
            .best_number(PREFERRED_NUMBER_TYPE)
            .ok_or(ResolveError::ContactHasNoNumber)?
            .number
            .clone();
        self.recent.set(&receiver, Some(&contact));

        Ok(Resolution {
            receiver,
            text: text.to_string(),
            contact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::manager::ContactsManager;
    use crate::contacts::recent::{MemoryRecentContacts, RecentContact};

    fn contacts() -> Arc<dyn ContactResolver> {
        Arc::new(
            ContactsManager::from_json(
                r#"[
                    {"name": "Jane Doe", "phone": "555-1234"},
                    {"name": "John Doe", "phone": "555-5678"},
                    {"name": "Landline Larry", "numbers": [{"number": "555-0000", "type": "home"}]},
                    {"name": "ACME Bank", "phone": "555-2265"}
                ]"#,
            )
            .unwrap(),
        )
    }

    fn resolver_with(recent: Arc<MemoryRecentContacts>) -> CommandResolver {
        CommandResolver::new(Some(contacts()), recent)
    }

    #[test]
    fn test_split_send_args() {
        assert_eq!(
            split_send_args("john doe  hello there"),
            Some(("john doe", "hello there"))
        );
        assert_eq!(split_send_args("john  "), Some(("john", "")));
        assert_eq!(split_send_args("john doe hello"), None);
        // Only the first double space separates
        assert_eq!(split_send_args("a  b  c"), Some(("a", "b  c")));
    }

    #[test]
    fn test_sub_command_mapping() {
        assert_eq!(SubCommand::from_command("sms", "send").unwrap(), SubCommand::Send);
        assert_eq!(SubCommand::from_command("reply", "to").unwrap(), SubCommand::Reply);
        assert!(matches!(
            SubCommand::from_command("sms", "read"),
            Err(DispatchError::UnknownSubCommand { .. })
        ));
    }

    #[test]
    fn test_send_resolves_and_updates_recent() {
        let recent = Arc::new(MemoryRecentContacts::new());
        let resolver = resolver_with(recent.clone());

        let resolution = resolver
            .resolve(SubCommand::Send, "Jane Doe  Running late")
            .unwrap();
        assert_eq!(resolution.receiver, "555-1234");
        assert_eq!(resolution.text, "Running late");

        let stored = recent.get().unwrap();
        assert_eq!(stored.contact_info, "555-1234");
        assert_eq!(
            stored.contact.unwrap().display_name.as_deref(),
            Some("Jane Doe")
        );
    }

    #[test]
    fn test_send_empty_text_after_separator() {
        let resolver = resolver_with(Arc::new(MemoryRecentContacts::new()));
        let resolution = resolver.resolve(SubCommand::Send, "Jane Doe  ").unwrap();
        assert_eq!(resolution.text, "");
    }

    #[test]
    fn test_send_failures_leave_recent_untouched() {
        let recent = Arc::new(MemoryRecentContacts::new());
        let resolver = resolver_with(recent.clone());

        assert_eq!(
            resolver.resolve(SubCommand::Send, "Doe  hi"),
            Err(ResolveError::AmbiguousContact)
        );
        assert_eq!(
            resolver.resolve(SubCommand::Send, "Zed  hi"),
            Err(ResolveError::ContactNotFound)
        );
        assert_eq!(
            resolver.resolve(SubCommand::Send, "Zed hello"),
            Err(ResolveError::ContactNotFound)
        );
        assert_eq!(
            resolver.resolve(SubCommand::Send, "Jane Doe"),
            Err(ResolveError::MissingText)
        );
        assert_eq!(
            resolver.resolve(SubCommand::Send, "Landline Larry  hi"),
            Err(ResolveError::ContactHasNoNumber)
        );
        assert!(recent.get().is_none());
    }

    #[test]
    fn test_send_without_contacts() {
        let resolver = CommandResolver::new(None, Arc::new(MemoryRecentContacts::new()));
        assert_eq!(
            resolver.resolve(SubCommand::Send, "Jane Doe  hi"),
            Err(ResolveError::ContactsUnavailable)
        );
    }

    #[test]
    fn test_reply_without_recent_contact() {
        let resolver = resolver_with(Arc::new(MemoryRecentContacts::new()));
        assert_eq!(
            resolver.resolve(SubCommand::Reply, "On my way"),
            Err(ResolveError::NoRecentContact)
        );
    }

    #[test]
    fn test_reply_to_number_skips_lookup() {
        let recent = Arc::new(MemoryRecentContacts::with(RecentContact::new("555-1234", None)));
        // No contact resolver at all: a number needs no lookup
        let resolver = CommandResolver::new(None, recent.clone());

        let resolution = resolver.resolve(SubCommand::Reply, "On my way").unwrap();
        assert_eq!(resolution.receiver, "555-1234");
        assert_eq!(resolution.text, "On my way");
        assert!(resolution.contact.display_name.is_none());
        assert_eq!(recent.get().unwrap(), RecentContact::new("555-1234", None));
    }

    #[test]
    fn test_reply_to_name_fills_numbers() {
        let recent = Arc::new(MemoryRecentContacts::with(RecentContact::new("ACME Bank", None)));
        let resolver = resolver_with(recent);

        let resolution = resolver.resolve(SubCommand::Reply, "STOP").unwrap();
        assert_eq!(resolution.receiver, "555-2265");
        assert_eq!(resolution.contact.display_name.as_deref(), Some("ACME Bank"));
    }

    #[test]
    fn test_reply_to_unknown_name_has_no_number() {
        let recent = Arc::new(MemoryRecentContacts::with(RecentContact::new("PayPal", None)));
        let resolver = resolver_with(recent);
        assert_eq!(
            resolver.resolve(SubCommand::Reply, "hi"),
            Err(ResolveError::ContactHasNoNumber)
        );
    }
}
