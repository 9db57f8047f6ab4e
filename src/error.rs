//! Error types for command resolution and dispatch.
//!
//! `ResolveError` covers user input and environment conditions. They are
//! turned into reply text and never leave the module as faults.
//! `DispatchError` is the contract violation raised when the router hands us
//! a command we do not serve.
//!
//! CHANGELOG:
//! - 03/02/2026 - Added MissingText for send args without a separator
//! - 02/02/2026 - Initial error taxonomy

use thiserror::Error;

/// Recoverable resolution failures, rendered as reply text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No recent contact")]
    NoRecentContact,

    #[error("No number for contact")]
    ContactHasNoNumber,

    #[error("Contacts module not installed?")]
    ContactsUnavailable,

    #[error("Many matching contacts found")]
    AmbiguousContact,

    #[error("No matching contact found")]
    ContactNotFound,

    #[error("No message text given (separate contact and message with two spaces)")]
    MissingText,
}

/// Fatal dispatch errors. These indicate a routing bug upstream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("unknown sub command '{sub_command}' for command '{command}'")]
    UnknownSubCommand {
        command: String,
        sub_command: String,
    },
}
