//! Module database: delivery tracking, outbound history, recent contact.
//!
//! CHANGELOG:
//! - 02/02/2026 - Initial module structure

pub mod connection;
pub mod queries;

pub use connection::Database;
