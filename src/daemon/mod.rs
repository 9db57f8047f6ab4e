//! Daemon mode: persistent server with hot resources.
//!
//! CHANGELOG:
//! - 04/02/2026 - Initial module structure

pub mod protocol;
pub mod server;
pub mod service;
