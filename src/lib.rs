//! maxs-smssend library
//!
//! SMS send module: resolves "sms send" / "reply to" commands to a receiver,
//! splits the text into parts, hands them to the SMS gateway and tracks
//! per-part sent/delivered outcomes. Also carries the clipboard read command.
//!
//! CHANGELOG:
//! - 05/02/2026 - Clipboard module
//! - 04/02/2026 - Daemon mode on top of ModuleService
//! - 02/02/2026 - Initial library structure

pub mod clipboard;
pub mod config;
pub mod contacts;
pub mod daemon;
pub mod db;
pub mod error;
pub mod module;
pub mod output;
pub mod reply;
pub mod service;
pub mod sms;
