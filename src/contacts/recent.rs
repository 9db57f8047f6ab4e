//! Recent contact slot - the last party an SMS was sent to, for "reply".
//!
//! Two stores: an in-memory slot for long-running processes (the daemon) and
//! a SQLite-backed slot so one-shot CLI invocations can reply to each other.
//! Both serialize read-modify-write behind a mutex; the slot is only ever
//! replaced by an explicit `set`.
//!
//! CHANGELOG:
//! - 06/02/2026 - Concurrent set/get coverage for both stores
//! - 04/02/2026 - Added SQLite-backed store for the CLI
//! - 02/02/2026 - Initial implementation

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use super::model::Contact;
use crate::db::connection::Database;
use crate::db::queries;

/// Last contacted party: raw contact info plus the resolved contact, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentContact {
    /// Phone number or sender name as received/sent
    pub contact_info: String,
    pub contact: Option<Contact>,
}

impl RecentContact {
    pub fn new(contact_info: impl Into<String>, contact: Option<Contact>) -> Self {
        Self {
            contact_info: contact_info.into(),
            contact,
        }
    }
}

/// Access to the process-wide recent contact slot.
pub trait RecentContactStore: Send + Sync {
    fn get(&self) -> Option<RecentContact>;
    fn set(&self, contact_info: &str, contact: Option<&Contact>);
}

/// In-memory recent contact slot.
#[derive(Debug, Default)]
pub struct MemoryRecentContacts {
    slot: Mutex<Option<RecentContact>>,
}

impl MemoryRecentContacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(recent: RecentContact) -> Self {
        Self {
            slot: Mutex::new(Some(recent)),
        }
    }
}

impl RecentContactStore for MemoryRecentContacts {
    fn get(&self) -> Option<RecentContact> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set(&self, contact_info: &str, contact: Option<&Contact>) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(RecentContact::new(contact_info, contact.cloned()));
    }
}

/// Recent contact slot persisted in the module database.
pub struct SqliteRecentContacts {
    db: Database,
}

impl SqliteRecentContacts {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn load(&self) -> Result<Option<RecentContact>> {
        let conn = self.db.lock();
        let row = conn
            .query_row(queries::SELECT_RECENT_CONTACT, [], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })
            .optional()?;

        let Some((info, contact_json)) = row else {
            return Ok(None);
        };
        let contact = match contact_json {
            Some(json) => Some(
                serde_json::from_str::<Contact>(&json)
                    .context("Failed to parse stored recent contact")?,
            ),
            None => None,
        };
        Ok(Some(RecentContact::new(info, contact)))
    }

    fn store(&self, contact_info: &str, contact: Option<&Contact>) -> Result<()> {
        let contact_json = contact.map(serde_json::to_string).transpose()?;
        let conn = self.db.lock();
        conn.execute(
            queries::UPSERT_RECENT_CONTACT,
            params![contact_info, contact_json, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

impl RecentContactStore for SqliteRecentContacts {
    fn get(&self) -> Option<RecentContact> {
        match self.load() {
            Ok(recent) => recent,
            Err(e) => {
                tracing::warn!("failed to load recent contact: {:#}", e);
                None
            }
        }
    }

    fn set(&self, contact_info: &str, contact: Option<&Contact>) {
        if let Err(e) = self.store(contact_info, contact) {
            tracing::warn!("failed to store recent contact: {:#}", e);
        }
    }
}
