//! Outbound message history - the device's "sent" folder.
//!
//! CHANGELOG:
//! - 06/02/2026 - Direction narrowed to outgoing, the only kind archived
//! - 03/02/2026 - Initial implementation

use anyhow::Result;
use rusqlite::params;
use serde::{Deserialize, Serialize};

use super::tracker::CommandId;
use crate::db::connection::Database;
use crate::db::queries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outgoing => "outgoing",
        }
    }
}

/// A message handed to the transport. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    receiver: String,
    text: String,
    direction: Direction,
    cmd_id: CommandId,
}

impl OutboundMessage {
    pub fn new(receiver: impl Into<String>, text: impl Into<String>, cmd_id: CommandId) -> Self {
        Self {
            receiver: receiver.into(),
            text: text.into(),
            direction: Direction::Outgoing,
            cmd_id,
        }
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn cmd_id(&self) -> CommandId {
        self.cmd_id
    }
}

/// Message history collaborator. Callers treat failures as non-fatal.
pub trait MessageHistory: Send + Sync {
    fn archive(&self, message: &OutboundMessage) -> Result<()>;
}

/// Stored history row.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub cmd_id: CommandId,
    pub receiver: String,
    pub body: String,
    pub direction: String,
    pub created_at: String,
}

/// History kept in the module database.
pub struct SqliteHistory {
    db: Database,
}

impl SqliteHistory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Most recent entries first.
    pub fn recent(&self, limit: u32) -> Result<Vec<HistoryEntry>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(queries::SELECT_HISTORY)?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(HistoryEntry {
                cmd_id: row.get(0)?,
                receiver: row.get(1)?,
                body: row.get(2)?,
                direction: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

impl MessageHistory for SqliteHistory {
    fn archive(&self, message: &OutboundMessage) -> Result<()> {
        let conn = self.db.lock();
        conn.execute(
            queries::INSERT_HISTORY,
            params![
                message.cmd_id(),
                message.receiver(),
                message.text(),
                message.direction().as_str(),
                chrono::Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }
}
