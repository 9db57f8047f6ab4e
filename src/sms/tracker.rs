//! Delivery tracking - per-message, per-part sent/delivered status.
//!
//! A record is created before the transport send when either notification
//! kind is enabled. Each part gets one callback token per enabled kind; the
//! token travels with the part through the gateway and comes back with the
//! event, so the event can be matched to its (command, part, kind) cell.
//! Cells are last-write-wins, duplicates leave the record unchanged.
//!
//! CHANGELOG:
//! - 06/02/2026 - Parts that never left are marked failed
//! - 05/02/2026 - Progress summary and completion notifications
//! - 04/02/2026 - Token text form for the gateway environment
//! - 03/02/2026 - Initial implementation

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::db::connection::Database;
use crate::db::queries;

/// Identifier of a routed command.
pub type CommandId = i64;

/// Number of characters kept in the stored text preview.
pub const PREVIEW_CHARS: usize = 20;

/// First `PREVIEW_CHARS` characters of `text`; shorter texts are kept whole.
pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("no delivery record for command {0}")]
    UnknownCommand(CommandId),

    #[error("part {part_index} out of range for command {cmd_id} ({part_count} parts)")]
    PartOutOfRange {
        cmd_id: CommandId,
        part_index: u32,
        part_count: u32,
    },

    #[error("{kind} events are not tracked for command {cmd_id}")]
    KindNotTracked { cmd_id: CommandId, kind: EventKind },

    #[error("invalid callback token: {0}")]
    InvalidToken(String),

    #[error("delivery storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

// ============================================================================
// Correlation types
// ============================================================================

/// Kind of asynchronous transport event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Sent,
    Delivered,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Sent => "sent",
            EventKind::Delivered => "delivered",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = TrackingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(EventKind::Sent),
            "delivered" => Ok(EventKind::Delivered),
            other => Err(TrackingError::InvalidToken(format!("unknown event kind '{}'", other))),
        }
    }
}

/// Status of one (part, kind) cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartStatus {
    Pending,
    Ok,
    Failed,
}

impl PartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartStatus::Pending => "pending",
            PartStatus::Ok => "ok",
            PartStatus::Failed => "failed",
        }
    }

    fn parse(s: &str) -> PartStatus {
        match s {
            "ok" => PartStatus::Ok,
            "failed" => PartStatus::Failed,
            _ => PartStatus::Pending,
        }
    }
}

/// Identifies one status cell of one tracked message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationKey {
    pub cmd_id: CommandId,
    pub part_index: u32,
    pub kind: EventKind,
}

/// Opaque callback identifier handed to the transport for one part.
///
/// Text form: `<kind>:<cmd_id>:<part_index>:<request_code>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallbackToken {
    pub key: CorrelationKey,
    pub request_code: i32,
}

impl fmt::Display for CallbackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.key.kind, self.key.cmd_id, self.key.part_index, self.request_code
        )
    }
}

impl FromStr for CallbackToken {
    type Err = TrackingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TrackingError::InvalidToken(s.to_string());
        let fields: Vec<&str> = s.trim().split(':').collect();
        let [kind, cmd_id, part_index, request_code] = fields.as_slice() else {
            return Err(invalid());
        };

        Ok(CallbackToken {
            key: CorrelationKey {
                kind: kind.parse()?,
                cmd_id: cmd_id.parse().map_err(|_| invalid())?,
                part_index: part_index.parse().map_err(|_| invalid())?,
            },
            request_code: request_code.parse().map_err(|_| invalid())?,
        })
    }
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartCell {
    pub part_index: u32,
    pub kind: EventKind,
    pub status: PartStatus,
}

/// Tracking state for one outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryRecord {
    pub cmd_id: CommandId,
    pub receiver: String,
    pub preview: String,
    pub part_count: u32,
    pub track_sent: bool,
    pub track_delivered: bool,
    pub created_at: String,
    pub parts: Vec<PartCell>,
}

impl DeliveryRecord {
    pub fn tracks(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Sent => self.track_sent,
            EventKind::Delivered => self.track_delivered,
        }
    }

    pub fn status(&self, part_index: u32, kind: EventKind) -> Option<PartStatus> {
        self.parts
            .iter()
            .find(|c| c.part_index == part_index && c.kind == kind)
            .map(|c| c.status)
    }
}

/// Progress of one event kind after applying an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryProgress {
    pub cmd_id: CommandId,
    pub kind: EventKind,
    pub receiver: String,
    pub completed: u32,
    pub failed: u32,
    pub total: u32,
}

impl DeliveryProgress {
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }

    /// User-facing notification once every part reported.
    pub fn notification(&self) -> Option<String> {
        if !self.is_complete() {
            return None;
        }
        let mut text = format!("SMS to {} {}", self.receiver, self.kind);
        if self.failed > 0 {
            text.push_str(&format!(" ({} of {} parts failed)", self.failed, self.total));
        }
        Some(text)
    }
}

// ============================================================================
// Tracker
// ============================================================================

/// SQLite-backed delivery tracker.
#[derive(Clone)]
pub struct DeliveryTracker {
    db: Database,
}

impl DeliveryTracker {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create the record for a message about to be sent, with every enabled
    /// cell pending. Replaces an earlier record with the same command id.
    pub fn begin_tracking(
        &self,
        cmd_id: CommandId,
        receiver: &str,
        text_preview: &str,
        part_count: u32,
        track_sent: bool,
        track_delivered: bool,
    ) -> Result<DeliveryRecord, TrackingError> {
        let created_at = chrono::Utc::now().to_rfc3339();
        let kinds: Vec<EventKind> = [
            (EventKind::Sent, track_sent),
            (EventKind::Delivered, track_delivered),
        ]
        .into_iter()
        .filter_map(|(kind, enabled)| enabled.then_some(kind))
        .collect();

        let mut conn = self.db.lock();
        let tx = conn.transaction()?;
        tx.execute(
            queries::INSERT_SMS,
            params![
                cmd_id,
                receiver,
                text_preview,
                part_count,
                track_sent,
                track_delivered,
                created_at
            ],
        )?;
        tx.execute(queries::DELETE_PARTS, params![cmd_id])?;

        let mut parts = Vec::new();
        for part_index in 0..part_count {
            for kind in &kinds {
                tx.execute(
                    queries::UPSERT_PART,
                    params![
                        cmd_id,
                        part_index,
                        kind.as_str(),
                        PartStatus::Pending.as_str(),
                        created_at
                    ],
                )?;
                parts.push(PartCell {
                    part_index,
                    kind: *kind,
                    status: PartStatus::Pending,
                });
            }
        }
        tx.commit()?;

        tracing::debug!(cmd_id, part_count, track_sent, track_delivered, "tracking started");
        Ok(DeliveryRecord {
            cmd_id,
            receiver: receiver.to_string(),
            preview: text_preview.to_string(),
            part_count,
            track_sent,
            track_delivered,
            created_at,
            parts,
        })
    }

    /// One token per part for `kind`, request codes counting up from
    /// `request_code_base`.
    pub fn make_callback_tokens(
        part_count: u32,
        cmd_id: CommandId,
        kind: EventKind,
        request_code_base: i32,
    ) -> Vec<CallbackToken> {
        (0..part_count)
            .map(|part_index| CallbackToken {
                key: CorrelationKey {
                    cmd_id,
                    part_index,
                    kind,
                },
                request_code: request_code_base.wrapping_add(part_index as i32),
            })
            .collect()
    }

    /// Load a record with all of its cells.
    pub fn record(&self, cmd_id: CommandId) -> Result<Option<DeliveryRecord>, TrackingError> {
        let conn = self.db.lock();
        let record = conn
            .query_row(queries::SELECT_SMS, params![cmd_id], |row| {
                Ok(DeliveryRecord {
                    cmd_id: row.get(0)?,
                    receiver: row.get(1)?,
                    preview: row.get(2)?,
                    part_count: row.get(3)?,
                    track_sent: row.get(4)?,
                    track_delivered: row.get(5)?,
                    created_at: row.get(6)?,
                    parts: Vec::new(),
                })
            })
            .optional()?;

        let Some(mut record) = record else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(queries::SELECT_PARTS)?;
        let rows = stmt.query_map(params![cmd_id], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        for row in rows {
            let (part_index, kind, status) = row?;
            record.parts.push(PartCell {
                part_index,
                kind: kind.parse()?,
                status: PartStatus::parse(&status),
            });
        }
        Ok(Some(record))
    }

    /// Apply a sent/delivered event to its cell.
    pub fn apply(&self, key: CorrelationKey, ok: bool) -> Result<DeliveryProgress, TrackingError> {
        let record = self
            .record(key.cmd_id)?
            .ok_or(TrackingError::UnknownCommand(key.cmd_id))?;

        if key.part_index >= record.part_count {
            return Err(TrackingError::PartOutOfRange {
                cmd_id: key.cmd_id,
                part_index: key.part_index,
                part_count: record.part_count,
            });
        }
        if !record.tracks(key.kind) {
            return Err(TrackingError::KindNotTracked {
                cmd_id: key.cmd_id,
                kind: key.kind,
            });
        }

        let status = if ok { PartStatus::Ok } else { PartStatus::Failed };
        let conn = self.db.lock();
        conn.execute(
            queries::UPSERT_PART,
            params![
                key.cmd_id,
                key.part_index,
                key.kind.as_str(),
                status.as_str(),
                chrono::Utc::now().to_rfc3339()
            ],
        )?;

        let (completed, failed) = conn.query_row(
            queries::SELECT_PART_PROGRESS,
            params![key.cmd_id, key.kind.as_str()],
            |row| Ok((row.get::<_, u32>(0)?, row.get::<_, u32>(1)?)),
        )?;

        let progress = DeliveryProgress {
            cmd_id: key.cmd_id,
            kind: key.kind,
            receiver: record.receiver,
            completed,
            failed,
            total: record.part_count,
        };
        tracing::debug!(?key, ?status, completed, total = progress.total, "delivery event applied");
        Ok(progress)
    }

    /// Mark every tracked cell of parts `first_unsent..part_count` failed.
    /// Used when the transport stopped before handing over all parts.
    /// Returns the number of cells changed.
    pub fn fail_unsent(&self, cmd_id: CommandId, first_unsent: u32) -> Result<u32, TrackingError> {
        let record = self
            .record(cmd_id)?
            .ok_or(TrackingError::UnknownCommand(cmd_id))?;
        let kinds: Vec<EventKind> = [EventKind::Sent, EventKind::Delivered]
            .into_iter()
            .filter(|kind| record.tracks(*kind))
            .collect();

        let updated_at = chrono::Utc::now().to_rfc3339();
        let mut conn = self.db.lock();
        let tx = conn.transaction()?;
        let mut changed = 0;
        for part_index in first_unsent..record.part_count {
            for kind in &kinds {
                tx.execute(
                    queries::UPSERT_PART,
                    params![
                        cmd_id,
                        part_index,
                        kind.as_str(),
                        PartStatus::Failed.as_str(),
                        updated_at
                    ],
                )?;
                changed += 1;
            }
        }
        tx.commit()?;

        tracing::debug!(cmd_id, first_unsent, changed, "unsent parts marked failed");
        Ok(changed)
    }

    /// Parse a token and apply its event.
    pub fn apply_token(&self, token: &str, ok: bool) -> Result<DeliveryProgress, TrackingError> {
        let token: CallbackToken = token.parse()?;
        self.apply(token.key, ok)
    }
}
