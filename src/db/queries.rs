//! SQL for the module database.
//!
//! CHANGELOG:
//! - 04/02/2026 - recent_contact and counters tables
//! - 02/02/2026 - Initial schema (sms, sms_part, sms_history)

/// Schema, idempotent.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sms (
    cmd_id          INTEGER PRIMARY KEY,
    receiver        TEXT    NOT NULL,
    preview         TEXT    NOT NULL,
    part_count      INTEGER NOT NULL,
    track_sent      INTEGER NOT NULL,
    track_delivered INTEGER NOT NULL,
    created_at      TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS sms_part (
    cmd_id     INTEGER NOT NULL REFERENCES sms(cmd_id) ON DELETE CASCADE,
    part_index INTEGER NOT NULL,
    kind       TEXT    NOT NULL,
    status     TEXT    NOT NULL,
    updated_at TEXT    NOT NULL,
    PRIMARY KEY (cmd_id, part_index, kind)
);

CREATE TABLE IF NOT EXISTS sms_history (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    cmd_id     INTEGER NOT NULL,
    receiver   TEXT    NOT NULL,
    body       TEXT    NOT NULL,
    direction  TEXT    NOT NULL,
    created_at TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS recent_contact (
    slot         INTEGER PRIMARY KEY CHECK (slot = 0),
    contact_info TEXT    NOT NULL,
    contact_json TEXT,
    updated_at   TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS counters (
    name  TEXT    PRIMARY KEY,
    value INTEGER NOT NULL
);
"#;

// ============================================================================
// Delivery tracking
// ============================================================================

/// Replaces any previous record for the same command id.
pub const INSERT_SMS: &str = r#"
INSERT OR REPLACE INTO sms (cmd_id, receiver, preview, part_count, track_sent, track_delivered, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

pub const DELETE_PARTS: &str = "DELETE FROM sms_part WHERE cmd_id = ?1";

/// Last write wins per (cmd_id, part_index, kind).
pub const UPSERT_PART: &str = r#"
INSERT INTO sms_part (cmd_id, part_index, kind, status, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT (cmd_id, part_index, kind) DO UPDATE SET
    status = excluded.status,
    updated_at = excluded.updated_at
"#;

pub const SELECT_SMS: &str = r#"
SELECT cmd_id, receiver, preview, part_count, track_sent, track_delivered, created_at
FROM sms
WHERE cmd_id = ?1
"#;

pub const SELECT_PARTS: &str = r#"
SELECT part_index, kind, status
FROM sms_part
WHERE cmd_id = ?1
ORDER BY part_index, kind
"#;

/// Completed/failed counts for one event kind.
pub const SELECT_PART_PROGRESS: &str = r#"
SELECT
    COALESCE(SUM(CASE WHEN status != 'pending' THEN 1 ELSE 0 END), 0),
    COALESCE(SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END), 0)
FROM sms_part
WHERE cmd_id = ?1 AND kind = ?2
"#;

// ============================================================================
// History
// ============================================================================

pub const INSERT_HISTORY: &str = r#"
INSERT INTO sms_history (cmd_id, receiver, body, direction, created_at)
VALUES (?1, ?2, ?3, ?4, ?5)
"#;

pub const SELECT_HISTORY: &str = r#"
SELECT cmd_id, receiver, body, direction, created_at
FROM sms_history
ORDER BY id DESC
LIMIT ?1
"#;

// ============================================================================
// Recent contact / counters
// ============================================================================

pub const UPSERT_RECENT_CONTACT: &str = r#"
INSERT INTO recent_contact (slot, contact_info, contact_json, updated_at)
VALUES (0, ?1, ?2, ?3)
ON CONFLICT (slot) DO UPDATE SET
    contact_info = excluded.contact_info,
    contact_json = excluded.contact_json,
    updated_at = excluded.updated_at
"#;

pub const SELECT_RECENT_CONTACT: &str =
    "SELECT contact_info, contact_json FROM recent_contact WHERE slot = 0";

pub const BUMP_COUNTER: &str = r#"
INSERT INTO counters (name, value) VALUES (?1, 1)
ON CONFLICT (name) DO UPDATE SET value = value + 1
"#;

pub const SELECT_COUNTER: &str = "SELECT value FROM counters WHERE name = ?1";

pub const SET_COUNTER: &str = r#"
INSERT INTO counters (name, value) VALUES (?1, ?2)
ON CONFLICT (name) DO UPDATE SET value = excluded.value
"#;
