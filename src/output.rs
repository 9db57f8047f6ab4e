//! Output formatting for CLI results.
//!
//! CHANGELOG:
//! - 04/02/2026 - Reply and delivery record rendering
//! - 02/02/2026 - Initial implementation

use serde::Serialize;
use serde_json::json;

use crate::reply::{Reply, ReplyElement};
use crate::sms::tracker::DeliveryRecord;

/// Output control settings from CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputControls {
    pub json: bool,
    pub compact: bool,
}

impl OutputControls {
    /// Serialize data according to output controls.
    pub fn emit<T: Serialize>(&self, data: &T) -> String {
        let rendered = if self.compact {
            serde_json::to_string(data)
        } else {
            serde_json::to_string_pretty(data)
        };
        rendered.unwrap_or_else(|e| format_error(&e.to_string()))
    }

    /// Print data as JSON to stdout.
    pub fn print<T: Serialize>(&self, data: &T) {
        println!("{}", self.emit(data));
    }

    /// Print a reply: JSON when requested, otherwise its text.
    pub fn print_reply(&self, reply: &Reply) {
        if self.json {
            self.print(reply);
        } else {
            println!("{}", render_reply(reply));
        }
    }

    pub fn print_record(&self, record: &DeliveryRecord) {
        if self.json {
            self.print(record);
        } else {
            println!("{}", render_record(record));
        }
    }
}

/// Plain-text rendering of a reply.
pub fn render_reply(reply: &Reply) -> String {
    let mut out = reply.text.clone();
    for element in &reply.elements {
        match element {
            ReplyElement::SmsSending { sms, .. } => {
                out.push_str(&format!("\n  [command {}]", sms.cmd_id()));
            }
        }
    }
    out
}

/// Plain-text rendering of a delivery record.
pub fn render_record(record: &DeliveryRecord) -> String {
    let mut out = format!(
        "Command {} -> {} \"{}\" ({} part{})",
        record.cmd_id,
        record.receiver,
        record.preview,
        record.part_count,
        if record.part_count == 1 { "" } else { "s" }
    );
    for cell in &record.parts {
        out.push_str(&format!(
            "\n  part {} {}: {}",
            cell.part_index + 1,
            cell.kind,
            cell.status.as_str()
        ));
    }
    out
}

/// Format error as JSON.
pub fn format_error(error: &str) -> String {
    json!({
        "error": error,
        "success": false
    })
    .to_string()
}
