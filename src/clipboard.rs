//! Clipboard module - read the current clipboard text.
//!
//! Uses a paste program (pbpaste, xclip) as the platform clipboard service.
//!
//! CHANGELOG:
//! - 05/02/2026 - Initial implementation

use anyhow::{anyhow, Context, Result};
use std::process::Command as Process;
use std::sync::Arc;

use crate::error::DispatchError;
use crate::module::Command;
use crate::reply::Reply;

/// Platform clipboard service.
pub trait ClipboardService: Send + Sync {
    /// Current clipboard text, `None` if the clipboard holds no text.
    fn text(&self) -> Result<Option<String>>;
}

/// Clipboard read through an external paste program.
pub struct ProgramClipboard {
    program: String,
    args: Vec<String>,
}

impl ProgramClipboard {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl ClipboardService for ProgramClipboard {
    fn text(&self) -> Result<Option<String>> {
        let output = Process::new(&self.program)
            .args(&self.args)
            .output()
            .with_context(|| format!("Failed to run clipboard program '{}'", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("clipboard program failed: {}", stderr.trim()));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        Ok((!text.is_empty()).then_some(text))
    }
}

/// `clipboard get` handler.
pub struct ClipboardCommand {
    service: Arc<dyn ClipboardService>,
}

impl ClipboardCommand {
    pub fn new(service: Arc<dyn ClipboardService>) -> Self {
        Self { service }
    }

    pub fn execute(&self, command: &Command) -> Result<Reply, DispatchError> {
        if command.command != "clipboard" || command.sub_command != "get" {
            return Err(DispatchError::UnknownSubCommand {
                command: command.command.clone(),
                sub_command: command.sub_command.clone(),
            });
        }

        let reply = match self.service.text() {
            Ok(Some(text)) => Reply::text(text),
            Ok(None) => Reply::text("Clipboard is empty"),
            Err(e) => {
                tracing::warn!("clipboard read failed: {:#}", e);
                Reply::text(format!("Unable to read clipboard: {:#}", e))
            }
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClipboard(Option<&'static str>);

    impl ClipboardService for FixedClipboard {
        fn text(&self) -> Result<Option<String>> {
            Ok(self.0.map(String::from))
        }
    }

    fn get() -> Command {
        Command::new(1, "clipboard", "get", "")
    }

    #[test]
    fn test_reads_clipboard() {
        let cmd = ClipboardCommand::new(Arc::new(FixedClipboard(Some("copied text"))));
        assert_eq!(cmd.execute(&get()).unwrap().text, "copied text");
    }

    #[test]
    fn test_empty_clipboard() {
        let cmd = ClipboardCommand::new(Arc::new(FixedClipboard(None)));
        assert_eq!(cmd.execute(&get()).unwrap().text, "Clipboard is empty");
    }

    #[test]
    fn test_unknown_sub_command() {
        let cmd = ClipboardCommand::new(Arc::new(FixedClipboard(None)));
        assert!(cmd
            .execute(&Command::new(1, "clipboard", "set", "x"))
            .is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_program_clipboard() {
        let service = ProgramClipboard::new("printf", vec!["hello".into()]);
        assert_eq!(service.text().unwrap().as_deref(), Some("hello"));

        let empty = ProgramClipboard::new("true", Vec::new());
        assert_eq!(empty.text().unwrap(), None);

        let failing = ProgramClipboard::new("false", Vec::new());
        assert!(failing.text().is_err());
    }
}
