//! Module command tables and command-line routing.
//!
//! A command line is `<command> [<sub-command>] [args]`. The command word may
//! be the full or the short name. When the next word is not a known
//! sub-command, the default sub-command applies (one for "with arguments",
//! one for "without").
//!
//! CHANGELOG:
//! - 05/02/2026 - Clipboard module table
//! - 02/02/2026 - Initial implementation

use serde::Serialize;

use crate::sms::tracker::CommandId;

/// One command provided by a module.
#[derive(Debug, Clone, Copy)]
pub struct CommandInfo {
    pub name: &'static str,
    pub short: &'static str,
    pub default_sub_without_args: Option<&'static str>,
    pub default_sub_with_args: Option<&'static str>,
    pub sub_commands: &'static [&'static str],
}

/// Registration metadata of a module.
#[derive(Debug, Clone, Copy)]
pub struct ModuleInformation {
    pub package: &'static str,
    pub name: &'static str,
    pub commands: &'static [CommandInfo],
}

pub const SMSSEND_MODULE: ModuleInformation = ModuleInformation {
    package: "org.projectmaxs.module.smssend",
    name: "smssend",
    commands: &[
        CommandInfo {
            name: "sms",
            short: "s",
            default_sub_without_args: None,
            default_sub_with_args: None,
            sub_commands: &["send"],
        },
        CommandInfo {
            name: "reply",
            short: "r",
            default_sub_without_args: None,
            default_sub_with_args: Some("to"),
            sub_commands: &["to"],
        },
    ],
};

pub const CLIPBOARD_MODULE: ModuleInformation = ModuleInformation {
    package: "org.projectmaxs.module.clipboard",
    name: "clipboard",
    commands: &[CommandInfo {
        name: "clipboard",
        short: "c",
        default_sub_without_args: Some("get"),
        default_sub_with_args: None,
        sub_commands: &["get"],
    }],
};

/// A routed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub id: CommandId,
    pub command: String,
    pub sub_command: String,
    pub args: String,
}

impl Command {
    pub fn new(
        id: CommandId,
        command: impl Into<String>,
        sub_command: impl Into<String>,
        args: impl Into<String>,
    ) -> Self {
        Self {
            id,
            command: command.into(),
            sub_command: sub_command.into(),
            args: args.into(),
        }
    }
}

/// Split off the first word. The remainder keeps its inner spacing.
fn next_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(' ') {
        Some((word, rest)) => (word, rest),
        None => (s, ""),
    }
}

impl ModuleInformation {
    /// Look up a command by full or short name.
    pub fn command(&self, word: &str) -> Option<&CommandInfo> {
        self.commands
            .iter()
            .find(|c| c.name == word || c.short == word)
    }

    /// Route a command line to this module. `None` if the command is not
    /// ours or no sub-command applies.
    pub fn route(&self, id: CommandId, line: &str) -> Option<Command> {
        let (word, rest) = next_word(line);
        let info = self.command(&word.to_lowercase())?;

        let (sub, sub_rest) = next_word(rest);
        let (sub_command, args) = if info.sub_commands.iter().any(|s| *s == sub) {
            (sub, sub_rest)
        } else if rest.trim().is_empty() {
            (info.default_sub_without_args?, "")
        } else {
            (info.default_sub_with_args?, rest.trim_start())
        };

        tracing::debug!(command = info.name, sub_command, "routed command");
        Some(Command::new(id, info.name, sub_command, args))
    }
}

/// Route against every module of this crate.
pub fn route(id: CommandId, line: &str) -> Option<Command> {
    [SMSSEND_MODULE, CLIPBOARD_MODULE]
        .iter()
        .find_map(|module| module.route(id, line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_sms_send_keeps_double_space() {
        let cmd = route(1, "sms send Jane Doe  Running late").unwrap();
        assert_eq!(cmd, Command::new(1, "sms", "send", "Jane Doe  Running late"));
    }

    #[test]
    fn test_route_short_name() {
        let cmd = route(2, "s send Jane  hi").unwrap();
        assert_eq!(cmd.command, "sms");
        assert_eq!(cmd.sub_command, "send");
    }

    #[test]
    fn test_route_reply_default_sub_command() {
        let cmd = route(3, "reply On my way").unwrap();
        assert_eq!(cmd, Command::new(3, "reply", "to", "On my way"));

        let cmd = route(4, "r to On my way").unwrap();
        assert_eq!(cmd, Command::new(4, "reply", "to", "On my way"));
    }

    #[test]
    fn test_route_clipboard_without_args() {
        let cmd = route(5, "clipboard").unwrap();
        assert_eq!(cmd, Command::new(5, "clipboard", "get", ""));
        assert_eq!(route(6, "c get").unwrap().sub_command, "get");
    }

    #[test]
    fn test_route_unknown() {
        assert!(route(7, "wifi on").is_none());
        assert!(route(8, "").is_none());
        // sms has no default sub-command
        assert!(route(9, "sms Jane  hi").is_none());
        assert!(route(10, "reply").is_none());
    }
}
