//! SMS transport - hands message parts to the platform's sending primitive.
//!
//! The gateway transport runs an external program once per part. Callback
//! tokens are passed through the environment so the gateway can report
//! sent/delivered events back (`maxs-smssend event <token>`).
//!
//! CHANGELOG:
//! - 06/02/2026 - Send failures report how many parts already went out
//! - 04/02/2026 - Gateway program transport
//! - 03/02/2026 - Initial trait

use anyhow::{anyhow, Context, Result};
use std::process::Command;
use thiserror::Error;

use super::splitter::{GsmSplitter, MessageSplitter};
use super::tracker::CallbackToken;

/// A send that stopped early. Parts before `sent_parts` were handed over.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SendFailure {
    pub sent_parts: usize,
    pub message: String,
}

impl SendFailure {
    pub fn new(sent_parts: usize, message: impl Into<String>) -> Self {
        Self {
            sent_parts,
            message: message.into(),
        }
    }
}

/// Transport collaborator.
pub trait SmsTransport: Send + Sync {
    /// Split `text` into parts using the transport's size limits.
    fn divide_message(&self, text: &str) -> Vec<String>;

    /// Send the ordered parts. Token lists are either empty or one per part.
    fn send_parts(
        &self,
        receiver: &str,
        parts: &[String],
        sent_tokens: &[CallbackToken],
        delivered_tokens: &[CallbackToken],
    ) -> Result<(), SendFailure>;
}

pub const ENV_PART_INDEX: &str = "MAXS_PART_INDEX";
pub const ENV_PART_COUNT: &str = "MAXS_PART_COUNT";
pub const ENV_SENT_TOKEN: &str = "MAXS_SENT_TOKEN";
pub const ENV_DELIVERED_TOKEN: &str = "MAXS_DELIVERED_TOKEN";

/// Sends each part through an external gateway program:
/// `<program> [args...] <receiver> <part>`.
pub struct GatewayTransport {
    program: String,
    args: Vec<String>,
    splitter: Box<dyn MessageSplitter>,
}

impl GatewayTransport {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            splitter: Box::new(GsmSplitter),
        }
    }

    pub fn with_splitter(mut self, splitter: Box<dyn MessageSplitter>) -> Self {
        self.splitter = splitter;
        self
    }

    fn send_part(
        &self,
        receiver: &str,
        part: &str,
        index: usize,
        count: usize,
        sent: Option<&CallbackToken>,
        delivered: Option<&CallbackToken>,
    ) -> Result<()> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(receiver)
            .arg(part)
            .env(ENV_PART_INDEX, index.to_string())
            .env(ENV_PART_COUNT, count.to_string());
        if let Some(token) = sent {
            command.env(ENV_SENT_TOKEN, token.to_string());
        }
        if let Some(token) = delivered {
            command.env(ENV_DELIVERED_TOKEN, token.to_string());
        }

        let output = command
            .output()
            .with_context(|| format!("Failed to run SMS gateway '{}'", self.program))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(anyhow!(
                "SMS gateway failed on part {}/{}: {}",
                index + 1,
                count,
                stderr.trim()
            ))
        }
    }
}

impl SmsTransport for GatewayTransport {
    fn divide_message(&self, text: &str) -> Vec<String> {
        self.splitter.split(text)
    }

    fn send_parts(
        &self,
        receiver: &str,
        parts: &[String],
        sent_tokens: &[CallbackToken],
        delivered_tokens: &[CallbackToken],
    ) -> Result<(), SendFailure> {
        for (index, part) in parts.iter().enumerate() {
            self.send_part(
                receiver,
                part,
                index,
                parts.len(),
                sent_tokens.get(index),
                delivered_tokens.get(index),
            )
            .map_err(|e| SendFailure::new(index, format!("{:#}", e)))?;
        }
        tracing::info!(receiver, parts = parts.len(), "SMS handed to gateway");
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::sms::tracker::{DeliveryTracker, EventKind};

    #[test]
    fn test_gateway_receives_receiver_part_and_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("gateway.log");
        let script = format!(
            r#"echo "$1|$2|$MAXS_PART_INDEX/$MAXS_PART_COUNT|$MAXS_SENT_TOKEN|$MAXS_DELIVERED_TOKEN" >> {}"#,
            log.display()
        );
        let transport = GatewayTransport::new("sh", vec!["-c".into(), script, "gateway".into()]);

        let parts = vec!["Running".to_string(), "late".to_string()];
        let sent = DeliveryTracker::make_callback_tokens(2, 42, EventKind::Sent, 1000);
        transport.send_parts("555-1234", &parts, &sent, &[]).unwrap();

        let lines = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = lines.lines().collect();
        assert_eq!(
            lines,
            vec![
                "555-1234|Running|0/2|sent:42:0:1000|",
                "555-1234|late|1/2|sent:42:1:1001|",
            ]
        );
    }

    #[test]
    fn test_gateway_failure_is_error() {
        let transport = GatewayTransport::new("sh", vec!["-c".into(), "exit 3".into()]);
        let failure = transport
            .send_parts("555-1234", &["hi".to_string()], &[], &[])
            .unwrap_err();
        assert_eq!(failure.sent_parts, 0);
    }

    #[test]
    fn test_failure_mid_message_counts_sent_parts() {
        let script = r#"test "$MAXS_PART_INDEX" != 2"#.to_string();
        let transport = GatewayTransport::new("sh", vec!["-c".into(), script, "gateway".into()]);
        let parts: Vec<String> = ["one", "two", "three", "four"].map(String::from).to_vec();

        let failure = transport.send_parts("555-1234", &parts, &[], &[]).unwrap_err();
        assert_eq!(failure.sent_parts, 2);
        assert!(failure.message.contains("part 3/4"), "{}", failure.message);
    }

    /// One part per word.
    struct WordSplitter;

    impl MessageSplitter for WordSplitter {
        fn split(&self, text: &str) -> Vec<String> {
            text.split_whitespace().map(String::from).collect()
        }
    }

    #[test]
    fn test_custom_splitter() {
        let transport = GatewayTransport::new("true", Vec::new());
        assert_eq!(transport.divide_message("Running late").len(), 1);

        let transport = transport.with_splitter(Box::new(WordSplitter));
        assert_eq!(
            transport.divide_message("Running late today"),
            vec!["Running", "late", "today"]
        );
    }

    #[test]
    fn test_missing_program_is_error() {
        let transport = GatewayTransport::new("/nonexistent/maxs-gateway", Vec::new());
        assert!(transport
            .send_parts("555-1234", &["hi".to_string()], &[], &[])
            .is_err());
    }
}
