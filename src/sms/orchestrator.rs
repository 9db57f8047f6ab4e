//! SMS dispatch: resolve -> split -> track -> send -> archive -> reply.
//!
//! Every user-level failure comes back as reply text. Only a sub-command
//! this module does not serve is returned as an error.
//!
//! CHANGELOG:
//! - 06/02/2026 - Partial sends archived and reported, unsent parts failed
//! - 05/02/2026 - Transport failures reported as reply text
//! - 04/02/2026 - Tracking setup failures no longer block the send
//! - 03/02/2026 - Initial implementation

use anyhow::Result;
use std::sync::Arc;

use super::history::{MessageHistory, OutboundMessage};
use super::resolver::{CommandResolver, Resolution, SubCommand};
use super::tracker::{preview, CallbackToken, CommandId, DeliveryTracker, EventKind};
use super::transport::SmsTransport;
use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::module::Command;
use crate::reply::{Reply, ReplyElement};

/// Result of handing a message to the transport.
enum SendOutcome {
    Sent(OutboundMessage),
    Partial {
        sms: OutboundMessage,
        sent_parts: u32,
        part_count: u32,
        error: String,
    },
    Failed(String),
}

pub struct SmsDispatchOrchestrator {
    resolver: CommandResolver,
    transport: Arc<dyn SmsTransport>,
    config: Arc<dyn DispatchConfig>,
    tracker: Option<DeliveryTracker>,
    history: Option<Arc<dyn MessageHistory>>,
}

impl SmsDispatchOrchestrator {
    pub fn new(
        resolver: CommandResolver,
        transport: Arc<dyn SmsTransport>,
        config: Arc<dyn DispatchConfig>,
    ) -> Self {
        Self {
            resolver,
            transport,
            config,
            tracker: None,
            history: None,
        }
    }

    pub fn with_tracker(mut self, tracker: DeliveryTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn with_history(mut self, history: Arc<dyn MessageHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn tracker(&self) -> Option<&DeliveryTracker> {
        self.tracker.as_ref()
    }

    /// Handle a routed `sms send` / `reply to` command.
    pub fn dispatch(&self, command: &Command) -> Result<Reply, DispatchError> {
        let sub_command = SubCommand::from_command(&command.command, &command.sub_command)?;

        let Resolution {
            receiver,
            text,
            contact,
        } = match self.resolver.resolve(sub_command, &command.args) {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::info!(cmd_id = command.id, "not sending SMS: {}", e);
                return Ok(e.into());
            }
        };

        let contact_string = match &contact.display_name {
            Some(name) => format!("{} ( {} )", name, receiver),
            None => receiver.clone(),
        };

        let reply = match self.send_sms(&receiver, &text, command.id) {
            SendOutcome::Sent(sms) => {
                Reply::text(format!("Sending SMS to {}: {}", contact_string, text))
                    .with_element(ReplyElement::SmsSending { sms, contact })
            }
            SendOutcome::Partial {
                sms,
                sent_parts,
                part_count,
                error,
            } => Reply::text(format!(
                "SMS to {} only partially sent ({} of {} parts): {}",
                contact_string, sent_parts, part_count, error
            ))
            .with_element(ReplyElement::SmsSending { sms, contact }),
            SendOutcome::Failed(error) => Reply::text(format!("Failed to send SMS: {}", error)),
        };
        Ok(reply)
    }

    /// Split, register tracking, send and archive. A message is archived as
    /// soon as at least one part went out.
    fn send_sms(&self, receiver: &str, text: &str, cmd_id: CommandId) -> SendOutcome {
        let parts = self.transport.divide_message(text);
        let part_count = parts.len() as u32;

        let (sent_tokens, delivered_tokens) =
            self.prepare_tracking(cmd_id, receiver, text, part_count);
        let tracked = !sent_tokens.is_empty() || !delivered_tokens.is_empty();

        let failure = match self
            .transport
            .send_parts(receiver, &parts, &sent_tokens, &delivered_tokens)
        {
            Ok(()) => None,
            Err(failure) => Some(failure),
        };

        let sms = OutboundMessage::new(receiver, text, cmd_id);
        let Some(failure) = failure else {
            tracing::info!(cmd_id, receiver, part_count, "SMS sent");
            self.archive(&sms);
            return SendOutcome::Sent(sms);
        };

        let sent_parts = failure.sent_parts.min(parts.len()) as u32;
        tracing::warn!(cmd_id, sent_parts, part_count, "SMS send failed: {}", failure);
        if tracked {
            if let Some(tracker) = &self.tracker {
                if let Err(e) = tracker.fail_unsent(cmd_id, sent_parts) {
                    tracing::warn!(cmd_id, "failed to mark unsent parts: {}", e);
                }
            }
        }

        if sent_parts == 0 {
            return SendOutcome::Failed(failure.message);
        }
        self.archive(&sms);
        SendOutcome::Partial {
            sms,
            sent_parts,
            part_count,
            error: failure.message,
        }
    }

    fn archive(&self, sms: &OutboundMessage) {
        if let Some(history) = &self.history {
            if let Err(e) = history.archive(sms) {
                tracing::warn!(cmd_id = sms.cmd_id(), "failed to archive SMS: {:#}", e);
            }
        }
    }

    /// Create the delivery record and callback tokens for the enabled kinds.
    /// Returns empty lists when tracking is off or cannot be set up.
    fn prepare_tracking(
        &self,
        cmd_id: CommandId,
        receiver: &str,
        text: &str,
        part_count: u32,
    ) -> (Vec<CallbackToken>, Vec<CallbackToken>) {
        let track_sent = self.config.notify_sent_enabled();
        let track_delivered = self.config.notify_delivered_enabled();
        if !track_sent && !track_delivered {
            return (Vec::new(), Vec::new());
        }

        let Some(tracker) = &self.tracker else {
            tracing::warn!(cmd_id, "delivery tracking enabled but no tracker, sending untracked");
            return (Vec::new(), Vec::new());
        };
        if let Err(e) = tracker.begin_tracking(
            cmd_id,
            receiver,
            &preview(text),
            part_count,
            track_sent,
            track_delivered,
        ) {
            tracing::warn!(cmd_id, "failed to set up delivery tracking, sending untracked: {}", e);
            return (Vec::new(), Vec::new());
        }

        let tokens_for = |kind: EventKind, enabled: bool| {
            if !enabled {
                return Vec::new();
            }
            let base = self.config.request_code_base(kind, part_count as usize);
            DeliveryTracker::make_callback_tokens(part_count, cmd_id, kind, base)
        };
        (
            tokens_for(EventKind::Sent, track_sent),
            tokens_for(EventKind::Delivered, track_delivered),
        )
    }
}
