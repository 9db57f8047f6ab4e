//! Module service - wires settings, database and collaborators together and
//! routes command lines to the SMS and clipboard handlers.
//!
//! Shared by the one-shot CLI and the daemon.
//!
//! CHANGELOG:
//! - 06/02/2026 - Request codes continue across runs
//! - 05/02/2026 - Clipboard routing
//! - 04/02/2026 - Initial implementation

use anyhow::Result;
use std::sync::Arc;

use crate::clipboard::{ClipboardCommand, ProgramClipboard};
use crate::config::{RuntimeConfig, Settings};
use crate::contacts::manager::ContactsManager;
use crate::contacts::{ContactResolver, RecentContactStore};
use crate::db::connection::Database;
use crate::module::{self, Command};
use crate::reply::Reply;
use crate::sms::history::{HistoryEntry, SqliteHistory};
use crate::sms::resolver::CommandResolver;
use crate::sms::tracker::{CommandId, DeliveryProgress, DeliveryRecord, DeliveryTracker};
use crate::sms::transport::GatewayTransport;
use crate::sms::SmsDispatchOrchestrator;

pub struct ModuleService {
    db: Database,
    sms: SmsDispatchOrchestrator,
    clipboard: ClipboardCommand,
    tracker: DeliveryTracker,
    history: Arc<SqliteHistory>,
    contacts_loaded: Option<usize>,
}

impl ModuleService {
    /// Build the service from settings. A contacts file that cannot be loaded
    /// leaves the module without a contact resolver.
    pub fn from_settings(settings: &Settings, recent: Arc<dyn RecentContactStore>) -> Result<Self> {
        let db = Database::open(settings.database_path())?;
        Ok(Self::with_database(settings, db, recent))
    }

    /// Build on an open database, loading contacts from settings.
    pub fn with_database(
        settings: &Settings,
        db: Database,
        recent: Arc<dyn RecentContactStore>,
    ) -> Self {
        let contacts = match ContactsManager::load(settings.contacts_path()) {
            Ok(manager) => Some(manager),
            Err(e) => {
                tracing::warn!("contacts unavailable: {:#}", e);
                None
            }
        };
        Self::assemble(settings, db, contacts, recent)
    }

    /// Build from already opened parts.
    pub fn assemble(
        settings: &Settings,
        db: Database,
        contacts: Option<ContactsManager>,
        recent: Arc<dyn RecentContactStore>,
    ) -> Self {
        let contacts_loaded = contacts.as_ref().map(|c| c.all().len());
        let resolver = CommandResolver::new(
            contacts.map(|c| Arc::new(c) as Arc<dyn ContactResolver>),
            recent,
        );

        let tracker = DeliveryTracker::new(db.clone());
        let history = Arc::new(SqliteHistory::new(db.clone()));
        let transport = Arc::new(GatewayTransport::new(
            settings.gateway_program.clone(),
            settings.gateway_args.clone(),
        ));

        let sms = SmsDispatchOrchestrator::new(
            resolver,
            transport,
            Arc::new(RuntimeConfig::new(settings).with_database(db.clone())),
        )
        .with_tracker(tracker.clone())
        .with_history(history.clone());

        let clipboard = ClipboardCommand::new(Arc::new(ProgramClipboard::new(
            settings.clipboard_program.clone(),
            settings.clipboard_args.clone(),
        )));

        Self {
            db,
            sms,
            clipboard,
            tracker,
            history,
            contacts_loaded,
        }
    }

    /// Number of loaded contacts, `None` when no contacts are available.
    pub fn contacts_loaded(&self) -> Option<usize> {
        self.contacts_loaded
    }

    /// Route and execute a command line under a fresh command id.
    pub fn handle_line(&self, line: &str) -> Result<(CommandId, Reply)> {
        let id = self.db.next_command_id()?;
        let Some(command) = module::route(id, line) else {
            return Ok((id, Reply::text(format!("Unknown command: {}", line.trim()))));
        };
        Ok((id, self.handle(&command)?))
    }

    /// Execute a routed command.
    pub fn handle(&self, command: &Command) -> Result<Reply> {
        let reply = match command.command.as_str() {
            "clipboard" => self.clipboard.execute(command)?,
            _ => self.sms.dispatch(command)?,
        };
        Ok(reply)
    }

    /// Apply a sent/delivered event reported by the gateway.
    pub fn delivery_event(&self, token: &str, ok: bool) -> Result<DeliveryProgress> {
        let progress = self.tracker.apply_token(token, ok)?;
        if let Some(notification) = progress.notification() {
            tracing::info!(cmd_id = progress.cmd_id, "{}", notification);
        }
        Ok(progress)
    }

    pub fn delivery_status(&self, cmd_id: CommandId) -> Result<Option<DeliveryRecord>> {
        Ok(self.tracker.record(cmd_id)?)
    }

    pub fn history(&self, limit: u32) -> Result<Vec<HistoryEntry>> {
        self.history.recent(limit)
    }
}
