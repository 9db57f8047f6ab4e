//! maxs-smssend - one-shot CLI for the SMS send module
//!
//! Runs a single command line (or a convenience subcommand) through the
//! module service, with the recent contact persisted in the local database.
//!
//! CHANGELOG:
//! - 05/02/2026 - Clipboard, event and status subcommands
//! - 02/02/2026 - Initial CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;

use maxs_smssend::config::Settings;
use maxs_smssend::contacts::manager::ContactsManager;
use maxs_smssend::contacts::recent::SqliteRecentContacts;
use maxs_smssend::db::connection::Database;
use maxs_smssend::output::OutputControls;
use maxs_smssend::service::ModuleService;
use maxs_smssend::sms::resolver::SEND_SEPARATOR;

/// SMS send module - contact resolution, multipart sending and delivery tracking.
#[derive(Parser, Debug)]
#[command(name = "maxs-smssend")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Compact JSON output (no whitespace)
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a raw module command line, e.g. `sms send Jane  Running late`
    Run {
        /// Command line words
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        line: Vec<String>,
    },

    /// Send a message to a contact name or number
    Send {
        /// Contact name or phone number
        contact: String,

        /// Message to send
        message: Vec<String>,
    },

    /// Reply to the most recent contact
    Reply {
        /// Message to send
        message: Vec<String>,
    },

    /// Print the clipboard text
    Clipboard,

    /// Report a sent/delivered event from the gateway
    Event {
        /// Callback token (kind:cmd_id:part:request_code)
        token: String,

        /// The event reports a failure
        #[arg(long)]
        failed: bool,
    },

    /// Show delivery status of a command
    Status {
        /// Command id
        cmd_id: i64,
    },

    /// Show recently sent messages
    History {
        /// Max entries
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },

    /// List all contacts
    Contacts,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let output_controls = OutputControls {
        json: cli.json,
        compact: cli.compact,
    };

    match run(cli.command, &output_controls) {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(command: Command, output: &OutputControls) -> Result<()> {
    let settings = Settings::load_default()?;

    if let Command::Contacts = command {
        let manager = ContactsManager::load(settings.contacts_path())?;
        output.print(&manager.all());
        return Ok(());
    }

    let db = Database::open(settings.database_path())?;
    let recent = Arc::new(SqliteRecentContacts::new(db.clone()));
    let service = ModuleService::with_database(&settings, db, recent);

    match command {
        Command::Run { line } => run_line(&service, &line.join(" "), output),
        Command::Send { contact, message } => {
            let line = format!("sms send {}{}{}", contact, SEND_SEPARATOR, message.join(" "));
            run_line(&service, &line, output)
        }
        Command::Reply { message } => {
            run_line(&service, &format!("reply to {}", message.join(" ")), output)
        }
        Command::Clipboard => run_line(&service, "clipboard", output),
        Command::Event { token, failed } => {
            let progress = service.delivery_event(&token, !failed)?;
            if output.json {
                output.print(&progress);
            } else if let Some(notification) = progress.notification() {
                println!("{}", notification);
            } else {
                println!(
                    "{} {} of {} part(s) reported",
                    progress.kind, progress.completed, progress.total
                );
            }
            Ok(())
        }
        Command::Status { cmd_id } => {
            match service.delivery_status(cmd_id)? {
                Some(record) => output.print_record(&record),
                None => anyhow::bail!("no delivery record for command {}", cmd_id),
            }
            Ok(())
        }
        Command::History { limit } => {
            output.print(&service.history(limit)?);
            Ok(())
        }
        Command::Contacts => Ok(()),
    }
}

fn run_line(service: &ModuleService, line: &str, output: &OutputControls) -> Result<()> {
    let (cmd_id, reply) = service.handle_line(line)?;
    tracing::debug!(cmd_id, "command handled");
    output.print_reply(&reply);
    Ok(())
}
