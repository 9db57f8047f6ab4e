//! maxs-smssend-daemon - Persistent daemon with hot resources.
//!
//! Keeps the database, contacts and the recent contact slot alive between
//! commands. The socket defaults to `socket_path` from the settings file.
//!
//! CHANGELOG:
//! - 04/02/2026 - Initial implementation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;

use maxs_smssend::config::Settings;
use maxs_smssend::daemon::server::DaemonServer;
use maxs_smssend::daemon::service::DaemonService;

#[derive(Parser)]
#[command(name = "maxs-smssend-daemon")]
#[command(about = "Persistent daemon for the MAXS SMS send module")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon
    Start {
        /// Socket path (default: settings socket_path)
        #[arg(long)]
        socket: Option<String>,

        /// Run in foreground (don't daemonize)
        #[arg(long)]
        foreground: bool,
    },

    /// Stop the daemon
    Stop {
        #[arg(long)]
        socket: Option<String>,
    },

    /// Check daemon status
    Status {
        #[arg(long)]
        socket: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load_default()?;

    match cli.command {
        Commands::Start { socket, foreground } => {
            let socket_path = resolve_socket(&settings, socket);
            cmd_start(&settings, socket_path, foreground)
        }
        Commands::Stop { socket } => cmd_stop(resolve_socket(&settings, socket)),
        Commands::Status { socket } => cmd_status(resolve_socket(&settings, socket)),
    }
}

fn resolve_socket(settings: &Settings, socket: Option<String>) -> String {
    match socket {
        Some(socket) => shellexpand::tilde(&socket).to_string(),
        None => settings.socket_path(),
    }
}

fn serve(settings: &Settings, socket_path: &str) -> Result<()> {
    let service = DaemonService::new(settings)?;
    DaemonServer::new(service, socket_path).serve()
}

fn cmd_start(settings: &Settings, socket_path: String, foreground: bool) -> Result<()> {
    // Create parent directory if needed
    if let Some(parent) = Path::new(&socket_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    if foreground {
        tracing::info!("starting in foreground");
        return serve(settings, &socket_path);
    }

    use daemonize::Daemonize;

    let pid_file = format!("{}.pid", socket_path);
    let daemonize = Daemonize::new()
        .pid_file(&pid_file)
        .working_directory("/tmp");

    match daemonize.start() {
        // Child process: run server
        Ok(_) => serve(settings, &socket_path),
        Err(e) => {
            eprintln!("Failed to daemonize: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_stop(socket_path: String) -> Result<()> {
    let pid_file = format!("{}.pid", socket_path);

    let pid_str = std::fs::read_to_string(&pid_file)
        .with_context(|| format!("No pid file at {}", pid_file))?;
    let pid: i32 = pid_str.trim().parse()?;

    // SAFETY: plain signal delivery to a pid read from our own pid file.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc != 0 {
        tracing::warn!(pid, "SIGTERM failed: {}", std::io::Error::last_os_error());
    }

    let _ = std::fs::remove_file(&pid_file);
    let _ = std::fs::remove_file(&socket_path);

    println!("Daemon stopped (pid {})", pid);
    Ok(())
}

fn cmd_status(socket_path: String) -> Result<()> {
    match std::os::unix::net::UnixStream::connect(&socket_path) {
        Ok(_) => {
            println!("Daemon running at {}", socket_path);
            Ok(())
        }
        Err(_) => {
            println!("Daemon not running");
            std::process::exit(1);
        }
    }
}
