//! maxs-smssend-client - Thin client for daemon mode.
//!
//! `maxs-smssend-client command --params '{"line": "sms send Jane  hi"}'`
//!
//! CHANGELOG:
//! - 04/02/2026 - Initial implementation

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use maxs_smssend::config::Settings;
use maxs_smssend::daemon::protocol::{Request, Response};

#[derive(Parser)]
#[command(name = "maxs-smssend-client")]
#[command(about = "Thin client for the maxs-smssend daemon")]
struct Cli {
    /// Method to call (health, command, delivery_event, delivery_status)
    method: String,

    /// Socket path (default: settings socket_path)
    #[arg(long)]
    socket: Option<String>,

    /// JSON parameters (as string)
    #[arg(long)]
    params: Option<String>,

    /// Request timeout (seconds)
    #[arg(long, default_value = "5.0")]
    timeout: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let params: HashMap<String, serde_json::Value> = match cli.params {
        Some(p) => serde_json::from_str(&p).context("--params must be a JSON object")?,
        None => HashMap::new(),
    };
    let request = Request::new(cli.method, params);

    let socket_path = match cli.socket {
        Some(socket) => shellexpand::tilde(&socket).to_string(),
        None => Settings::load_default()?.socket_path(),
    };
    let stream = UnixStream::connect(&socket_path)
        .with_context(|| format!("Daemon not reachable at {}", socket_path))?;

    let timeout = Some(Duration::from_secs_f64(cli.timeout));
    stream.set_read_timeout(timeout)?;
    stream.set_write_timeout(timeout)?;

    (&stream).write_all(request.to_ndjson_line()?.as_bytes())?;

    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    reader.read_line(&mut response_line)?;
    let response = Response::from_ndjson_line(&response_line)?;

    if response.ok {
        let result = response.result.unwrap_or(serde_json::Value::Null);
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    } else {
        let message = response
            .error
            .map(|e| format!("{}: {}", e.code, e.message))
            .unwrap_or_else(|| "unknown".to_string());
        bail!(message)
    }
}
