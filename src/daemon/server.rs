//! UNIX socket server for daemon mode.
//!
//! Listens on a UNIX socket, accepts connections sequentially, and dispatches
//! one NDJSON request per connection to DaemonService. Sequential handling
//! serializes access to the recent contact slot and the database.
//!
//! CHANGELOG:
//! - 04/02/2026 - Initial implementation

use anyhow::Result;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::time::Instant;

use crate::daemon::{protocol, service::DaemonService};

pub struct DaemonServer {
    service: DaemonService,
    socket_path: String,
}

impl DaemonServer {
    pub fn new(service: DaemonService, socket_path: impl AsRef<Path>) -> Self {
        Self {
            service,
            socket_path: socket_path.as_ref().to_string_lossy().to_string(),
        }
    }

    /// Start serving requests (blocking).
    pub fn serve(&self) -> Result<()> {
        // Clean up stale socket
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;

        // Owner-only (0600)
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::info!(socket = %self.socket_path, "daemon listening");

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(e) = self.handle_connection(stream) {
                        tracing::warn!("connection error: {:#}", e);
                    }
                }
                Err(e) => tracing::warn!("accept error: {}", e),
            }
        }

        Ok(())
    }

    fn handle_connection(&self, stream: UnixStream) -> Result<()> {
        let mut writer = stream.try_clone()?;
        let mut reader = BufReader::new(&stream);

        let mut line = String::new();
        reader.read_line(&mut line)?;
        if line.trim().is_empty() {
            return Ok(()); // Client disconnected
        }

        let response = self.respond(&line);
        writer.write_all(response.to_ndjson_line()?.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Build the response for one request line.
    pub fn respond(&self, line: &str) -> protocol::Response {
        let start = Instant::now();
        let elapsed_ms = |start: Instant| start.elapsed().as_secs_f64() * 1000.0;

        let request = match protocol::Request::from_ndjson_line(line) {
            Ok(request) => request,
            Err(e) => {
                return protocol::Response::error(
                    String::new(),
                    protocol::CODE_BAD_REQUEST,
                    format!("{:#}", e),
                    elapsed_ms(start),
                )
            }
        };

        tracing::debug!(id = %request.id, method = %request.method, "request");
        match self.service.dispatch(&request) {
            Ok(result) => protocol::Response::success(request.id, result, elapsed_ms(start)),
            Err(e) => protocol::Response::error(request.id, e.code, e.message, elapsed_ms(start)),
        }
    }
}
