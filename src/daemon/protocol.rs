//! Daemon protocol types for NDJSON communication over a UNIX socket.
//!
//! One request line in, one response line out:
//! `{"id": "...", "v": 1, "method": "command", "params": {"line": "sms send ..."}}`
//!
//! CHANGELOG:
//! - 04/02/2026 - Typed parameter accessors, error codes
//! - 04/02/2026 - Initial implementation

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const PROTOCOL_VERSION: u8 = 1;

/// Error codes carried in `ErrorInfo::code`.
pub const CODE_BAD_REQUEST: &str = "BAD_REQUEST";
pub const CODE_NOT_FOUND: &str = "NOT_FOUND";
pub const CODE_ERROR: &str = "ERROR";

/// NDJSON request from client to daemon.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    /// Unique request ID (UUID)
    pub id: String,
    /// Protocol version
    pub v: u8,
    /// Method name: health, command, delivery_event, delivery_status
    pub method: String,
    #[serde(default)]
    pub params: HashMap<String, Value>,
}

/// NDJSON response from daemon to client.
#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    pub ok: bool,
    pub result: Option<Value>,
    pub error: Option<ErrorInfo>,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Server execution time in milliseconds
    pub server_ms: f64,
    pub protocol_v: u8,
}

impl Request {
    pub fn new(method: impl Into<String>, params: HashMap<String, Value>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            v: PROTOCOL_VERSION,
            method: method.into(),
            params,
        }
    }

    /// Parse request from NDJSON line.
    pub fn from_ndjson_line(line: &str) -> Result<Self> {
        serde_json::from_str(line).context("Failed to parse request JSON")
    }

    pub fn to_ndjson_line(&self) -> Result<String> {
        Ok(format!("{}\n", serde_json::to_string(self)?))
    }

    /// Required string parameter.
    pub fn str_param(&self, name: &str) -> Result<&str> {
        self.params
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("missing string parameter '{}'", name))
    }

    /// Required integer parameter.
    pub fn i64_param(&self, name: &str) -> Result<i64> {
        self.params
            .get(name)
            .and_then(Value::as_i64)
            .ok_or_else(|| anyhow!("missing integer parameter '{}'", name))
    }

    /// Optional boolean parameter.
    pub fn bool_param(&self, name: &str, default: bool) -> bool {
        self.params
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }
}

impl Response {
    pub fn success(id: String, result: Value, server_ms: f64) -> Self {
        Self {
            id,
            ok: true,
            result: Some(result),
            error: None,
            meta: ResponseMeta {
                server_ms,
                protocol_v: PROTOCOL_VERSION,
            },
        }
    }

    pub fn error(id: String, code: &str, message: String, server_ms: f64) -> Self {
        Self {
            id,
            ok: false,
            result: None,
            error: Some(ErrorInfo {
                code: code.to_string(),
                message,
            }),
            meta: ResponseMeta {
                server_ms,
                protocol_v: PROTOCOL_VERSION,
            },
        }
    }

    pub fn from_ndjson_line(line: &str) -> Result<Self> {
        serde_json::from_str(line).context("Failed to parse response JSON")
    }

    /// Serialize response to NDJSON line.
    pub fn to_ndjson_line(&self) -> Result<String> {
        Ok(format!("{}\n", serde_json::to_string(self)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_params() {
        let req = Request::from_ndjson_line(
            r#"{"id": "1", "v": 1, "method": "delivery_event", "params": {"token": "sent:1:0:1000", "ok": false, "cmd_id": 4}}"#,
        )
        .unwrap();
        assert_eq!(req.str_param("token").unwrap(), "sent:1:0:1000");
        assert!(!req.bool_param("ok", true));
        assert!(req.bool_param("missing", true));
        assert_eq!(req.i64_param("cmd_id").unwrap(), 4);
        assert!(req.str_param("cmd_id").is_err());
    }

    #[test]
    fn test_params_default_to_empty() {
        let req = Request::from_ndjson_line(r#"{"id": "1", "v": 1, "method": "health"}"#).unwrap();
        assert!(req.params.is_empty());
    }

    #[test]
    fn test_response_line() {
        let line = Response::success("abc".into(), json!({"text": "hi"}), 1.5)
            .to_ndjson_line()
            .unwrap();
        assert!(line.ends_with('\n'));
        let parsed = Response::from_ndjson_line(line.trim_end()).unwrap();
        assert!(parsed.ok);
        assert_eq!(parsed.result.unwrap()["text"], "hi");

        let err = Response::error("abc".into(), CODE_NOT_FOUND, "gone".into(), 0.1);
        assert_eq!(err.error.unwrap().code, "NOT_FOUND");
    }
}
