//! Daemon service - dispatches protocol requests to the module service.
//!
//! Keeps hot resources (database connection, loaded contacts, in-process
//! recent contact slot) across requests.
//!
//! CHANGELOG:
//! - 04/02/2026 - Initial implementation

use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;

use super::protocol::{Request, CODE_BAD_REQUEST, CODE_ERROR, CODE_NOT_FOUND};
use crate::config::Settings;
use crate::contacts::recent::MemoryRecentContacts;
use crate::service::ModuleService;

/// Failure of a request, with its protocol error code.
#[derive(Debug)]
pub struct MethodError {
    pub code: &'static str,
    pub message: String,
}

impl MethodError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn from_anyhow(code: &'static str, err: anyhow::Error) -> Self {
        Self::new(code, format!("{:#}", err))
    }
}

pub struct DaemonService {
    module: ModuleService,
    started_at: String,
}

impl DaemonService {
    pub fn new(settings: &Settings) -> Result<Self> {
        let module = ModuleService::from_settings(settings, Arc::new(MemoryRecentContacts::new()))?;
        Ok(Self::with_module(module))
    }

    pub fn with_module(module: ModuleService) -> Self {
        Self {
            module,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Dispatch request to appropriate handler.
    pub fn dispatch(&self, request: &Request) -> Result<Value, MethodError> {
        match request.method.as_str() {
            "health" => Ok(self.health()),
            "command" => self.command(request),
            "delivery_event" => self.delivery_event(request),
            "delivery_status" => self.delivery_status(request),
            other => Err(MethodError::new(
                CODE_BAD_REQUEST,
                format!("Unknown method: {}", other),
            )),
        }
    }

    fn health(&self) -> Value {
        json!({
            "pid": std::process::id(),
            "started_at": self.started_at,
            "version": "v1",
            "contacts_loaded": self.module.contacts_loaded(),
        })
    }

    /// Params: line
    fn command(&self, request: &Request) -> Result<Value, MethodError> {
        let line = request
            .str_param("line")
            .map_err(|e| MethodError::from_anyhow(CODE_BAD_REQUEST, e))?;
        let (cmd_id, reply) = self
            .module
            .handle_line(line)
            .map_err(|e| MethodError::from_anyhow(CODE_ERROR, e))?;

        Ok(json!({
            "cmd_id": cmd_id,
            "reply": reply,
        }))
    }

    /// Params: token, ok (default true)
    fn delivery_event(&self, request: &Request) -> Result<Value, MethodError> {
        let token = request
            .str_param("token")
            .map_err(|e| MethodError::from_anyhow(CODE_BAD_REQUEST, e))?;
        let ok = request.bool_param("ok", true);

        let progress = self
            .module
            .delivery_event(token, ok)
            .map_err(|e| MethodError::from_anyhow(CODE_NOT_FOUND, e))?;
        let notification = progress.notification();

        Ok(json!({
            "progress": progress,
            "notification": notification,
        }))
    }

    /// Params: cmd_id
    fn delivery_status(&self, request: &Request) -> Result<Value, MethodError> {
        let cmd_id = request
            .i64_param("cmd_id")
            .map_err(|e| MethodError::from_anyhow(CODE_BAD_REQUEST, e))?;

        match self.module.delivery_status(cmd_id) {
            Ok(Some(record)) => Ok(json!(record)),
            Ok(None) => Err(MethodError::new(
                CODE_NOT_FOUND,
                format!("no delivery record for command {}", cmd_id),
            )),
            Err(e) => Err(MethodError::from_anyhow(CODE_ERROR, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::manager::ContactsManager;
    use crate::db::connection::Database;
    use std::collections::HashMap;

    fn service() -> DaemonService {
        let contacts =
            ContactsManager::from_json(r#"[{"name": "Jane Doe", "phone": "555-1234"}]"#).unwrap();
        DaemonService::with_module(ModuleService::assemble(
            &Settings::default(),
            Database::open_in_memory().unwrap(),
            Some(contacts),
            Arc::new(MemoryRecentContacts::new()),
        ))
    }

    fn request(method: &str, params: Value) -> Request {
        let params: HashMap<String, Value> = serde_json::from_value(params).unwrap();
        Request::new(method, params)
    }

    #[test]
    fn test_health() {
        let result = service().dispatch(&request("health", json!({}))).unwrap();
        assert_eq!(result["contacts_loaded"], 1);
    }

    #[test]
    fn test_command_reply() {
        let result = service()
            .dispatch(&request("command", json!({"line": "reply hi"})))
            .unwrap();
        assert_eq!(result["cmd_id"], 1);
        assert_eq!(result["reply"]["text"], "No recent contact");
    }

    #[test]
    fn test_bad_requests() {
        let service = service();
        let err = service.dispatch(&request("command", json!({}))).unwrap_err();
        assert_eq!(err.code, CODE_BAD_REQUEST);

        let err = service.dispatch(&request("reboot", json!({}))).unwrap_err();
        assert_eq!(err.code, CODE_BAD_REQUEST);
    }

    #[test]
    fn test_unknown_delivery_targets() {
        let service = service();
        let err = service
            .dispatch(&request("delivery_status", json!({"cmd_id": 99})))
            .unwrap_err();
        assert_eq!(err.code, CODE_NOT_FOUND);

        let err = service
            .dispatch(&request("delivery_event", json!({"token": "sent:99:0:1000"})))
            .unwrap_err();
        assert_eq!(err.code, CODE_NOT_FOUND);
    }
}
