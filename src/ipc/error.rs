use crate::error::{
    ExportError, ImportError, SessionError, SignInError, SignOutError, StoreError,
};
use crate::ipc::types::AppState;
use crate::session::SessionCoordinator;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<SessionError> for HandlerErr {
    fn from(e: SessionError) -> Self {
        let message = e.to_string();
        match e {
            SessionError::Import(ImportError::MissingColumns) => {
                HandlerErr::new("missing_columns", message)
            }
            SessionError::Import(ImportError::InvalidRow(row)) => {
                HandlerErr::new("invalid_row", message).with_details(json!({ "row": row }))
            }
            SessionError::Import(ImportError::EmptyRoster) => {
                HandlerErr::new("empty_roster", message)
            }
            SessionError::Import(ImportError::ParseFailure(_)) => {
                HandlerErr::new("parse_failure", message)
            }
            SessionError::SignIn(SignInError::DuplicateSignIn) => {
                HandlerErr::new("duplicate_sign_in", message)
            }
            SessionError::SignIn(SignInError::MissingFields) => {
                HandlerErr::new("missing_fields", message)
            }
            SessionError::SignOut(SignOutError::NotSignedIn) => {
                HandlerErr::new("not_signed_in", message)
            }
            SessionError::Store(StoreError::Unavailable(_)) => {
                HandlerErr::new("store_unavailable", message)
            }
            SessionError::Store(StoreError::Corrupt { key, .. }) => {
                HandlerErr::new("store_corrupt", message)
                    .with_details(json!({ "key": key.as_str() }))
            }
            SessionError::Store(StoreError::PartialFailure(keys)) => {
                let failed: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
                HandlerErr::new("partial_failure", message)
                    .with_details(json!({ "failedKeys": failed }))
            }
            SessionError::Export(ExportError::InvalidSignature { id, kind }) => {
                HandlerErr::new("invalid_signature", message)
                    .with_details(json!({ "studentId": id, "kind": kind }))
            }
            SessionError::Export(ExportError::Archive(_)) => {
                HandlerErr::new("export_failed", message)
            }
        }
    }
}

/// Common preamble for handlers that need an open workspace.
pub fn require_session<'a>(state: &'a AppState) -> Result<&'a SessionCoordinator, HandlerErr> {
    state
        .session
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn respond(
    id: &str,
    result: Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    match result {
        Ok(v) => ok(id, v),
        Err(e) => e.response(id),
    }
}
