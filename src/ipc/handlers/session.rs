use crate::ipc::error::{require_session, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn session_reset(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let session = require_session(state)?;
    session.reset()?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.reset" => Some(respond(&req.id, session_reset(state))),
        _ => None,
    }
}
