use crate::ipc::error::{get_required_str, require_session, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::SignatureImage;
use serde_json::json;

fn get_signature(params: &serde_json::Value) -> Result<SignatureImage, HandlerErr> {
    get_required_str(params, "signature").map(SignatureImage::new)
}

fn attendance_list(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let session = require_session(state)?;
    let records = session.records()?;
    Ok(json!({ "records": records }))
}

fn attendance_status(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let session = require_session(state)?;
    let id = get_required_str(params, "id")?;
    let status = session.status(&id)?;
    Ok(json!({
        "id": id,
        "status": status,
        "display": status.display(),
    }))
}

fn attendance_dashboard(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let session = require_session(state)?;
    let dashboard = session.dashboard()?;
    Ok(json!(dashboard))
}

fn attendance_sign_in(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let session = require_session(state)?;
    // Missing id/name are reported by the engine, not as bad params.
    let id = params.get("id").and_then(|v| v.as_str()).unwrap_or("");
    let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
    let signature = get_signature(params)?;
    let record = session.sign_in(id, name, signature)?;
    Ok(json!({ "record": record }))
}

fn attendance_sign_out(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let session = require_session(state)?;
    let id = get_required_str(params, "id")?;
    let signature = get_signature(params)?;
    let record = session.sign_out(&id, signature)?;
    Ok(json!({ "record": record }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.list" => Some(respond(&req.id, attendance_list(state))),
        "attendance.status" => Some(respond(&req.id, attendance_status(state, &req.params))),
        "attendance.dashboard" => Some(respond(&req.id, attendance_dashboard(state))),
        "attendance.signIn" => Some(respond(&req.id, attendance_sign_in(state, &req.params))),
        "attendance.signOut" => Some(respond(&req.id, attendance_sign_out(state, &req.params))),
        _ => None,
    }
}
