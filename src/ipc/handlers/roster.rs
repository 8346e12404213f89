use crate::error::SessionError;
use crate::ipc::error::{require_session, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::roster::{self, RawTable};
use serde_json::json;
use std::path::Path;

/// Accepts `table` ({headers, rows}), `csvText`, or `path` to a .csv file.
fn table_from_params(params: &serde_json::Value) -> Result<RawTable, HandlerErr> {
    if let Some(t) = params.get("table") {
        return serde_json::from_value(t.clone())
            .map_err(|e| HandlerErr::bad_params(format!("invalid table: {e}")));
    }
    if let Some(text) = params.get("csvText").and_then(|v| v.as_str()) {
        return roster::parse_csv(text).map_err(|e| SessionError::from(e).into());
    }
    if let Some(path) = params.get("path").and_then(|v| v.as_str()) {
        let p = Path::new(path);
        let is_csv = p
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if !is_csv {
            return Err(HandlerErr::bad_params("Please upload a CSV file")
                .with_details(json!({ "path": path })));
        }
        let bytes = std::fs::read(p).map_err(|e| {
            HandlerErr::new("io_failed", format!("Error reading file: {e}"))
                .with_details(json!({ "path": path }))
        })?;
        let text = String::from_utf8_lossy(&bytes);
        return roster::parse_csv(&text).map_err(|e| SessionError::from(e).into());
    }
    Err(HandlerErr::bad_params("missing table, csvText, or path"))
}

fn roster_get(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let session = require_session(state)?;
    let students = session.roster()?;
    Ok(json!({ "count": students.len(), "students": students }))
}

fn roster_preview(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let session = require_session(state)?;
    let table = table_from_params(params)?;
    let students = session.preview_roster(&table)?;
    Ok(json!({ "count": students.len(), "students": students }))
}

fn roster_import(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let session = require_session(state)?;
    let table = table_from_params(params)?;
    let students = session.import_roster(&table)?;
    Ok(json!({
        "count": students.len(),
        "students": students,
        "message": format!("Successfully uploaded {} students to roster", students.len()),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.get" => Some(respond(&req.id, roster_get(state))),
        "roster.preview" => Some(respond(&req.id, roster_preview(state, &req.params))),
        "roster.import" => Some(respond(&req.id, roster_import(state, &req.params))),
        _ => None,
    }
}
