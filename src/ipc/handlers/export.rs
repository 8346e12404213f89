use crate::ipc::error::{require_session, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::normalize::path_component;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};

fn write_archive(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, HandlerErr> {
    let io_err = |e: std::io::Error| {
        HandlerErr::new("io_failed", e.to_string())
            .with_details(json!({ "path": dir.to_string_lossy() }))
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;
    let out = dir.join(path_component(file_name));
    let tmp = dir.join(format!("{}.exporting", path_component(file_name)));
    let mut f = std::fs::File::create(&tmp).map_err(io_err)?;
    f.write_all(bytes).map_err(io_err)?;
    f.flush().map_err(io_err)?;
    drop(f);
    std::fs::rename(&tmp, &out).map_err(io_err)?;
    Ok(out)
}

fn export_build(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let session = require_session(state)?;
    let inline = params
        .get("inline")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let out_dir = params
        .get("outDir")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| state.config.export_dir.clone())
        .or_else(|| state.workspace.clone());

    let archive = session.export()?;
    let mut result = json!({
        "fileName": archive.file_name,
        "exportId": archive.export_id,
        "entries": archive.entries,
        "size": archive.bytes.len(),
    });
    if inline {
        result["archiveBase64"] = json!(STANDARD.encode(&archive.bytes));
    } else {
        let Some(dir) = out_dir else {
            return Err(HandlerErr::bad_params("missing outDir"));
        };
        let path = write_archive(&dir, &archive.file_name, &archive.bytes)?;
        result["path"] = json!(path.to_string_lossy());
    }
    Ok(result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "export.build" => Some(respond(&req.id, export_build(state, &req.params))),
        _ => None,
    }
}
