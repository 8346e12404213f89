use crate::ipc::error::{get_required_str, require_session, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::{ClassDetails, ClassDetailsField};
use serde_json::json;

fn class_details_get(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let session = require_session(state)?;
    let details = session.class_details()?;
    Ok(json!({ "classDetails": details }))
}

// Numbers are accepted for week/day; they are stored as text.
fn field_value(params: &serde_json::Value) -> Result<String, HandlerErr> {
    match params.get("value") {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        Some(serde_json::Value::Null) => Ok(String::new()),
        _ => Err(HandlerErr::bad_params("value must be a string or number")),
    }
}

fn class_details_update(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let session = require_session(state)?;
    let field_raw = get_required_str(params, "field")?;
    let Some(field) = ClassDetailsField::parse(&field_raw) else {
        return Err(HandlerErr::bad_params(
            "field must be one of: className, classWeek, classDay",
        )
        .with_details(json!({ "field": field_raw })));
    };
    let value = field_value(params)?;
    let details = session.update_class_detail(field, &value)?;
    Ok(json!({ "classDetails": details }))
}

fn class_details_set(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let session = require_session(state)?;
    let raw = params
        .get("classDetails")
        .cloned()
        .unwrap_or_else(|| params.clone());
    let details: ClassDetails = serde_json::from_value(raw)
        .map_err(|e| HandlerErr::bad_params(format!("invalid classDetails: {e}")))?;
    session.replace_class_details(&details)?;
    Ok(json!({ "classDetails": details }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classDetails.get" => Some(respond(&req.id, class_details_get(state))),
        "classDetails.update" => Some(respond(&req.id, class_details_update(state, &req.params))),
        "classDetails.set" => Some(respond(&req.id, class_details_set(state, &req.params))),
        _ => None,
    }
}
