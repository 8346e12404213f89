use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::notifier::UpdateState;
use serde_json::json;

fn state_json(state: &AppState) -> serde_json::Value {
    json!({
        "state": state.updates.state(),
        "updateAvailable": state.updates.is_update_available(),
    })
}

// Changes queue on the receiver until the shell drains them with `update.events`.
fn update_subscribe(state: &mut AppState) -> serde_json::Value {
    state.update_events = Some(state.updates.subscribe());
    state_json(state)
}

fn update_events(state: &AppState) -> serde_json::Value {
    let events: Vec<UpdateState> = state
        .update_events
        .as_ref()
        .map(|rx| rx.try_iter().collect())
        .unwrap_or_default();
    json!({
        "subscribed": state.update_events.is_some(),
        "events": events,
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "update.status" => Some(ok(&req.id, state_json(state))),
        "update.markAvailable" => {
            state.updates.mark_available();
            Some(ok(&req.id, state_json(state)))
        }
        "update.apply" => Some(match state.updates.apply() {
            Ok(_) => ok(&req.id, state_json(state)),
            Err(e) => err(&req.id, "no_update", e.to_string(), None),
        }),
        "update.subscribe" => Some(ok(&req.id, update_subscribe(state))),
        "update.events" => Some(ok(&req.id, update_events(state))),
        "update.finish" => {
            state.updates.finish();
            Some(ok(&req.id, state_json(state)))
        }
        _ => None,
    }
}
