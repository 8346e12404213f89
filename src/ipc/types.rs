use crate::config::DaemonConfig;
use crate::notifier::{UpdateNotifier, UpdateState};
use crate::session::SessionCoordinator;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: DaemonConfig,
    pub workspace: Option<PathBuf>,
    pub session: Option<SessionCoordinator>,
    pub updates: UpdateNotifier,
    /// Set by `update.subscribe`; drained by `update.events`.
    pub update_events: Option<Receiver<UpdateState>>,
}

impl AppState {
    pub fn new(config: DaemonConfig) -> Self {
        Self {
            config,
            workspace: None,
            session: None,
            updates: UpdateNotifier::new(),
            update_events: None,
        }
    }
}
