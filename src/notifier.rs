//! App-update notifier. The shell reports when a new build is waiting and
//! when it has been applied; the UI subscribes to state changes. Nothing in
//! the attendance core reads this.

use serde::Serialize;
use std::sync::mpsc::{channel, Receiver, Sender};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateState {
    #[default]
    Idle,
    Available,
    Applying,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no update is waiting to be applied")]
pub struct NoUpdateAvailable;

#[derive(Default)]
pub struct UpdateNotifier {
    state: UpdateState,
    subscribers: Vec<Sender<UpdateState>>,
}

impl UpdateNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> UpdateState {
        self.state
    }

    pub fn is_update_available(&self) -> bool {
        self.state == UpdateState::Available
    }

    /// Receives every later state change. The current state is sent first.
    pub fn subscribe(&mut self) -> Receiver<UpdateState> {
        let (tx, rx) = channel();
        if tx.send(self.state).is_ok() {
            self.subscribers.push(tx);
        }
        rx
    }

    /// idle -> available. No-op while already available or applying.
    pub fn mark_available(&mut self) -> UpdateState {
        if self.state == UpdateState::Idle {
            self.transition(UpdateState::Available);
        }
        self.state
    }

    /// available -> applying.
    pub fn apply(&mut self) -> Result<UpdateState, NoUpdateAvailable> {
        match self.state {
            UpdateState::Available => {
                self.transition(UpdateState::Applying);
                Ok(self.state)
            }
            UpdateState::Applying => Ok(self.state),
            UpdateState::Idle => Err(NoUpdateAvailable),
        }
    }

    /// applying -> idle, once the new build is active.
    pub fn finish(&mut self) -> UpdateState {
        if self.state == UpdateState::Applying {
            self.transition(UpdateState::Idle);
        }
        self.state
    }

    fn transition(&mut self, next: UpdateState) {
        info!(from = ?self.state, to = ?next, "update state changed");
        self.state = next;
        self.subscribers.retain(|tx| tx.send(next).is_ok());
    }
}
