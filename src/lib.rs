pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod ipc;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod notifier;
pub mod roster;
pub mod session;
pub mod store;
