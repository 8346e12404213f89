pub mod attendance;
pub mod class_details;
pub mod core;
pub mod export;
pub mod roster;
pub mod session;
pub mod update;
