//! Handlers: filter → admin commands → detection.

mod admin;
mod detection;
mod filter;

pub use admin::{AdminHandler, ADMIN_COMMANDS, ERASE_COMMAND, STATUS_COMMAND};
pub use detection::DetectionHandler;
pub use filter::{command_name, FilterHandler, FilterReason, MessageFilter};
