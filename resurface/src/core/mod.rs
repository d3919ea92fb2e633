//! Core types and traits: Handler, Message, HandlerResponse, error, logger.
//! Transport-agnostic.

pub mod error;
pub mod logger;
pub mod types;

pub use error::{BotError, Result};
pub use logger::init_tracing;
pub use types::{Chat, Handler, HandlerResponse, Message, ToCoreMessage, ToCoreUser, User};
