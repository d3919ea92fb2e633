//! Error type of the handler chain.
//!
//! The detection path never returns one: provider and storage trouble degrade inside the
//! pipeline. Admin operations propagate storage failures so the transport can log them.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Result type for handlers; uses [`BotError`].
pub type Result<T> = std::result::Result<T, BotError>;
