//! # resurface
//!
//! Detects content that resurfaces in a group conversation after it already circulated, and
//! replies to the new poster with an "old news" reminder.
//!
//! - [`fingerprint`]: text embeddings and perceptual image hashes, with their similarity.
//! - [`store`]: per-conversation rolling record log, day-partitioned on disk.
//! - [`matching`]: best-match search and distinct-sender counting.
//! - [`pipeline`]: the gates from "a similar fingerprint exists" to "remind".
//! - [`handlers`], [`chain`], [`telegram`]: the bot around it.

pub mod admin;
pub mod capabilities;
pub mod chain;
pub mod cli;
pub mod clock;
pub mod components;
pub mod config;
pub mod core;
pub mod fingerprint;
pub mod handlers;
pub mod matching;
pub mod pipeline;
pub mod record;
pub mod runner;
pub mod store;
pub mod telegram;

pub use admin::{Admin, JudgeStatus, StatusReport};
pub use chain::HandlerChain;
pub use cli::{load_config, Cli, Commands};
pub use components::{build_bot_components, build_handler_chain, BotComponents};
pub use config::{BotConfig, DetectorConfig, MatchPrecedence};
pub use core::{init_tracing, BotError, Chat, Handler, HandlerResponse, Message, User};
pub use pipeline::{Decision, Pipeline, Reminder, SilentReason};
pub use record::Record;
pub use runner::{build_offline, run_bot};
pub use store::ConversationStore;
