//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Routes free text and photos by the current input mode
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `admin_handler`: Authorizes and applies operator decisions
//! - `notifier`: Best-effort notifications to the operator and customers
//! - `ui_builder`: Creates keyboards and formats messages

pub mod admin_handler;
pub mod callback_handler;
pub mod message_handler;
pub mod notifier;
pub mod ui_builder;

use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::catalog::{Catalog, FlowConfig};
use crate::config::Config;
use crate::session::SessionStore;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

/// Shared state injected into every handler.
pub struct AppContext {
    pub conn: Arc<Mutex<Connection>>,
    pub sessions: SessionStore,
    pub catalog: Catalog,
    pub flow: FlowConfig,
    pub config: Config,
}
