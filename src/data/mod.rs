//! Data persistence layer
//!
//! This module provides SQLite-based storage backing the preview
//! preference record.

mod app_state;
mod database;
mod migrations;

pub use app_state::AppStateStore;
pub use database::{Database, DatabaseError};
