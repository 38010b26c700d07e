//! Shared test utilities for preview-host
//!
//! - Session fixtures wired to the mock frame
//! - Frame message builders

pub mod fixtures;
pub mod messages;
