//! Integration tests for preview-host
//!
//! These tests verify that the session, frame channel, recorder and
//! preference store work together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod driver_flow;
pub mod preferences_flow;
pub mod properties;
pub mod session_flow;
