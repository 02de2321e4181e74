//! Integration tests for replaydeck
//!
//! These tests verify that the worker, its message protocol, and the IPC
//! bridge work together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod stats_flow;
