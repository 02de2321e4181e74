//! Shared test utilities for replaydeck
//!
//! Provides on-disk replay store fixtures for integration tests.
