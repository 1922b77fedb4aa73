//! City Weather CLI Library
//!
//! Exposes the data clients, browsing state, loaders and UI for use by the
//! binary and by integration tests.

pub mod app;
pub mod browser;
pub mod cli;
pub mod data;
pub mod detail;
pub mod loader;
pub mod logging;
pub mod ui;
