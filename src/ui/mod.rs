//! UI rendering module for City Weather CLI
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod city_detail;
pub mod city_table;
pub mod help_overlay;

pub use city_detail::render as render_city_detail;
pub use city_table::render_city_table;
pub use help_overlay::render as render_help_overlay;
