//! Terminal User Interface module.
//!
//! This module provides the TUI for the cafeteria companion, including:
//! - Main event loop (`run`)
//! - Input handling for the menu, recommend, history, and settings tabs
//! - Rendering for each tab and the overlay dialogs
//! - Background task event processing
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task spawning and event processing
//! - `render` - Tab rendering dispatch and overlays
//! - `helpers` - Shared utility functions
//! - `menu` - Menu browser and cart widgets
//! - `recommend` - Recommendation result widget
//! - `history` - Saved meal history widget
//! - `settings` - Nutrition profile editor widget
//! - `status` - Status bar widget
//! - `help` - Keybinding reference overlay

// Submodules for UI components
mod events;
mod help;
mod helpers;
mod history;
mod input;
mod loop_runner;
mod menu;
mod recommend;
mod render;
mod settings;
mod status;

// Re-export the public API
pub use loop_runner::{run, Action};
