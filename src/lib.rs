//! Terminal companion for the cafeteria service.
//!
//! The binary in `main.rs` wires these modules together; they are exposed
//! as a library so integration tests can drive the storage and API layers
//! directly.

pub mod api;
pub mod app;
pub mod cart;
pub mod config;
pub mod history;
pub mod menu;
pub mod preferences;
pub mod profile;
pub mod storage;
pub mod theme;
pub mod ui;
pub mod util;
