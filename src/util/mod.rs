//! Shared helpers for terminal text and configuration validation.
//!
//! - **Text**: Unicode-aware width measurement, truncation, and control
//!   character stripping for list rendering (food names come from the
//!   network and must not reach the terminal raw)
//! - **URL validation**: scheme/host checks for the configured server URL

mod text;
mod url_validator;

pub use text::{display_width, sanitize_display, truncate_to_width};
pub use url_validator::{validate_server_url, UrlValidationError};
