//! Cafeteria service API module.
//!
//! Everything that crosses the wire lives here:
//!
//! - **Types**: serde DTOs matching the service's JSON shapes
//! - **Client**: HTTP operations with timeouts, size limits, and retry
//!   logic for the menu fetch
//! - **Mock**: canned fixtures backing the client and integration tests
//!
//! # Architecture
//!
//! The module is organized into three submodules:
//!
//! - [`types`] - Wire DTOs (camelCase menu payloads, snake_case
//!   recommendation payloads)
//! - [`client`] - [`ApiClient`] and its [`ApiError`] taxonomy
//! - [`mock`] - Sample menu and canned recommendation fixtures

mod client;
pub mod mock;
mod types;

pub use client::{ApiClient, ApiError};
pub use types::{
    CategoryPayload, DetectPayload, ItemPayload, MealRating, RecommendationPayload,
    RecommendationQuery, RevisionRequest, VariantPayload,
};
