//! # API Shared
//!
//! Shared utilities and definitions for the caremap APIs.
//!
//! Contains:
//! - Request/response types with OpenAPI schemas (`dto` module)
//! - Bearer token issuance and verification (`auth` module)
//! - The health service
//!
//! Used by `api-rest` and by the root `caremap-run` binary.

pub mod auth;
pub mod dto;
pub mod health;

pub use auth::{Claims, TokenError, TokenPair, TokenService, TokenSettings, TokenType};
pub use dto::*;
pub use health::HealthService;
