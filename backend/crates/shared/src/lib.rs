//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of vocabulary shared by every
//! crate in the workspace:
//! - The unified error type and its result alias
//! - The error classification that maps onto HTTP status codes
//! - Problem-details rendering for HTTP responses (feature `axum`)
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod kind;
    pub mod problem;
}
