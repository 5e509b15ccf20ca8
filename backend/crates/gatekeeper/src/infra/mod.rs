//! Infrastructure Layer
//!
//! Network-backed implementations of the auth provider and counting store.

pub mod http_provider;
pub mod redis;
