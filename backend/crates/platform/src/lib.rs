//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (random tokens, SHA-256, constant-time compare)
//! - Cookie parsing and `Set-Cookie` construction
//! - Client identification from proxy headers
//! - Sliding-window rate limiting primitives and an in-process store
//! - Deployment environment and list configuration helpers
//! - Sign-up password policy

pub mod client;
pub mod config;
pub mod cookie;
pub mod crypto;
pub mod password;
pub mod rate_limit;
