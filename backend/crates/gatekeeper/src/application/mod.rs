//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod csrf;
pub mod provider_call;
pub mod rate_limiter;
pub mod security_headers;
pub mod session_bridge;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;

// Re-exports
pub use config::GatekeeperConfig;
pub use csrf::{CsrfGuard, IssuedCsrfToken};
pub use rate_limiter::{ActionClass, RateLimiter};
pub use security_headers::SecurityHeaders;
pub use session_bridge::SessionBridge;
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
