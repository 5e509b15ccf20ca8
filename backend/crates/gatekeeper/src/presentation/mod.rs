//! Presentation Layer
//!
//! Gatekeeper middleware, HTTP handlers, DTOs and routers.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

// Re-exports
pub use extract::ClientIdentifier;
pub use middleware::gatekeeper;
pub use router::{auth_router, auth_router_generic, protect};
pub use state::GatekeeperState;
