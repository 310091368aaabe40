//! # Trato Gateway
//!
//! The boundary between the Trato client and its REST backend.
//!
//! Everything that touches the network or the disk lives here:
//!
//! - [`Gateway`]: one trait method per backend endpoint
//! - [`HttpGateway`]: the real implementation over reqwest, with bearer
//!   injection and the forced-logout policy for expired sessions
//! - [`MemoryGateway`]: a complete in-memory backend for tests and the
//!   CLI demo mode
//! - [`SessionStore`]: the persisted session (token + signed-in user)
//!   with an explicit establish / clear lifecycle
//! - [`wire`]: the single normalization boundary where the backend's
//!   legacy JSON shapes become canonical [`trato_core`] types
//!
//! Nothing outside `wire` ever sees a backend payload.

pub mod error;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod session;
pub mod wire;

pub use error::{GatewayError, GatewayResult};
pub use gateway::Gateway;
pub use http::HttpGateway;
pub use memory::MemoryGateway;
pub use session::SessionStore;
