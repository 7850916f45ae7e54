//! Shared types for the Achaar Bazaar marketplace
//!
//! Common types used by the server and its clients: auth request/response
//! DTOs, the role enum, and the unified response envelope.

pub mod client;
pub mod response;
pub mod role;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use response::{ApiResponse, PaginatedResponse, Pagination};
pub use role::Role;
