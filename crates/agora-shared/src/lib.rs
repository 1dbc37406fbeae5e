//! # Agora Shared
//!
//! Wire types shared between the API server and its clients.
//! Nothing here depends on the domain crate, so clients can compile it alone.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
