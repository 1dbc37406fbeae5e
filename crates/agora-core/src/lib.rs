//! # Agora Core
//!
//! The domain layer of the Agora social backend.
//! This crate contains the entities, the ports every collaborator must
//! implement, and the services that drive the social graph and engagement
//! mutations. It has zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;
pub mod sync;

pub use error::DomainError;
pub use services::Actor;
