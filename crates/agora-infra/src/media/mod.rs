//! Media stores: local filesystem and in-memory.

mod local;
mod memory;

pub use local::{LocalMediaStore, MediaFile};
pub use memory::InMemoryMediaStore;
