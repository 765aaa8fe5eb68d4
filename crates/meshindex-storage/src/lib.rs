//! meshindex-storage: storage backends implementing [`meshindex_core::Listener`].

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "memory")]
pub use memory::{EpochStats, InMemoryStorage};
