//! Content-addressed element store.
//!
//! Persists catalog elements as self-describing TOML records on disk (or
//! keeps them purely in memory), layers an LRU cache and an inverted
//! keyword index on top, and exposes both through the [`ElementStore`]
//! trait.

mod atomic;
pub mod config;
pub mod element;
pub mod error;
pub mod filter;
mod inverted;
mod lru;
pub mod privacy;
mod store;

pub use config::{StorageKind, StoreConfig};
pub use element::{Element, ElementBody, ElementType};
pub use error::{StoreError, StoreResult};
pub use filter::ListFilter;
pub use privacy::{ConfiguredPrivacyPolicy, PrivacyPolicy};
pub use store::{ElementStore, FileElementStore, InMemoryElementStore};

/// Construct the configured store implementation.
pub fn open_store(config: &StoreConfig) -> StoreResult<Box<dyn ElementStore>> {
    match config.kind {
        StorageKind::File => Ok(Box::new(FileElementStore::open(config)?)),
        StorageKind::Memory => Ok(Box::new(InMemoryElementStore::new(config.lru_capacity))),
    }
}
