#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    CachedResponse, InMemoryRepository, KeyValueStore, ResponseCache, Storage, StorageError,
};
