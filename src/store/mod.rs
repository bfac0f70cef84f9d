//! Product persistence on top of a key-value storage service

pub mod products;
pub mod storage;

pub use products::{Product, ProductId, ProductStore, StoreError, Summary};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
