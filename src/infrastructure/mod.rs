//! Adapters implementing the domain ports.

pub mod http_fetcher;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
