//! Storia Storage Library
//!
//! This crate provides the blob storage abstraction and implementations for
//! Storia. It includes the Storage trait and backends for S3-compatible
//! object stores and the local filesystem.
//!
//! # Storage key format
//!
//! Upload objects are keyed per user: `{user_id}/{random_token}_{filename}`.
//! The random token guarantees no collision even for repeated filenames from
//! the same user. Keys must not contain `..` or a leading `/`. Key generation
//! is centralized in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::build_object_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use storia_core::StorageBackend;
pub use traits::{Storage, StorageError, StorageResult};
