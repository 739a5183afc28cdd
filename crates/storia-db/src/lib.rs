//! Storia Database Library
//!
//! Postgres repositories for the `uploads` and `upload_images` collections,
//! plus the store traits the upload orchestrator is written against so
//! services stay testable without a database.

pub mod db;

pub use db::store::{UploadImageStore, UploadStore};
pub use db::upload_images::UploadImageRepository;
pub use db::uploads::UploadRepository;
