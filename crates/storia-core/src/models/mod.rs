//! Data models for the application
//!
//! Domain entities and API response shapes for uploads and their per-image
//! OCR lifecycle.

mod enums;
mod upload;
mod upload_image;

pub use enums::*;
pub use upload::*;
pub use upload_image::*;
