//! Upload orchestration.
//!
//! The service decides the processing path from the submitted file set,
//! stages blobs (with rollback on failure), persists the upload aggregate,
//! fans out per-image OCR jobs, and exposes the polling read path.

pub mod classify;
pub mod ocr;
pub mod service;
pub mod staging;
pub mod types;

#[cfg(test)]
pub mod test_support;

pub use ocr::OcrWorkerContext;
pub use service::UploadService;
