pub mod ocr_progress;
pub mod upload_create;
pub mod upload_get;

pub use ocr_progress::get_ocr_progress;
pub use upload_create::create_upload;
pub use upload_get::get_upload;
