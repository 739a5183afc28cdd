pub mod store;
pub mod upload_images;
pub mod uploads;
