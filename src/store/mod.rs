// file: src/store/mod.rs
// description: file-backed storage module exports
// reference: internal module structure

pub mod blog_store;
pub mod uploads;

pub use blog_store::{BlogStore, parse_post_date, today};
pub use uploads::{ImageUploader, UploadedImage};
