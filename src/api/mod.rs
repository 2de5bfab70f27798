// file: src/api/mod.rs
// description: http api module exports
// reference: internal module structure

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use server::{AppState, build_router, run_api};
