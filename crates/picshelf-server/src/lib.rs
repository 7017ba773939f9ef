//! HTTP dispatcher for Picshelf.
//!
//! A thin axum layer over [`picshelf_core::Shelf`]: every route decodes a
//! request, runs exactly one coordinator operation on the blocking pool,
//! and maps [`picshelf_core::ShelfError`] onto a status code
//! (404 / 409 / 400 / 500) with a `{"error": ...}` body.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use server::PicshelfServer;
