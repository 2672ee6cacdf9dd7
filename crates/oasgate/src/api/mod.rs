//! HTTP API.

mod health;
mod metrics;
mod openapi;
mod router;
pub mod upload;


pub use router::{create_router, AppState};
pub use upload::UploadLimits;
