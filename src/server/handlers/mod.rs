//! Server HTTP handlers.

mod index;
mod metrics;
mod status;
mod upload;

pub use index::index_handler;
pub use metrics::metrics_handler;
pub use status::status_handler;
pub use upload::upload_handler;
