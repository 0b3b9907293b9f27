//! Application initialization and resource setup.
//!
//! This module provides functions to initialize the shared resources:
//! - Logger
//! - Provider HTTP clients
//! - Token-bucket rate limiters
//! - The lookup concurrency limiter

mod client;
mod logger;
mod rate_limiter;

use std::sync::Arc;

use tokio::sync::Semaphore;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;
pub use rate_limiter::{init_rate_limiter, RateLimiter};

/// Initializes a semaphore for controlling concurrency.
///
/// The semaphore bounds the number of provider lookups in flight. A count of
/// zero is raised to one so that enrichment can always make progress.
pub fn init_semaphore(count: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(count.max(1)))
}
