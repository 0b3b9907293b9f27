//! Main application modules.
//!
//! This module provides shutdown handling and statistics printing used by the
//! binary.

pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use shutdown::cancel_on_ctrl_c;
pub use statistics::print_lookup_statistics;
