//! Utility functions module
//!
//! Token claim decoding and unload signal handling.

pub mod jwt;
pub mod signals;

// Re-export main functions
pub use signals::shutdown_signal;
