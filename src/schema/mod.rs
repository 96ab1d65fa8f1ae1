//! Schema module - Configuration types for GIF encoding sessions.

mod config;

pub use config::*;
