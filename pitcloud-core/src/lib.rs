//! Core data structures and interface contracts for pitcloud
//!
//! This crate provides the value types shared between the session controller
//! and the surrounding dashboard (color modes, classification filters,
//! statistics snapshots), the error taxonomy, and the narrow trait boundary
//! behind which the external rendering engine and the hosting viewport live.

pub mod cloud;
pub mod color;
pub mod engine;
pub mod error;
pub mod host;
pub mod stats;

pub use cloud::*;
pub use color::*;
pub use engine::*;
pub use error::*;
pub use host::*;
pub use stats::*;

/// Common result type for pitcloud operations
pub type Result<T> = std::result::Result<T, SessionError>;
