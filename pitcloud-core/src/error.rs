//! Error types for session control

use thiserror::Error;

/// Errors surfaced by a rendering session.
///
/// Every variant renders to a single human-readable message; classifying
/// that message into a user-facing suggestion ("not found", "parse",
/// "graphics") is a presentation concern owned by the dashboard.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Container element is not available")]
    ContainerMissing,

    #[error("Failed to load point cloud: {message}")]
    Load { message: String },

    #[error("Failed to initialize graphics: {message}")]
    GraphicsInit { message: String },

    #[error("{message}")]
    Unknown { message: String },
}

impl SessionError {
    /// Wrap a loader failure message.
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
        }
    }

    /// Wrap a graphics-context failure message.
    pub fn graphics_init(message: impl Into<String>) -> Self {
        Self::GraphicsInit {
            message: message.into(),
        }
    }

    /// Wrap anything else.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }
}
