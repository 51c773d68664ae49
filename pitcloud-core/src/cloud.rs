//! Loaded point cloud summaries

use serde::{Deserialize, Serialize};

/// Summary of a loaded point cloud, as reported by the rendering engine.
///
/// The engine keeps geometry and GPU buffers on its side of the trait
/// boundary; only the counts and the classification channel cross over.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CloudData {
    /// Total number of points in the source file.
    pub point_count: u64,
    /// Per-point LAS classification values, when the source carries them.
    pub classifications: Option<Vec<u8>>,
}

impl CloudData {
    pub fn new(point_count: u64) -> Self {
        Self {
            point_count,
            classifications: None,
        }
    }

    pub fn with_classifications(point_count: u64, classifications: Vec<u8>) -> Self {
        Self {
            point_count,
            classifications: Some(classifications),
        }
    }
}
