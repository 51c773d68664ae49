//! Statistics snapshots published by a rendering session

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// A statistics snapshot for the surrounding dashboard.
///
/// Produced at most once per sampling window and immutable once emitted;
/// every snapshot is a fresh value, never a view into live loop state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerStats {
    /// Points in the loaded cloud.
    pub total_points: u64,
    /// Points actually drawn after downsampling and filtering.
    pub rendered_points: u64,
    /// Frames per second over the last sampling window.
    pub fps: u32,
    /// When this snapshot was taken.
    pub last_update: SystemTime,
}

impl ViewerStats {
    /// Build a snapshot, clamping the rendered count to the total.
    pub fn new(total_points: u64, rendered_points: u64, fps: u32) -> Self {
        Self {
            total_points,
            rendered_points: rendered_points.min(total_points),
            fps,
            last_update: SystemTime::now(),
        }
    }
}

/// Live counters reported by the level-of-detail optimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerStats {
    /// Points surviving the current downsampling pass.
    pub visible_point_count: u64,
    /// Current reduction step applied to the full point set.
    pub downsampling_factor: f32,
    /// The optimizer's own frame-rate estimate.
    pub current_fps: f32,
}

impl Default for OptimizerStats {
    fn default() -> Self {
        Self {
            visible_point_count: 0,
            downsampling_factor: 1.0,
            current_fps: 0.0,
        }
    }
}

/// How the optimizer picks its downsampling factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownsamplingMode {
    /// Hold a target frame rate
    #[serde(rename = "fps")]
    Fps,
    /// Scale with camera distance
    #[serde(rename = "zoom")]
    Zoom,
}

impl DownsamplingMode {
    pub fn as_token(&self) -> &'static str {
        match self {
            DownsamplingMode::Fps => "fps",
            DownsamplingMode::Zoom => "zoom",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "fps" => Some(DownsamplingMode::Fps),
            "zoom" => Some(DownsamplingMode::Zoom),
            _ => None,
        }
    }
}

/// Baseline frame-rate settings handed to the optimizer when it is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FpsSettings {
    /// Frame rate below which the optimizer starts shedding points.
    pub min_fps: f32,
}

impl Default for FpsSettings {
    fn default() -> Self {
        Self { min_fps: 30.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_points_never_exceed_total() {
        let stats = ViewerStats::new(1_000, 5_000, 60);
        assert_eq!(stats.rendered_points, 1_000);

        let stats = ViewerStats::new(5_000, 1_000, 60);
        assert_eq!(stats.rendered_points, 1_000);
    }

    #[test]
    fn test_downsampling_mode_tokens() {
        assert_eq!(DownsamplingMode::Fps.as_token(), "fps");
        assert_eq!(DownsamplingMode::from_token("zoom"), Some(DownsamplingMode::Zoom));
        assert_eq!(DownsamplingMode::from_token("distance"), None);
    }
}
