//! Session configuration supplied by the dashboard

use pitcloud_core::{ColoringConfig, FpsSettings};
use serde::{Deserialize, Serialize};

/// Declarative configuration of a rendering session.
///
/// `source_path` and `optimizer_enabled` identify the session: changing
/// either forces a full teardown and re-acquisition. The coloring
/// configuration is applied to the live session without a rebuild.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Path of the point cloud source file.
    pub source_path: String,
    /// Whether the level-of-detail optimizer runs for this session.
    pub optimizer_enabled: bool,
    /// Coloring mode, classification range and filter.
    #[serde(default)]
    pub coloring: ColoringConfig,
    /// Baseline target-FPS settings applied when the optimizer is enabled.
    #[serde(default)]
    pub fps_settings: FpsSettings,
}

impl SessionConfig {
    pub fn new(source_path: impl Into<String>, optimizer_enabled: bool) -> Self {
        Self {
            source_path: source_path.into(),
            optimizer_enabled,
            coloring: ColoringConfig::default(),
            fps_settings: FpsSettings::default(),
        }
    }

    /// Whether switching to `other` requires tearing the session down and
    /// acquiring a new engine.
    pub fn requires_rebuild(&self, other: &SessionConfig) -> bool {
        self.source_path != other.source_path || self.optimizer_enabled != other.optimizer_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitcloud_core::{ClassificationFilter, ColorMode};

    #[test]
    fn test_rebuild_triggers() {
        let base = SessionConfig::new("/data/quarry.las", true);

        let mut other = base.clone();
        other.source_path = "/data/north_wall.las".into();
        assert!(base.requires_rebuild(&other));

        let mut other = base.clone();
        other.optimizer_enabled = false;
        assert!(base.requires_rebuild(&other));

        let mut other = base.clone();
        other.coloring.mode = ColorMode::CrackSeverity;
        other.coloring.classification_filter = ClassificationFilter::Only(vec![2, 3]);
        assert!(!base.requires_rebuild(&other));
    }
}
