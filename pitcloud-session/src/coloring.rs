//! Color and classification-filter synchronization
//!
//! The optimizer may hold a downsampled copy of the geometry whose point
//! count differs from the full dataset. A color buffer computed for the
//! full dataset silently corrupts a downsampled draw, so the order below is
//! a correctness property:
//!
//! 1. push the coloring mode into the engine's internal state (later
//!    recomputation reads it instead of taking the mode as a parameter),
//! 2. push the classification range, which recoloring consults,
//! 3. read the optimizer's current downsampling factor,
//! 4. regenerate the downsampled buffers at that same factor when the
//!    optimizer is enabled, so buffer sizes match what will be drawn,
//! 5. only without an enabled optimizer (or a regeneration entry point)
//!    fall back to the direct full-buffer update.

use pitcloud_core::{ClassificationFilter, ColoringConfig, PointCloudEngine, Result};

/// Apply a coloring-mode/range change to the engine in the required order.
pub(crate) fn sync_colors(
    engine: &mut dyn PointCloudEngine,
    coloring: &ColoringConfig,
) -> Result<()> {
    engine.set_color_mode(coloring.mode);
    engine.set_classification_range(coloring.classification_range);

    let (optimizer_enabled, factor) = {
        let optimizer = engine.optimizer();
        (optimizer.is_enabled(), optimizer.stats().downsampling_factor)
    };

    if optimizer_enabled && engine.optimizer_mut().refresh_downsampling(factor) {
        return Ok(());
    }

    // Full-buffer recompute. With an enabled optimizer and no regeneration
    // entry point this writes a buffer sized for the full dataset against a
    // downsampled copy; kept as the engine's documented fallback.
    engine.update_colors(coloring.mode, coloring.classification_range.as_ref())
}

/// Hand a filter change to the optimizer.
///
/// Filtering is entirely the optimizer's concern: excluded classes render
/// at size zero on its next downsampling pass, keeping point indices
/// stable.
pub(crate) fn sync_filter(engine: &mut dyn PointCloudEngine, filter: &ClassificationFilter) {
    engine.optimizer_mut().set_classification_filter(filter);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineOp, MockEngine, MockEngineConfig};
    use pitcloud_core::{ClassificationRange, ColorMode};

    fn coloring(mode: ColorMode, range: Option<ClassificationRange>) -> ColoringConfig {
        ColoringConfig {
            mode,
            classification_range: range,
            classification_filter: ClassificationFilter::All,
        }
    }

    #[test]
    fn test_enabled_optimizer_regenerates_at_current_factor() {
        let (mut engine, probe) = MockEngine::scripted(MockEngineConfig {
            downsampling_factor: 4.0,
            ..MockEngineConfig::default()
        });
        probe.optimizer.borrow_mut().enabled = true;

        let range = ClassificationRange::new(0.0, 5.0);
        sync_colors(
            engine.as_mut(),
            &coloring(ColorMode::CrackSeverity, Some(range)),
        )
        .unwrap();

        // Mode first, range second, then a regeneration parameterized with
        // the factor the optimizer is already at, never a full recompute.
        assert_eq!(
            probe.ops(),
            vec![
                EngineOp::SetColorMode(ColorMode::CrackSeverity),
                EngineOp::SetClassificationRange(Some(range)),
                EngineOp::RefreshDownsampling(4.0),
            ]
        );
    }

    #[test]
    fn test_disabled_optimizer_uses_full_buffer_update() {
        let (mut engine, probe) = MockEngine::scripted(MockEngineConfig::default());

        sync_colors(engine.as_mut(), &coloring(ColorMode::Elevation, None)).unwrap();

        assert_eq!(
            probe.ops(),
            vec![
                EngineOp::SetColorMode(ColorMode::Elevation),
                EngineOp::SetClassificationRange(None),
                EngineOp::UpdateColors(ColorMode::Elevation, None),
            ]
        );
    }

    #[test]
    fn test_missing_regeneration_entry_point_falls_back_to_full_buffer() {
        // Known-risky path: the optimizer is enabled and holds a
        // downsampled copy, but exposes no regeneration hook, so the
        // full-buffer update runs against it.
        let (mut engine, probe) = MockEngine::scripted(MockEngineConfig {
            supports_refresh: false,
            downsampling_factor: 2.0,
            ..MockEngineConfig::default()
        });
        probe.optimizer.borrow_mut().enabled = true;

        sync_colors(engine.as_mut(), &coloring(ColorMode::Classification, None)).unwrap();

        assert_eq!(
            probe.ops(),
            vec![
                EngineOp::SetColorMode(ColorMode::Classification),
                EngineOp::SetClassificationRange(None),
                EngineOp::UpdateColors(ColorMode::Classification, None),
            ]
        );
    }

    #[test]
    fn test_filter_goes_to_the_optimizer_verbatim() {
        let (mut engine, probe) = MockEngine::scripted(MockEngineConfig::default());

        sync_filter(engine.as_mut(), &ClassificationFilter::Only(vec![2, 3]));
        sync_filter(engine.as_mut(), &ClassificationFilter::All);

        assert_eq!(
            probe.ops(),
            vec![
                EngineOp::SetClassificationFilter(Some(vec![2, 3])),
                EngineOp::SetClassificationFilter(None),
            ]
        );
    }
}
