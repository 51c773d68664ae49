//! Container-resize coordination

use log::debug;
use pitcloud_core::{HostExtent, PointCloudEngine};

/// Upper bound on the device-pixel-ratio contribution to the surface
/// resolution, bounding GPU memory and fill-rate cost on high-density
/// displays.
pub(crate) const MAX_PIXEL_RATIO: f64 = 2.0;

/// Apply a measured container box to the engine surface and camera.
///
/// A non-positive dimension means the container has not been laid out yet;
/// the measurement is skipped rather than applied as a degenerate viewport.
/// Returns whether the extent was applied.
pub(crate) fn apply_extent(engine: &mut dyn PointCloudEngine, extent: HostExtent) -> bool {
    if extent.is_degenerate() {
        debug!(
            "skipping resize to degenerate container box {}x{}",
            extent.width, extent.height
        );
        return false;
    }

    engine.set_surface_size(extent.width, extent.height);
    engine.set_pixel_ratio(extent.pixel_ratio.min(MAX_PIXEL_RATIO));
    engine.set_camera_aspect(extent.width as f32 / extent.height as f32);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineOp, MockEngine, MockEngineConfig};

    #[test]
    fn test_zero_dimension_is_skipped() {
        let (mut engine, probe) = MockEngine::scripted(MockEngineConfig::default());

        assert!(!apply_extent(engine.as_mut(), HostExtent::new(0, 300, 1.0)));
        assert!(!apply_extent(engine.as_mut(), HostExtent::new(800, 0, 1.0)));
        assert!(probe.ops().is_empty());
    }

    #[test]
    fn test_applies_size_ratio_and_aspect() {
        let (mut engine, probe) = MockEngine::scripted(MockEngineConfig::default());

        assert!(apply_extent(engine.as_mut(), HostExtent::new(800, 400, 1.5)));
        assert_eq!(
            probe.ops(),
            vec![
                EngineOp::SetSurfaceSize(800, 400),
                EngineOp::SetPixelRatio(1.5),
                EngineOp::SetCameraAspect(2.0),
            ]
        );
    }

    #[test]
    fn test_pixel_ratio_capped_at_two() {
        let (mut engine, probe) = MockEngine::scripted(MockEngineConfig::default());

        apply_extent(engine.as_mut(), HostExtent::new(640, 480, 3.0));
        assert!(probe.ops().contains(&EngineOp::SetPixelRatio(2.0)));
    }
}
