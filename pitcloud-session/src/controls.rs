//! Imperative control surface
//!
//! Commands the dashboard fires from UI event handlers, independent of the
//! declarative configuration. All of them operate on the live engine's
//! optimizer and degrade to silent no-ops when no engine is held — before
//! load completes or after teardown — so callers never need to check load
//! state first.

use crate::session::SessionController;
use pitcloud_core::{DownsamplingMode, LodOptimizer};

impl SessionController {
    /// Switch the optimizer between FPS-target and zoom-distance
    /// downsampling.
    pub fn set_downsampling_mode(&self, mode: DownsamplingMode) {
        self.with_optimizer(|optimizer| optimizer.set_downsampling_mode(mode));
    }

    /// Current downsampling mode, or `None` when no engine is held.
    pub fn downsampling_mode(&self) -> Option<DownsamplingMode> {
        self.with_optimizer(|optimizer| optimizer.downsampling_mode())
    }

    /// Enable or disable the optimizer on the live engine.
    pub fn set_optimizer_enabled(&self, enabled: bool) {
        self.with_optimizer(|optimizer| {
            if enabled {
                optimizer.enable();
            } else {
                optimizer.disable();
            }
        });
    }

    /// Whether the optimizer is enabled; `false` when no engine is held.
    pub fn optimizer_enabled(&self) -> bool {
        self.with_optimizer(|optimizer| optimizer.is_enabled())
            .unwrap_or(false)
    }

    fn with_optimizer<R>(&self, f: impl FnOnce(&mut dyn LodOptimizer) -> R) -> Option<R> {
        self.with_loaded_engine(|engine| f(engine.optimizer_mut()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::testing::{EngineOp, MockEngine, MockEngineConfig, MockHost, MockProvider};
    use pitcloud_core::CloudData;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn controller_with_engine() -> (SessionController, crate::testing::EngineProbe) {
        let (engine, probe) = MockEngine::scripted(MockEngineConfig::default());
        probe.gate.resolve(Ok(CloudData::new(1_000)));
        let host = Rc::new(RefCell::new(MockHost::new(800, 600, 1.0)));
        let controller = SessionController::new(
            host,
            Box::new(MockProvider::new(vec![engine])),
            SessionConfig::new("/data/quarry.las", false),
        );
        pollster::block_on(controller.activate());
        (controller, probe)
    }

    #[test]
    fn test_controls_are_noops_without_engine() {
        let host = Rc::new(RefCell::new(MockHost::new(800, 600, 1.0)));
        let controller = SessionController::new(
            host,
            Box::new(MockProvider::new(vec![])),
            SessionConfig::new("/data/quarry.las", false),
        );

        // Never activated: every command degrades silently.
        controller.set_downsampling_mode(DownsamplingMode::Zoom);
        controller.set_optimizer_enabled(true);
        assert_eq!(controller.downsampling_mode(), None);
        assert!(!controller.optimizer_enabled());
    }

    #[test]
    fn test_controls_reach_the_live_optimizer() {
        let (controller, probe) = controller_with_engine();
        probe.clear_ops();

        controller.set_downsampling_mode(DownsamplingMode::Zoom);
        assert_eq!(controller.downsampling_mode(), Some(DownsamplingMode::Zoom));

        controller.set_optimizer_enabled(true);
        assert!(controller.optimizer_enabled());
        controller.set_optimizer_enabled(false);
        assert!(!controller.optimizer_enabled());

        assert_eq!(
            probe.ops(),
            vec![
                EngineOp::SetDownsamplingMode(DownsamplingMode::Zoom),
                EngineOp::OptimizerEnable,
                EngineOp::OptimizerDisable,
            ]
        );
    }

    #[test]
    fn test_controls_are_noops_after_teardown() {
        let (controller, probe) = controller_with_engine();
        controller.deactivate();
        probe.clear_ops();

        controller.set_downsampling_mode(DownsamplingMode::Fps);
        controller.set_optimizer_enabled(true);
        assert_eq!(controller.downsampling_mode(), None);
        assert!(!controller.optimizer_enabled());
        assert!(probe.ops().is_empty());
    }
}
