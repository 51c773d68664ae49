//! Trait boundary to the external rendering engine
//!
//! The engine is an evolving external collaborator; the session controller
//! consumes it through the narrow interface below and never reaches past
//! it. Entry points the engine may or may not provide (a direct color-mode
//! setter, a downsampling regeneration hook) are default methods returning
//! `false`, so callers can probe support without optional-function plumbing.

use crate::cloud::CloudData;
use crate::color::{ClassificationFilter, ClassificationRange, ColorMode};
use crate::stats::{DownsamplingMode, FpsSettings, OptimizerStats};
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Opaque identifier of an engine's output surface.
///
/// The surface itself (a canvas, a texture view) stays inside the engine;
/// the controller only re-parents it between viewport hosts by handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(u64);

impl SurfaceHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Acquires rendering engines.
///
/// Acquisition is asynchronous (the engine module may be fetched or the
/// graphics context created lazily); failures surface as
/// [`SessionError::GraphicsInit`](crate::SessionError::GraphicsInit).
#[async_trait(?Send)]
pub trait EngineProvider {
    async fn acquire(&self) -> Result<Box<dyn PointCloudEngine>>;
}

/// One acquired rendering engine: scene, camera, output surface, loader and
/// level-of-detail optimizer, owned exclusively by a single session.
#[async_trait(?Send)]
pub trait PointCloudEngine {
    /// Handle of the output surface to re-parent into the viewport.
    fn surface(&self) -> SurfaceHandle;

    /// Resize the output surface.
    fn set_surface_size(&mut self, width: u32, height: u32);

    /// Device-pixel-ratio contribution to the surface resolution.
    fn set_pixel_ratio(&mut self, ratio: f64);

    /// Update the camera aspect ratio and refresh its projection.
    ///
    /// Returns `false` when the camera does not expose an aspect ratio.
    fn set_camera_aspect(&mut self, aspect: f32) -> bool {
        let _ = aspect;
        false
    }

    /// Advance the viewport controls (orbit damping, inertia).
    fn update_controls(&mut self);

    /// Issue one draw call for the current scene and camera.
    fn render(&mut self);

    /// Advance time-driven visual state.
    fn update_time(&mut self, seconds: f32);

    /// Load a point cloud from `path`, resolving once the cloud is decoded
    /// and uploaded. The returned summary is the engine's `getData()` view.
    async fn load(&mut self, path: &str) -> Result<CloudData>;

    /// Recompute the full color buffer for the given mode and range.
    fn update_colors(
        &mut self,
        mode: ColorMode,
        range: Option<&ClassificationRange>,
    ) -> Result<()>;

    /// Push the coloring mode into the engine's internal mode state.
    ///
    /// Later color recomputation reads this state; returns `false` when the
    /// engine has no direct setter.
    fn set_color_mode(&mut self, mode: ColorMode) -> bool {
        let _ = mode;
        false
    }

    /// Set (or clear) the classification reinterpretation range consulted
    /// by the engine's recoloring logic. Returns `false` when unsupported.
    fn set_classification_range(&mut self, range: Option<ClassificationRange>) -> bool {
        let _ = range;
        false
    }

    /// Summary of the currently loaded cloud, if any.
    fn cloud_data(&self) -> Option<&CloudData>;

    /// The engine's level-of-detail optimizer.
    fn optimizer(&self) -> &dyn LodOptimizer;

    /// Mutable access to the optimizer.
    fn optimizer_mut(&mut self) -> &mut dyn LodOptimizer;
}

/// The engine's level-of-detail subsystem: the single authority for how
/// many points are drawn each frame and which color buffer accompanies
/// them.
pub trait LodOptimizer {
    fn is_enabled(&self) -> bool;

    fn enable(&mut self);

    fn disable(&mut self);

    /// Baseline target-FPS settings for FPS-driven downsampling.
    fn set_fps_settings(&mut self, settings: FpsSettings);

    /// Hand the loaded cloud to the optimizer. Required before any
    /// downsampling can occur.
    fn on_cloud_loaded(&mut self, data: &CloudData);

    /// Adjust the visible point set from camera state and elapsed time.
    fn update(&mut self, dt: Duration);

    fn stats(&self) -> OptimizerStats;

    fn set_downsampling_mode(&mut self, mode: DownsamplingMode);

    fn downsampling_mode(&self) -> DownsamplingMode;

    /// Restrict rendering to the filter's visible classes. Excluded points
    /// are drawn at size zero on the next downsampling pass, keeping point
    /// indices stable.
    fn set_classification_filter(&mut self, filter: &ClassificationFilter);

    /// Regenerate the downsampled geometry and colors at the given factor,
    /// keeping buffer sizes consistent with what will be drawn.
    ///
    /// Returns `false` when the optimizer exposes no regeneration entry
    /// point; callers then fall back to a full-buffer color update.
    fn refresh_downsampling(&mut self, factor: f32) -> bool {
        let _ = factor;
        false
    }
}
