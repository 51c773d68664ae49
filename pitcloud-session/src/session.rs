//! Session lifecycle management
//!
//! A [`SessionController`] owns at most one live [`Session`]: one complete
//! acquire → load → render → teardown cycle bound to one container, source
//! path and optimizer flag. Activation is asynchronous and checks the
//! session's mounted flag after every suspension point, so a teardown that
//! lands mid-acquisition abandons the in-flight engine without touching the
//! container or any shared state.

use crate::callbacks::{SessionCallbacks, SessionStatus};
use crate::coloring;
use crate::config::SessionConfig;
use crate::frame_loop::{FrameClock, FrameToken};
use crate::resize;
use instant::Instant;
use log::{debug, info, warn};
use pitcloud_core::{
    ClassificationFilter, ClassificationRange, ColorMode, EngineProvider, PointCloudEngine,
    ResizeSource, ResizeWatchId, SessionError, SurfaceHandle, ViewerStats, ViewportHost,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Provisional frame rate reported in the initial statistics snapshot,
/// before the first sampling window has closed.
const INITIAL_FPS: u32 = 60;

/// State of one acquire→load→render→teardown cycle.
struct Session {
    /// Cleared synchronously at teardown; every suspension point and loop
    /// iteration re-checks it.
    mounted: Rc<Cell<bool>>,
    /// Held engine. `None` until load completes and after teardown; the
    /// engine travels inside the activation future in between.
    engine: Option<Box<dyn PointCloudEngine>>,
    surface: Option<SurfaceHandle>,
    resize_watches: Vec<ResizeWatchId>,
    /// Set by the host's resize watches, drained at the next iteration.
    resize_pending: Rc<Cell<bool>>,
    frame_token: Option<Rc<FrameToken>>,
    clock: FrameClock,
    loaded: bool,
    total_points: u64,
}

impl Session {
    fn new(mounted: Rc<Cell<bool>>) -> Self {
        Self {
            mounted,
            engine: None,
            surface: None,
            resize_watches: Vec::new(),
            resize_pending: Rc::new(Cell::new(false)),
            frame_token: None,
            clock: FrameClock::new(),
            loaded: false,
            total_points: 0,
        }
    }
}

pub(crate) struct ControllerInner {
    pub(crate) host: Rc<RefCell<dyn ViewportHost>>,
    pub(crate) provider: Box<dyn EngineProvider>,
    pub(crate) config: RefCell<SessionConfig>,
    pub(crate) callbacks: RefCell<SessionCallbacks>,
    pub(crate) session: RefCell<Option<Session>>,
    pub(crate) is_loading: Cell<bool>,
    pub(crate) error: RefCell<Option<String>>,
    pub(crate) stats: RefCell<Option<ViewerStats>>,
}

/// Controller for point cloud rendering sessions inside one viewport
/// container.
///
/// Cheap to clone; clones share the same session. The embedding drives the
/// render loop by calling [`render_frame`](Self::render_frame) whenever the
/// host delivers the frame it was asked to schedule.
#[derive(Clone)]
pub struct SessionController {
    pub(crate) inner: Rc<ControllerInner>,
}

impl SessionController {
    pub fn new(
        host: Rc<RefCell<dyn ViewportHost>>,
        provider: Box<dyn EngineProvider>,
        config: SessionConfig,
    ) -> Self {
        Self {
            inner: Rc::new(ControllerInner {
                host,
                provider,
                config: RefCell::new(config),
                callbacks: RefCell::new(SessionCallbacks::new()),
                session: RefCell::new(None),
                is_loading: Cell::new(false),
                error: RefCell::new(None),
                stats: RefCell::new(None),
            }),
        }
    }

    /// Replace the dashboard hooks.
    pub fn set_callbacks(&self, callbacks: SessionCallbacks) {
        *self.inner.callbacks.borrow_mut() = callbacks;
    }

    /// Current loading/error/statistics view.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            is_loading: self.inner.is_loading.get(),
            error: self.inner.error.borrow().clone(),
            stats: self.inner.stats.borrow().clone(),
        }
    }

    /// Whether a session currently holds an engine.
    pub fn holds_engine(&self) -> bool {
        self.inner
            .session
            .borrow()
            .as_ref()
            .map_or(false, |session| session.engine.is_some())
    }

    /// Begin a session for the current configuration.
    ///
    /// Tears down any previous session first, then runs acquisition,
    /// surface adoption, initial sizing, optimizer setup, load, and starts
    /// the render loop. Failures leave nothing attached to the container
    /// and are surfaced through [`status`](Self::status) and the error
    /// callback; retry is a fresh `activate`, never a partial repair.
    pub async fn activate(&self) {
        self.deactivate();

        let mounted = Rc::new(Cell::new(true));
        *self.inner.session.borrow_mut() = Some(Session::new(mounted.clone()));
        *self.inner.error.borrow_mut() = None;
        *self.inner.stats.borrow_mut() = None;
        self.set_loading(true);

        let result = self.run_activation(&mounted).await;

        if !mounted.get() {
            // Deactivated while suspended; cleanup already happened.
            return;
        }
        match result {
            Ok(()) => self.set_loading(false),
            Err(error) => {
                self.deactivate();
                self.set_loading(false);
                self.report_error(&error);
            }
        }
    }

    async fn run_activation(&self, mounted: &Rc<Cell<bool>>) -> Result<(), SessionError> {
        let inner = &self.inner;
        let (source_path, optimizer_enabled, fps_settings) = {
            let config = inner.config.borrow();
            (
                config.source_path.clone(),
                config.optimizer_enabled,
                config.fps_settings,
            )
        };

        if !inner.host.borrow().is_connected() {
            return Err(SessionError::ContainerMissing);
        }

        info!("activating point cloud session for {source_path}");
        let mut engine = inner.provider.acquire().await?;
        if !mounted.get() {
            debug!("session torn down during engine acquisition; discarding engine");
            return Ok(());
        }

        // Move the output surface into the container (the host removes it
        // from any prior parent), then size it before the first frame so
        // there is no flash at the wrong aspect ratio.
        let surface = engine.surface();
        inner.host.borrow_mut().adopt_surface(&surface);
        let extent = inner.host.borrow().measure();
        resize::apply_extent(engine.as_mut(), extent);

        // Record the surface and resize watches on the session immediately,
        // so teardown can undo them even if loading never completes.
        {
            let mut slot = inner.session.borrow_mut();
            let Some(session) = slot.as_mut() else {
                drop(slot);
                inner.host.borrow_mut().release_surface(&surface);
                return Ok(());
            };
            session.surface = Some(surface);
            let mut host = inner.host.borrow_mut();
            session.resize_watches = vec![
                host.watch_resize(ResizeSource::Window, session.resize_pending.clone()),
                host.watch_resize(ResizeSource::Element, session.resize_pending.clone()),
            ];
        }

        if optimizer_enabled {
            let optimizer = engine.optimizer_mut();
            optimizer.enable();
            optimizer.set_fps_settings(fps_settings);
        }

        let load_result = engine.load(&source_path).await;
        if !mounted.get() {
            debug!("session torn down during load; discarding engine");
            engine.optimizer_mut().disable();
            return Ok(());
        }
        let data = match load_result {
            Ok(data) => data,
            Err(error) => {
                engine.optimizer_mut().disable();
                return Err(error);
            }
        };

        // The optimizer must see the cloud before any downsampling pass.
        engine.optimizer_mut().on_cloud_loaded(&data);
        let total_points = data.point_count;
        info!("point cloud loaded: {total_points} points");

        // Bring engine coloring in line with the configured state, re-read
        // here so changes that arrived while loading are not lost.
        let coloring_config = inner.config.borrow().coloring.clone();
        coloring::sync_colors(engine.as_mut(), &coloring_config)?;
        if !coloring_config.classification_filter.is_unrestricted() {
            coloring::sync_filter(engine.as_mut(), &coloring_config.classification_filter);
        }

        // Initial snapshot: the full point count at a provisional rate.
        self.publish_stats(ViewerStats::new(total_points, total_points, INITIAL_FPS));

        // Hand the engine to the session and start the loop.
        {
            let mut slot = inner.session.borrow_mut();
            match slot.as_mut() {
                Some(session) if mounted.get() => {
                    session.engine = Some(engine);
                    session.total_points = total_points;
                    session.loaded = true;
                    session.frame_token = Some(Rc::new(FrameToken::new()));
                }
                _ => {
                    // A stats callback tore the session down.
                    drop(slot);
                    engine.optimizer_mut().disable();
                    return Ok(());
                }
            }
        }
        inner.host.borrow_mut().request_frame();
        Ok(())
    }

    /// Tear the session down from any state, including mid-acquisition.
    ///
    /// Safe to call repeatedly and when activation never completed: cancels
    /// the frame token, removes both resize watches, detaches the surface,
    /// disables the optimizer and drops the engine.
    pub fn deactivate(&self) {
        let Some(mut session) = self.inner.session.borrow_mut().take() else {
            return;
        };
        debug!("tearing down point cloud session");
        session.mounted.set(false);
        if let Some(token) = session.frame_token.take() {
            token.cancel();
        }
        {
            let mut host = self.inner.host.borrow_mut();
            for watch in session.resize_watches.drain(..) {
                host.unwatch_resize(watch);
            }
            if let Some(surface) = session.surface.take() {
                host.release_surface(&surface);
            }
        }
        if let Some(mut engine) = session.engine.take() {
            engine.optimizer_mut().disable();
        }
        self.set_loading(false);
    }

    /// Apply a new configuration.
    ///
    /// A changed source path or optimizer flag forces a full teardown and
    /// re-acquisition; coloring-only changes are synchronized into the live
    /// session without a rebuild.
    pub async fn reconfigure(&self, config: SessionConfig) {
        let (rebuild, previous_coloring) = {
            let current = self.inner.config.borrow();
            (current.requires_rebuild(&config), current.coloring.clone())
        };
        let new_coloring = config.coloring.clone();
        *self.inner.config.borrow_mut() = config;

        if rebuild || self.inner.session.borrow().is_none() {
            self.activate().await;
            return;
        }

        if previous_coloring.mode != new_coloring.mode
            || previous_coloring.classification_range != new_coloring.classification_range
        {
            self.resync_colors();
        }
        if previous_coloring.classification_filter != new_coloring.classification_filter {
            self.resync_filter();
        }
    }

    /// Switch the coloring mode on the live session.
    pub fn set_color_mode(&self, mode: ColorMode) {
        let changed = {
            let mut config = self.inner.config.borrow_mut();
            let changed = config.coloring.mode != mode;
            config.coloring.mode = mode;
            changed
        };
        if changed {
            self.resync_colors();
        }
    }

    /// Set or clear the classification reinterpretation range.
    pub fn set_classification_range(&self, range: Option<ClassificationRange>) {
        let changed = {
            let mut config = self.inner.config.borrow_mut();
            let changed = config.coloring.classification_range != range;
            config.coloring.classification_range = range;
            changed
        };
        if changed {
            self.resync_colors();
        }
    }

    /// Restrict rendering to a set of classification values.
    pub fn set_classification_filter(&self, filter: ClassificationFilter) {
        let changed = {
            let mut config = self.inner.config.borrow_mut();
            let changed = config.coloring.classification_filter != filter;
            config.coloring.classification_filter = filter;
            changed
        };
        if changed {
            self.resync_filter();
        }
    }

    /// One render loop iteration, driven by the host's frame scheduling.
    ///
    /// Checks the mounted flag and frame token first and stops scheduling
    /// the moment either cancels, so at most one iteration can run after a
    /// teardown request.
    pub fn render_frame(&self, now: Instant) {
        let inner = &self.inner;
        let mut emitted: Option<ViewerStats> = None;
        let mut frame_drawn = false;
        {
            let mut slot = inner.session.borrow_mut();
            let Some(session) = slot.as_mut() else {
                return;
            };
            if !session.mounted.get() {
                return;
            }
            let Some(token) = session.frame_token.as_ref() else {
                return;
            };
            if token.is_cancelled() {
                return;
            }

            if session.resize_pending.replace(false) {
                let extent = inner.host.borrow().measure();
                if let Some(engine) = session.engine.as_mut() {
                    resize::apply_extent(engine.as_mut(), extent);
                }
            }

            let total_points = session.total_points;
            let timing = session.clock.tick(now);
            let Some(engine) = session.engine.as_mut() else {
                return;
            };

            engine.update_time(timing.elapsed.as_secs_f32());
            engine.update_controls();
            if engine.optimizer().is_enabled() {
                engine.optimizer_mut().update(timing.delta);
            }
            engine.render();
            frame_drawn = true;

            if let Some(fps) = timing.fps_sample {
                let rendered = if engine.optimizer().is_enabled() {
                    engine.optimizer().stats().visible_point_count
                } else {
                    total_points
                };
                emitted = Some(ViewerStats::new(total_points, rendered, fps));
            }
        }

        // Callbacks run outside the session borrow so they may call back
        // into the controller (including deactivating it).
        if frame_drawn {
            if let Some(callback) = inner.callbacks.borrow_mut().on_frame.as_mut() {
                callback();
            }
            if let Some(stats) = emitted {
                self.publish_stats(stats);
            }
            let still_mounted = inner
                .session
                .borrow()
                .as_ref()
                .map_or(false, |session| session.mounted.get());
            if still_mounted {
                inner.host.borrow_mut().request_frame();
            }
        }
    }

    fn resync_colors(&self) {
        let coloring_config = self.inner.config.borrow().coloring.clone();
        let result = self.with_loaded_engine(|engine| coloring::sync_colors(engine, &coloring_config));
        if let Some(Err(error)) = result {
            self.report_error(&error);
        }
    }

    fn resync_filter(&self) {
        let filter = self
            .inner
            .config
            .borrow()
            .coloring
            .classification_filter
            .clone();
        self.with_loaded_engine(|engine| coloring::sync_filter(engine, &filter));
    }

    /// Run `f` against the engine of a fully loaded session, or do nothing.
    pub(crate) fn with_loaded_engine<R>(
        &self,
        f: impl FnOnce(&mut dyn PointCloudEngine) -> R,
    ) -> Option<R> {
        let mut slot = self.inner.session.borrow_mut();
        let session = slot.as_mut()?;
        if !session.loaded {
            return None;
        }
        let engine = session.engine.as_mut()?;
        Some(f(engine.as_mut()))
    }

    fn set_loading(&self, loading: bool) {
        if self.inner.is_loading.replace(loading) != loading {
            if let Some(callback) = self.inner.callbacks.borrow_mut().on_loading.as_mut() {
                callback(loading);
            }
        }
    }

    fn publish_stats(&self, stats: ViewerStats) {
        *self.inner.stats.borrow_mut() = Some(stats.clone());
        if let Some(callback) = self.inner.callbacks.borrow_mut().on_stats.as_mut() {
            callback(&stats);
        }
    }

    fn report_error(&self, error: &SessionError) {
        let message = error.to_string();
        {
            let mut slot = self.inner.error.borrow_mut();
            if slot.as_deref() == Some(message.as_str()) {
                return;
            }
            *slot = Some(message.clone());
        }
        warn!("point cloud session error: {message}");
        if let Some(callback) = self.inner.callbacks.borrow_mut().on_error.as_mut() {
            callback(&message);
        }
    }
}

impl Drop for ControllerInner {
    fn drop(&mut self) {
        // The controller may be dropped without an explicit deactivate;
        // make sure a live frame token cannot fire again.
        if let Some(session) = self.session.borrow_mut().take() {
            session.mounted.set(false);
            if let Some(token) = session.frame_token.as_ref() {
                token.cancel();
            }
        }
    }
}
