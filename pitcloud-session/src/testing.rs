//! Scripted engine/host doubles for controller tests
//!
//! The mock engine records every call it receives into a shared operation
//! log so tests can assert call ordering, and its load future stays pending
//! until the test resolves it, which is how teardown-during-load is driven.

use async_trait::async_trait;
use pitcloud_core::{
    ClassificationFilter, ClassificationRange, CloudData, ColorMode, DownsamplingMode,
    EngineProvider, FpsSettings, HostExtent, LodOptimizer, OptimizerStats, PointCloudEngine,
    ResizeSource, ResizeWatchId, Result, SessionError, SurfaceHandle, ViewportHost,
};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
use std::time::Duration;

/// One recorded engine or optimizer call.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOp {
    SetSurfaceSize(u32, u32),
    SetPixelRatio(f64),
    SetCameraAspect(f32),
    UpdateControls,
    Render,
    UpdateTime(f32),
    Load(String),
    UpdateColors(ColorMode, Option<ClassificationRange>),
    SetColorMode(ColorMode),
    SetClassificationRange(Option<ClassificationRange>),
    OptimizerEnable,
    OptimizerDisable,
    SetFpsSettings(f32),
    CloudLoaded(u64),
    OptimizerUpdate,
    SetDownsamplingMode(DownsamplingMode),
    SetClassificationFilter(Option<Vec<u8>>),
    RefreshDownsampling(f32),
}

/// Completes a pending mock load from outside the activation future.
#[derive(Default)]
pub struct LoadGate {
    result: RefCell<Option<Result<CloudData>>>,
}

impl LoadGate {
    pub fn resolve(&self, result: Result<CloudData>) {
        *self.result.borrow_mut() = Some(result);
    }
}

struct GateWait {
    gate: Rc<LoadGate>,
}

impl Future for GateWait {
    type Output = Result<CloudData>;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.gate.result.borrow_mut().take() {
            Some(result) => Poll::Ready(result),
            None => Poll::Pending,
        }
    }
}

/// Mutable optimizer state shared between the mock and its probe.
pub struct MockOptimizerState {
    pub enabled: bool,
    pub mode: DownsamplingMode,
    pub factor: f32,
    pub visible: u64,
    pub fps: f32,
    pub supports_refresh: bool,
    pub loaded_points: Option<u64>,
}

impl Default for MockOptimizerState {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: DownsamplingMode::Fps,
            factor: 1.0,
            visible: 0,
            fps: 0.0,
            supports_refresh: true,
            loaded_points: None,
        }
    }
}

struct MockOptimizer {
    state: Rc<RefCell<MockOptimizerState>>,
    log: Rc<RefCell<Vec<EngineOp>>>,
}

impl LodOptimizer for MockOptimizer {
    fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    fn enable(&mut self) {
        self.state.borrow_mut().enabled = true;
        self.log.borrow_mut().push(EngineOp::OptimizerEnable);
    }

    fn disable(&mut self) {
        self.state.borrow_mut().enabled = false;
        self.log.borrow_mut().push(EngineOp::OptimizerDisable);
    }

    fn set_fps_settings(&mut self, settings: FpsSettings) {
        self.log
            .borrow_mut()
            .push(EngineOp::SetFpsSettings(settings.min_fps));
    }

    fn on_cloud_loaded(&mut self, data: &CloudData) {
        let mut state = self.state.borrow_mut();
        state.loaded_points = Some(data.point_count);
        state.visible = data.point_count;
        drop(state);
        self.log
            .borrow_mut()
            .push(EngineOp::CloudLoaded(data.point_count));
    }

    fn update(&mut self, _dt: Duration) {
        self.log.borrow_mut().push(EngineOp::OptimizerUpdate);
    }

    fn stats(&self) -> OptimizerStats {
        let state = self.state.borrow();
        OptimizerStats {
            visible_point_count: state.visible,
            downsampling_factor: state.factor,
            current_fps: state.fps,
        }
    }

    fn set_downsampling_mode(&mut self, mode: DownsamplingMode) {
        self.state.borrow_mut().mode = mode;
        self.log.borrow_mut().push(EngineOp::SetDownsamplingMode(mode));
    }

    fn downsampling_mode(&self) -> DownsamplingMode {
        self.state.borrow().mode
    }

    fn set_classification_filter(&mut self, filter: &ClassificationFilter) {
        self.log.borrow_mut().push(EngineOp::SetClassificationFilter(
            filter.visible_classes().map(|classes| classes.to_vec()),
        ));
    }

    fn refresh_downsampling(&mut self, factor: f32) -> bool {
        if !self.state.borrow().supports_refresh {
            return false;
        }
        self.log
            .borrow_mut()
            .push(EngineOp::RefreshDownsampling(factor));
        true
    }
}

/// Tweakable knobs for a scripted engine.
pub struct MockEngineConfig {
    pub surface_id: u64,
    pub supports_color_mode: bool,
    pub supports_classification_range: bool,
    pub supports_refresh: bool,
    pub downsampling_factor: f32,
}

impl Default for MockEngineConfig {
    fn default() -> Self {
        Self {
            surface_id: 1,
            supports_color_mode: true,
            supports_classification_range: true,
            supports_refresh: true,
            downsampling_factor: 1.0,
        }
    }
}

/// Handles a test keeps after the engine has been moved into the provider.
pub struct EngineProbe {
    pub surface: SurfaceHandle,
    pub log: Rc<RefCell<Vec<EngineOp>>>,
    pub gate: Rc<LoadGate>,
    pub optimizer: Rc<RefCell<MockOptimizerState>>,
    pub live: Rc<Cell<usize>>,
}

impl EngineProbe {
    pub fn ops(&self) -> Vec<EngineOp> {
        self.log.borrow().clone()
    }

    pub fn clear_ops(&self) {
        self.log.borrow_mut().clear();
    }
}

struct LiveGuard(Rc<Cell<usize>>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

pub struct MockEngine {
    surface: SurfaceHandle,
    supports_color_mode: bool,
    supports_classification_range: bool,
    cloud: Option<CloudData>,
    log: Rc<RefCell<Vec<EngineOp>>>,
    gate: Rc<LoadGate>,
    optimizer: MockOptimizer,
    _live: LiveGuard,
}

impl MockEngine {
    /// Build an engine plus the probe a test uses to script and observe it.
    pub fn scripted(config: MockEngineConfig) -> (Box<dyn PointCloudEngine>, EngineProbe) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let gate = Rc::new(LoadGate::default());
        let optimizer_state = Rc::new(RefCell::new(MockOptimizerState {
            supports_refresh: config.supports_refresh,
            factor: config.downsampling_factor,
            ..MockOptimizerState::default()
        }));
        let live = Rc::new(Cell::new(1));
        let surface = SurfaceHandle::new(config.surface_id);

        let engine = MockEngine {
            surface,
            supports_color_mode: config.supports_color_mode,
            supports_classification_range: config.supports_classification_range,
            cloud: None,
            log: log.clone(),
            gate: gate.clone(),
            optimizer: MockOptimizer {
                state: optimizer_state.clone(),
                log: log.clone(),
            },
            _live: LiveGuard(live.clone()),
        };

        let probe = EngineProbe {
            surface,
            log,
            gate,
            optimizer: optimizer_state,
            live,
        };
        (Box::new(engine), probe)
    }
}

#[async_trait(?Send)]
impl PointCloudEngine for MockEngine {
    fn surface(&self) -> SurfaceHandle {
        self.surface
    }

    fn set_surface_size(&mut self, width: u32, height: u32) {
        self.log
            .borrow_mut()
            .push(EngineOp::SetSurfaceSize(width, height));
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.log.borrow_mut().push(EngineOp::SetPixelRatio(ratio));
    }

    fn set_camera_aspect(&mut self, aspect: f32) -> bool {
        self.log.borrow_mut().push(EngineOp::SetCameraAspect(aspect));
        true
    }

    fn update_controls(&mut self) {
        self.log.borrow_mut().push(EngineOp::UpdateControls);
    }

    fn render(&mut self) {
        self.log.borrow_mut().push(EngineOp::Render);
    }

    fn update_time(&mut self, seconds: f32) {
        self.log.borrow_mut().push(EngineOp::UpdateTime(seconds));
    }

    async fn load(&mut self, path: &str) -> Result<CloudData> {
        self.log.borrow_mut().push(EngineOp::Load(path.to_string()));
        let result = GateWait {
            gate: self.gate.clone(),
        }
        .await;
        if let Ok(data) = &result {
            self.cloud = Some(data.clone());
        }
        result
    }

    fn update_colors(
        &mut self,
        mode: ColorMode,
        range: Option<&ClassificationRange>,
    ) -> Result<()> {
        self.log
            .borrow_mut()
            .push(EngineOp::UpdateColors(mode, range.copied()));
        Ok(())
    }

    fn set_color_mode(&mut self, mode: ColorMode) -> bool {
        if !self.supports_color_mode {
            return false;
        }
        self.log.borrow_mut().push(EngineOp::SetColorMode(mode));
        true
    }

    fn set_classification_range(&mut self, range: Option<ClassificationRange>) -> bool {
        if !self.supports_classification_range {
            return false;
        }
        self.log
            .borrow_mut()
            .push(EngineOp::SetClassificationRange(range));
        true
    }

    fn cloud_data(&self) -> Option<&CloudData> {
        self.cloud.as_ref()
    }

    fn optimizer(&self) -> &dyn LodOptimizer {
        &self.optimizer
    }

    fn optimizer_mut(&mut self) -> &mut dyn LodOptimizer {
        &mut self.optimizer
    }
}

/// Provider handing out pre-scripted engines in order.
pub struct MockProvider {
    engines: RefCell<VecDeque<Box<dyn PointCloudEngine>>>,
    pub acquire_count: Rc<Cell<usize>>,
    fail_with: Option<String>,
}

impl MockProvider {
    pub fn new(engines: Vec<Box<dyn PointCloudEngine>>) -> Self {
        Self {
            engines: RefCell::new(engines.into()),
            acquire_count: Rc::new(Cell::new(0)),
            fail_with: None,
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            engines: RefCell::new(VecDeque::new()),
            acquire_count: Rc::new(Cell::new(0)),
            fail_with: Some(message.into()),
        }
    }
}

#[async_trait(?Send)]
impl EngineProvider for MockProvider {
    async fn acquire(&self) -> Result<Box<dyn PointCloudEngine>> {
        self.acquire_count.set(self.acquire_count.get() + 1);
        if let Some(message) = &self.fail_with {
            return Err(SessionError::graphics_init(message.clone()));
        }
        self.engines
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| SessionError::graphics_init("no engine scripted"))
    }
}

/// In-memory viewport container.
pub struct MockHost {
    pub connected: bool,
    pub extent: HostExtent,
    pub attached: Vec<SurfaceHandle>,
    pub frame_requests: usize,
    watches: HashMap<ResizeWatchId, (ResizeSource, Rc<Cell<bool>>)>,
    next_watch: u64,
}

impl MockHost {
    pub fn new(width: u32, height: u32, pixel_ratio: f64) -> Self {
        Self {
            connected: true,
            extent: HostExtent::new(width, height, pixel_ratio),
            attached: Vec::new(),
            frame_requests: 0,
            watches: HashMap::new(),
            next_watch: 0,
        }
    }

    pub fn surface_count(&self) -> usize {
        self.attached.len()
    }

    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }

    /// Fire a size-change notification from one source.
    pub fn trigger_resize(&self, source: ResizeSource) {
        for (watch_source, flag) in self.watches.values() {
            if *watch_source == source {
                flag.set(true);
            }
        }
    }
}

impl ViewportHost for MockHost {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn measure(&self) -> HostExtent {
        self.extent
    }

    fn adopt_surface(&mut self, surface: &SurfaceHandle) {
        self.attached.retain(|attached| attached != surface);
        self.attached.push(*surface);
    }

    fn release_surface(&mut self, surface: &SurfaceHandle) {
        self.attached.retain(|attached| attached != surface);
    }

    fn watch_resize(&mut self, source: ResizeSource, flag: Rc<Cell<bool>>) -> ResizeWatchId {
        self.next_watch += 1;
        let id = ResizeWatchId::new(self.next_watch);
        self.watches.insert(id, (source, flag));
        id
    }

    fn unwatch_resize(&mut self, watch: ResizeWatchId) {
        self.watches.remove(&watch);
    }

    fn request_frame(&mut self) {
        self.frame_requests += 1;
    }
}

fn noop_raw_waker() -> RawWaker {
    fn clone(_: *const ()) -> RawWaker {
        noop_raw_waker()
    }
    fn no_op(_: *const ()) {}

    static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
    RawWaker::new(std::ptr::null(), &VTABLE)
}

/// Poll a future exactly once without a real executor.
pub fn poll_once<F: Future>(future: &mut Pin<Box<F>>) -> Poll<F::Output> {
    let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    future.as_mut().poll(&mut cx)
}
