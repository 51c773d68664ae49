//! Callbacks and status handed back to the dashboard

use pitcloud_core::ViewerStats;

/// Hooks the dashboard registers on a session controller.
///
/// All hooks run on the controller's thread. `on_stats` fires at most once
/// per sampling window, `on_loading` only on actual transitions, `on_error`
/// once per distinct failure, and `on_frame` every loop iteration for
/// overlays that redraw in sync with the scene.
#[derive(Default)]
pub struct SessionCallbacks {
    pub(crate) on_stats: Option<Box<dyn FnMut(&ViewerStats)>>,
    pub(crate) on_loading: Option<Box<dyn FnMut(bool)>>,
    pub(crate) on_error: Option<Box<dyn FnMut(&str)>>,
    pub(crate) on_frame: Option<Box<dyn FnMut()>>,
}

impl SessionCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_stats(mut self, callback: impl FnMut(&ViewerStats) + 'static) -> Self {
        self.on_stats = Some(Box::new(callback));
        self
    }

    pub fn on_loading(mut self, callback: impl FnMut(bool) + 'static) -> Self {
        self.on_loading = Some(Box::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl FnMut(&str) + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    pub fn on_frame(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_frame = Some(Box::new(callback));
        self
    }
}

impl std::fmt::Debug for SessionCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCallbacks")
            .field("on_stats", &self.on_stats.is_some())
            .field("on_loading", &self.on_loading.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_frame", &self.on_frame.is_some())
            .finish()
    }
}

/// Point-in-time view of a session for the dashboard.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionStatus {
    pub is_loading: bool,
    pub error: Option<String>,
    pub stats: Option<ViewerStats>,
}
