use std::fmt;
use std::sync::Arc;

/// `(aggregate progress, resource name)`; the name is `None` for timeout completion.
pub type ProgressHandler = Arc<dyn Fn(f64, Option<&str>) + Send + Sync>;
pub type CompleteHandler = Arc<dyn Fn() + Send + Sync>;
/// `(error, resource name)`.
pub type ErrorHandler = Arc<dyn Fn(&anyhow::Error, &str) + Send + Sync>;

/// Optional batch handlers. Absent handlers are simply not called.
///
/// Handlers are merged field by field: a handler present in the newer set
/// replaces the registered one, an absent one keeps it.
#[derive(Clone, Default)]
pub struct LoadHandlers {
    on_progress: Option<ProgressHandler>,
    on_complete: Option<CompleteHandler>,
    on_error: Option<ErrorHandler>,
}

impl LoadHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_progress(mut self, f: impl Fn(f64, Option<&str>) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&anyhow::Error, &str) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub fn has_progress(&self) -> bool {
        self.on_progress.is_some()
    }

    pub fn has_complete(&self) -> bool {
        self.on_complete.is_some()
    }

    pub fn has_error(&self) -> bool {
        self.on_error.is_some()
    }

    /// Overlay `newer` onto `self`.
    pub fn merge(&mut self, newer: LoadHandlers) {
        if let Some(f) = newer.on_progress {
            self.on_progress = Some(f);
        }
        if let Some(f) = newer.on_complete {
            self.on_complete = Some(f);
        }
        if let Some(f) = newer.on_error {
            self.on_error = Some(f);
        }
    }

    pub(crate) fn emit_progress(&self, progress: f64, current: Option<&str>) {
        if let Some(f) = &self.on_progress {
            f(progress, current);
        }
    }

    pub(crate) fn emit_complete(&self) {
        if let Some(f) = &self.on_complete {
            f();
        }
    }

    pub(crate) fn emit_error(&self, error: &anyhow::Error, current: &str) {
        if let Some(f) = &self.on_error {
            f(error, current);
        }
    }
}

impl fmt::Debug for LoadHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadHandlers")
            .field("on_progress", &self.has_progress())
            .field("on_complete", &self.has_complete())
            .field("on_error", &self.has_error())
            .finish()
    }
}
