// Batch-wide progress latch and weighted aggregation.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::resource::registry::{ResourceHandle, ResourceRegistry};

/// Lifecycle of one batch on a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Idle,
    Initialized,
    Loading,
    Loaded,
}

/// Why a batch reached the loaded state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Every preloaded resource reported full progress.
    AllLoaded,
    /// The batch had no preloaded resources.
    NothingToPreload,
    /// The timeout fired first.
    TimedOut,
}

/// Result of feeding one resource estimate into the batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressUpdate {
    /// Batch still loading; carries the new aggregate.
    Advanced(f64),
    /// This update completed the batch.
    Completed,
    /// Batch already loaded, or the resource is not part of it.
    Ignored,
}

#[derive(Debug)]
pub struct BatchState {
    pub registry: ResourceRegistry,
    pub timeout: Option<Duration>,
    pub generation: u64,
    pub cancel: CancellationToken,
    initialized: bool,
    dispatched: bool,
    loaded: bool,
    completion: Option<Completion>,
}

impl BatchState {
    pub fn new() -> Self {
        Self {
            registry: ResourceRegistry::default(),
            timeout: None,
            generation: 0,
            cancel: CancellationToken::new(),
            initialized: false,
            dispatched: false,
            loaded: false,
            completion: None,
        }
    }

    /// Abandon the current batch: cancel its tasks, move to a new generation and
    /// hand back every live handle so the caller can release it.
    pub fn abandon(&mut self) -> Vec<ResourceHandle> {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.generation += 1;
        let handles = self.registry.drain_handles();
        self.registry = ResourceRegistry::default();
        self.timeout = None;
        self.initialized = false;
        self.dispatched = false;
        self.loaded = false;
        self.completion = None;
        handles
    }

    /// Start a new batch. Returns the handles of the batch it replaces.
    pub fn begin(&mut self, registry: ResourceRegistry, timeout: Option<Duration>) -> Vec<ResourceHandle> {
        let handles = self.abandon();
        self.registry = registry;
        self.timeout = timeout;
        self.initialized = true;
        handles
    }

    pub fn mark_dispatched(&mut self) {
        self.dispatched = true;
    }

    pub fn is_dispatched(&self) -> bool {
        self.dispatched
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn completion(&self) -> Option<Completion> {
        self.completion
    }

    pub fn phase(&self) -> BatchPhase {
        if self.loaded {
            BatchPhase::Loaded
        } else if self.dispatched {
            BatchPhase::Loading
        } else if self.initialized {
            BatchPhase::Initialized
        } else {
            BatchPhase::Idle
        }
    }

    /// Set the loaded latch. Returns `true` only for the call that flips it.
    pub fn latch(&mut self, completion: Completion) -> bool {
        if self.loaded {
            return false;
        }
        self.loaded = true;
        self.completion = Some(completion);
        true
    }

    /// Read the aggregate. Once loaded this is always 1; a read that computes
    /// exactly 1 commits the latch. The flag reports whether this read did so.
    pub fn observe_progress(&mut self) -> (f64, bool) {
        if self.loaded {
            return (1.0, false);
        }
        let progress = self.registry.weighted_progress();
        if progress >= 1.0 {
            return (1.0, self.latch(Completion::AllLoaded));
        }
        (progress, false)
    }

    pub fn advance(&mut self, name: &str, value: f64) -> ProgressUpdate {
        if !self.registry.record_progress(name, value) || self.loaded {
            return ProgressUpdate::Ignored;
        }
        match self.observe_progress() {
            (_, true) => ProgressUpdate::Completed,
            (progress, false) => ProgressUpdate::Advanced(progress),
        }
    }
}

impl Default for BatchState {
    fn default() -> Self {
        Self::new()
    }
}
