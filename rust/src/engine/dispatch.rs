// Load dispatch: routes each resource to its strategy and carries batch identity
// into the spawned tasks so events from an abandoned batch are dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::aggregate::{BatchState, Completion, ProgressUpdate};
use super::manager::Shared;
use super::{image, media};
use crate::resource::spec::ResourceKind;
use crate::source::traits::{ImageFetcher, MediaBackend};

/// Handle a strategy task uses to talk back to the batch that started it.
#[derive(Clone)]
pub(crate) struct BatchContext {
    shared: Arc<Shared>,
    generation: u64,
    cancel: CancellationToken,
}

impl BatchContext {
    pub(crate) fn new(shared: Arc<Shared>, state: &BatchState) -> Self {
        Self {
            shared,
            generation: state.generation,
            cancel: state.cancel.clone(),
        }
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    fn is_current(&self, state: &BatchState) -> bool {
        state.generation == self.generation
    }

    /// Feed a resource estimate into the batch and fire the matching handlers.
    /// Returns `None` when the batch has been replaced.
    pub(crate) fn report_progress(&self, name: &str, value: f64) -> Option<ProgressUpdate> {
        let update = {
            let mut state = self.shared.state.lock();
            if !self.is_current(&state) {
                return None;
            }
            state.advance(name, value)
        };

        match update {
            ProgressUpdate::Advanced(progress) => {
                debug!("resource {} at {:.3}, batch at {:.3}", name, value, progress);
                self.shared.handlers().emit_progress(progress, Some(name));
            }
            ProgressUpdate::Completed => {
                info!("batch loaded, last resource {}", name);
                self.shared.announce_completion(Some(name));
            }
            ProgressUpdate::Ignored => {
                debug!("resource {} update at {:.3} ignored, batch already loaded", name, value);
            }
        }
        Some(update)
    }

    pub(crate) fn report_error(&self, name: &str, error: anyhow::Error) {
        if !self.is_current(&self.shared.state.lock()) {
            return;
        }
        warn!("resource {} failed: {:#}", name, error);
        self.shared.handlers().emit_error(&error, name);
    }

    /// Whether the batch is done with, either loaded or replaced.
    pub(crate) fn is_settled(&self) -> bool {
        let state = self.shared.state.lock();
        !self.is_current(&state) || state.is_loaded()
    }

    /// Remove the handle of `name` from the registry and tear it down.
    pub(crate) fn release_handle(&self, name: &str) {
        let handle = {
            let mut state = self.shared.state.lock();
            if !self.is_current(&state) {
                return;
            }
            state.registry.take_handle(name)
        };
        if let Some(handle) = handle {
            debug!("resource {} handle released", name);
            handle.release();
        }
    }

    fn force_complete(&self) {
        let latched = {
            let mut state = self.shared.state.lock();
            self.is_current(&state) && state.latch(Completion::TimedOut)
        };
        if latched {
            warn!("batch timed out, forcing completion");
            self.shared.announce_completion(None);
        }
    }
}

/// Start every resource of the batch. Non-preloaded resources are satisfied
/// without any activity. Returns resources whose strategy failed to start.
pub(crate) fn dispatch(
    ctx: &BatchContext,
    state: &mut BatchState,
    images: &Arc<dyn ImageFetcher>,
    media_backend: &Arc<dyn MediaBackend>,
) -> Vec<(String, anyhow::Error)> {
    let specs: Vec<_> = state.registry.iter().map(|s| s.spec.clone()).collect();
    let mut failures = Vec::new();

    for spec in specs {
        if !spec.preloads() {
            state.registry.record_progress(&spec.name, 1.0);
            continue;
        }

        let started = match spec.kind {
            ResourceKind::Image => Ok(image::load_image(ctx, images, &spec)),
            ResourceKind::Video | ResourceKind::Audio => media::load_media(ctx, media_backend, &spec),
        };

        match started {
            Ok(handle) => {
                debug!("resource {} ({}) dispatched src={}", spec.name, spec.kind, spec.src);
                state.registry.attach_handle(&spec.name, handle);
            }
            Err(e) => failures.push((spec.name, e)),
        }
    }

    failures
}

/// Force-complete the batch after `timeout` unless it is replaced first.
pub(crate) fn spawn_timeout(ctx: BatchContext, timeout: Duration) {
    tokio::spawn(async move {
        let cancel = ctx.cancel_token().clone();
        tokio::select! {
            _ = tokio::time::sleep(timeout) => ctx.force_complete(),
            _ = cancel.cancelled() => {}
        }
    });
}
