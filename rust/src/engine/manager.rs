// Public preloading surface: batch setup, dispatch, progress queries and teardown.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::Client;
use tokio::sync::watch;
use tracing::{debug, info};

use super::aggregate::BatchState;
pub use super::aggregate::{BatchPhase, Completion};
use super::callbacks::LoadHandlers;
use super::dispatch::{dispatch, spawn_timeout, BatchContext};
use crate::config::HttpBackendConfig;
use crate::error::PreloadError;
use crate::resource::registry::{ResourceHandle, ResourceRegistry};
use crate::resource::spec::{Manifest, ResourceKind, ResourceSpec};
use crate::source::http_image::HttpImageFetcher;
use crate::source::http_media::HttpMediaBackend;
use crate::source::traits::{ImageFetcher, MediaBackend};

/// Per-resource view for progress displays.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceProgress {
    pub name: String,
    pub kind: ResourceKind,
    pub preload: bool,
    pub weight: f64,
    pub progress: f64,
    /// A platform handle is still attached.
    pub in_flight: bool,
}

pub(crate) struct Shared {
    pub(crate) state: Mutex<BatchState>,
    handlers: Mutex<LoadHandlers>,
    loaded_tx: watch::Sender<bool>,
}

impl Shared {
    /// Snapshot of the registered handlers, so none are called under a lock.
    pub(crate) fn handlers(&self) -> LoadHandlers {
        self.handlers.lock().clone()
    }

    /// Fire the completion pair for the transition into `Loaded`.
    pub(crate) fn announce_completion(&self, current: Option<&str>) {
        self.loaded_tx.send_replace(true);
        let handlers = self.handlers();
        handlers.emit_progress(1.0, current);
        handlers.emit_complete();
    }
}

/// Preloads a batch of image, video and audio resources and reports weighted progress.
///
/// Cloning is cheap and every clone drives the same batch. `load` spawns its
/// work onto the current Tokio runtime.
#[derive(Clone)]
pub struct ResourceManager {
    shared: Arc<Shared>,
    images: Arc<dyn ImageFetcher>,
    media: Arc<dyn MediaBackend>,
}

impl ResourceManager {
    pub fn new(images: Arc<dyn ImageFetcher>, media: Arc<dyn MediaBackend>) -> Self {
        let (loaded_tx, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(BatchState::new()),
                handlers: Mutex::new(LoadHandlers::default()),
                loaded_tx,
            }),
            images,
            media,
        }
    }

    /// Manager backed by the reqwest image fetcher and media backend.
    pub fn http(config: HttpBackendConfig) -> Self {
        let client = Client::new();
        Self::new(
            Arc::new(HttpImageFetcher::new(client.clone(), config.clone())),
            Arc::new(HttpMediaBackend::new(client, config)),
        )
    }

    /// Replace the current batch with `resources`. A zero timeout means none.
    pub fn init(&self, resources: Vec<ResourceSpec>, timeout: Option<Duration>) -> &Self {
        let timeout = timeout.filter(|t| !t.is_zero());
        let registry = ResourceRegistry::from_specs(resources);
        info!(
            "batch init resources={} preload={} total_weight={} timeout={:?}",
            registry.len(),
            registry.preload_count(),
            registry.total_weight(),
            timeout
        );

        let stale = self.shared.state.lock().begin(registry, timeout);
        release_all(stale);
        self.shared.loaded_tx.send_replace(false);
        self
    }

    pub fn init_manifest(&self, manifest: Manifest) -> &Self {
        let timeout = manifest.timeout();
        self.init(manifest.resources, timeout)
    }

    /// Start loading the current batch. Handlers present in `handlers` replace
    /// the registered ones.
    ///
    /// A batch without preloaded resources completes synchronously. Calling
    /// `load` again on a dispatched batch only updates the handlers.
    pub fn load(&self, handlers: LoadHandlers) -> &Self {
        self.shared.handlers.lock().merge(handlers);

        let (ctx, timeout, failures, nothing_to_preload) = {
            let mut state = self.shared.state.lock();
            if state.is_dispatched() {
                debug!("load called on a dispatched batch, handlers updated only");
                return self;
            }
            state.mark_dispatched();
            let ctx = BatchContext::new(Arc::clone(&self.shared), &state);

            if state.registry.preload_count() == 0 {
                state.latch(Completion::NothingToPreload);
                (ctx, None, Vec::new(), true)
            } else {
                let failures = dispatch(&ctx, &mut state, &self.images, &self.media);
                (ctx, state.timeout, failures, false)
            }
        };

        if nothing_to_preload {
            info!("batch has nothing to preload, completing immediately");
            self.shared.loaded_tx.send_replace(true);
            self.shared.handlers().emit_complete();
            return self;
        }

        for (name, error) in failures {
            ctx.report_error(&name, error);
        }
        if let Some(timeout) = timeout {
            spawn_timeout(ctx, timeout);
        }
        self
    }

    pub fn register_on_progress(
        &self,
        f: impl Fn(f64, Option<&str>) + Send + Sync + 'static,
    ) -> &Self {
        self.shared.handlers.lock().merge(LoadHandlers::new().on_progress(f));
        self
    }

    pub fn register_on_error(&self, f: impl Fn(&anyhow::Error, &str) + Send + Sync + 'static) -> &Self {
        self.shared.handlers.lock().merge(LoadHandlers::new().on_error(f));
        self
    }

    pub fn register_on_complete(&self, f: impl Fn() + Send + Sync + 'static) -> &Self {
        self.shared.handlers.lock().merge(LoadHandlers::new().on_complete(f));
        self
    }

    /// Location of a resource in the current batch.
    pub fn get_src(&self, name: &str) -> Result<String, PreloadError> {
        self.shared.state.lock().registry.src(name).map(str::to_string)
    }

    /// Weighted batch progress in `[0, 1]`; always 1 once loaded.
    pub fn progress(&self) -> f64 {
        let (progress, latched) = self.shared.state.lock().observe_progress();
        if latched {
            self.shared.announce_completion(None);
        }
        progress
    }

    pub fn load_done(&self) -> bool {
        self.shared.state.lock().is_loaded()
    }

    pub fn phase(&self) -> BatchPhase {
        self.shared.state.lock().phase()
    }

    pub fn completion(&self) -> Option<Completion> {
        self.shared.state.lock().completion()
    }

    pub fn snapshot(&self) -> Vec<ResourceProgress> {
        let state = self.shared.state.lock();
        state
            .registry
            .iter()
            .map(|s| ResourceProgress {
                name: s.spec.name.clone(),
                kind: s.spec.kind,
                preload: s.spec.preloads(),
                weight: s.effective_weight,
                progress: s.progress,
                in_flight: s.has_handle(),
            })
            .collect()
    }

    /// Resolve once the current batch is loaded.
    pub async fn wait_until_loaded(&self) {
        let mut rx = self.shared.loaded_tx.subscribe();
        let _ = rx.wait_for(|loaded| *loaded).await;
    }

    /// Abandon the current batch: release every live handle, drop all handlers
    /// and return to `Idle`.
    pub fn reset(&self) -> &Self {
        let stale = self.shared.state.lock().abandon();
        let released = stale.len();
        release_all(stale);
        *self.shared.handlers.lock() = LoadHandlers::default();
        self.shared.loaded_tx.send_replace(false);
        info!("batch reset, released {} handles", released);
        self
    }
}

fn release_all(handles: Vec<ResourceHandle>) {
    for handle in handles {
        handle.release();
    }
}
