// Per-batch resource table: declared specs, tracked progress and live platform handles.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::task::AbortHandle;
use tracing::warn;

use super::spec::ResourceSpec;
use crate::error::PreloadError;
use crate::source::traits::MediaElement;

/// Ownership of the platform object doing the loading.
pub enum ResourceHandle {
    /// In-flight image fetch task.
    Image(AbortHandle),
    /// Attached playback element.
    Media(Arc<dyn MediaElement>),
}

impl ResourceHandle {
    /// Tear the handle down. Media elements are paused and detached before
    /// the reference is dropped.
    pub fn release(self) {
        match self {
            ResourceHandle::Image(task) => task.abort(),
            ResourceHandle::Media(element) => {
                element.pause();
                element.detach();
            }
        }
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceHandle::Image(_) => f.write_str("ResourceHandle::Image"),
            ResourceHandle::Media(_) => f.write_str("ResourceHandle::Media"),
        }
    }
}

#[derive(Debug)]
pub struct ResourceState {
    pub spec: ResourceSpec,
    pub progress: f64,
    pub effective_weight: f64,
    handle: Option<ResourceHandle>,
}

impl ResourceState {
    fn new(spec: ResourceSpec) -> Self {
        // Non-preloaded resources are satisfied from the start.
        let progress = if spec.preloads() { 0.0 } else { 1.0 };
        let effective_weight = spec.effective_weight();
        Self {
            spec,
            progress,
            effective_weight,
            handle: None,
        }
    }

    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }
}

#[derive(Debug, Default)]
pub struct ResourceRegistry {
    order: Vec<String>,
    entries: HashMap<String, ResourceState>,
    total_weight: f64,
}

impl ResourceRegistry {
    /// Build the registry for a new batch. Duplicate names keep the position of
    /// their first occurrence and the declaration of their last.
    pub fn from_specs(specs: Vec<ResourceSpec>) -> Self {
        let mut order = Vec::with_capacity(specs.len());
        let mut entries = HashMap::with_capacity(specs.len());

        for spec in specs {
            let name = spec.name.clone();
            if entries.insert(name.clone(), ResourceState::new(spec)).is_some() {
                warn!("duplicate resource name {}, last declaration wins", name);
            } else {
                order.push(name);
            }
        }

        // Summed in registration order so a fully loaded batch divides to exactly 1.
        let total_weight = order
            .iter()
            .filter_map(|name| entries.get(name))
            .filter(|state| state.spec.preloads())
            .map(|state| state.effective_weight)
            .sum();

        Self {
            order,
            entries,
            total_weight,
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn preload_count(&self) -> usize {
        self.iter().filter(|state| state.spec.preloads()).count()
    }

    pub fn get(&self, name: &str) -> Option<&ResourceState> {
        self.entries.get(name)
    }

    pub fn src(&self, name: &str) -> Result<&str, PreloadError> {
        self.entries
            .get(name)
            .map(|state| state.spec.src.as_str())
            .ok_or_else(|| PreloadError::UnknownResource(name.to_string()))
    }

    /// States in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceState> {
        self.order.iter().filter_map(|name| self.entries.get(name))
    }

    /// Record a new estimate for `name`. Progress never moves backwards and is
    /// clamped to `[0, 1]`. Returns `false` for unknown names.
    pub fn record_progress(&mut self, name: &str, value: f64) -> bool {
        let Some(state) = self.entries.get_mut(name) else {
            return false;
        };
        if value.is_finite() {
            state.progress = state.progress.max(value.clamp(0.0, 1.0));
        }
        true
    }

    /// Weighted completion over preloaded resources. Zero when nothing preloads.
    pub fn weighted_progress(&self) -> f64 {
        if self.total_weight <= 0.0 {
            return 0.0;
        }
        let loaded: f64 = self
            .iter()
            .filter(|state| state.spec.preloads())
            .map(|state| state.progress * state.effective_weight)
            .sum();
        (loaded / self.total_weight).min(1.0)
    }

    pub fn attach_handle(&mut self, name: &str, handle: ResourceHandle) {
        match self.entries.get_mut(name) {
            Some(state) => {
                if let Some(previous) = state.handle.replace(handle) {
                    previous.release();
                }
            }
            None => handle.release(),
        }
    }

    pub fn take_handle(&mut self, name: &str) -> Option<ResourceHandle> {
        self.entries.get_mut(name).and_then(|state| state.handle.take())
    }

    /// Remove every live handle, leaving the tracked progress intact.
    pub fn drain_handles(&mut self) -> Vec<ResourceHandle> {
        self.entries
            .values_mut()
            .filter_map(|state| state.handle.take())
            .collect()
    }
}
