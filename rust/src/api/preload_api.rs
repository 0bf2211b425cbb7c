use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::callbacks::LoadHandlers;
use crate::engine::manager::{Completion, ResourceManager, ResourceProgress};
use crate::resource::spec::Manifest;

/// A resource that reported an error during a preload run.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedResource {
    pub name: String,
    pub message: String,
}

/// Outcome of a [`preload`] run.
#[derive(Debug, Clone)]
pub struct PreloadSummary {
    pub completion: Option<Completion>,
    pub failures: Vec<FailedResource>,
    pub resources: Vec<ResourceProgress>,
}

/// Initialize `manager` with `manifest`, load it and wait for completion.
///
/// Errors are collected into the summary instead of a handler. A failed
/// resource still counts towards the batch, so without a timeout in the
/// manifest a failure keeps this future pending.
pub async fn preload(
    manager: &ResourceManager,
    manifest: Manifest,
    handlers: LoadHandlers,
) -> PreloadSummary {
    let failures = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&failures);

    manager.init_manifest(manifest).load(handlers.on_error(move |error, name| {
        sink.lock().push(FailedResource {
            name: name.to_string(),
            message: format!("{:#}", error),
        });
    }));
    manager.wait_until_loaded().await;

    let failures = failures.lock().clone();
    PreloadSummary {
        completion: manager.completion(),
        failures,
        resources: manager.snapshot(),
    }
}
