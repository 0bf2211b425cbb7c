use std::sync::Arc;

use tracing::debug;

use super::dispatch::BatchContext;
use crate::resource::registry::ResourceHandle;
use crate::resource::spec::ResourceSpec;
use crate::source::traits::ImageFetcher;

/// Fetch one image in the background. Success completes the resource,
/// failure is reported and leaves its progress untouched.
pub(crate) fn load_image(
    ctx: &BatchContext,
    fetcher: &Arc<dyn ImageFetcher>,
    spec: &ResourceSpec,
) -> ResourceHandle {
    let ctx = ctx.clone();
    let fetcher = Arc::clone(fetcher);
    let name = spec.name.clone();
    let src = spec.src.clone();

    let task = tokio::spawn(async move {
        let cancel = ctx.cancel_token().clone();
        tokio::select! {
            result = fetcher.fetch(&src) => match result {
                Ok(()) => {
                    debug!("image {} loaded", name);
                    ctx.report_progress(&name, 1.0);
                    // Aborting the task from its last statement is a no-op.
                    ctx.release_handle(&name);
                }
                Err(e) => ctx.report_error(&name, e),
            },
            _ = cancel.cancelled() => debug!("image {} fetch abandoned", name),
        }
    });

    ResourceHandle::Image(task.abort_handle())
}
