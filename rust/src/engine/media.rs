// Streaming media strategy: buffer an invisible muted element and turn its
// buffering signals into progress estimates.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::debug;

use super::dispatch::BatchContext;
use super::estimate::estimate_media_progress;
use crate::resource::registry::ResourceHandle;
use crate::resource::spec::ResourceSpec;
use crate::source::traits::{MediaBackend, MediaElement, MediaEvent, MediaStream, PlaybackOptions};

pub(crate) fn load_media(
    ctx: &BatchContext,
    backend: &Arc<dyn MediaBackend>,
    spec: &ResourceSpec,
) -> Result<ResourceHandle> {
    let MediaStream { element, events } =
        backend.open(spec.kind, &spec.src, PlaybackOptions::background())?;
    element.attach();
    element.play();

    tokio::spawn(watch_buffering(
        ctx.clone(),
        spec.name.clone(),
        Arc::clone(&element),
        events,
    ));

    Ok(ResourceHandle::Media(element))
}

async fn watch_buffering(
    ctx: BatchContext,
    name: String,
    element: Arc<dyn MediaElement>,
    mut events: mpsc::UnboundedReceiver<MediaEvent>,
) {
    let cancel = ctx.cancel_token().clone();
    loop {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = cancel.cancelled() => {
                debug!("media {} buffering abandoned", name);
                return;
            }
        };

        match event {
            Some(MediaEvent::CanPlayThrough) => {
                if on_buffered(&ctx, &name, element.as_ref()) {
                    return;
                }
            }
            Some(MediaEvent::Error(e)) => ctx.report_error(&name, e),
            None => {
                debug!("media {} event stream closed", name);
                return;
            }
        }
    }
}

/// Handle one buffering signal. Returns `true` once the element is released.
fn on_buffered(ctx: &BatchContext, name: &str, element: &dyn MediaElement) -> bool {
    let (Some(duration), Some(buffered_end)) = (element.duration(), element.buffered_end()) else {
        return false;
    };
    let Some(estimate) = estimate_media_progress(buffered_end, duration) else {
        return false;
    };

    let reached_end = estimate >= 1.0;
    ctx.report_progress(name, estimate);

    // Keep the playhead on the buffered edge so playback never outruns the data.
    element.seek(buffered_end);
    if reached_end || ctx.is_settled() {
        ctx.release_handle(name);
        true
    } else {
        element.play();
        false
    }
}
