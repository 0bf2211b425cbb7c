// Progressive HTTP buffering behind the `MediaElement` interface.
//
// The element downloads the resource in ranged chunks while it is playing and
// emits a buffering signal after every chunk. The media timeline is derived from
// byte counts: `time = bytes / nominal_bytes_per_second`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use reqwest::Client;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::http_source::{resolve_url, HttpSource};
use super::traits::{ByteSource, MediaBackend, MediaElement, MediaEvent, MediaStream, PlaybackOptions};
use crate::config::{HttpBackendConfig, FORMAT_PROBE_BYTES};
use crate::detect::format::detect_format;
use crate::resource::spec::ResourceKind;

pub struct HttpMediaBackend {
    client: Client,
    config: HttpBackendConfig,
}

impl HttpMediaBackend {
    pub fn new(client: Client, config: HttpBackendConfig) -> Self {
        Self { client, config }
    }
}

impl MediaBackend for HttpMediaBackend {
    fn open(&self, kind: ResourceKind, src: &str, options: PlaybackOptions) -> Result<MediaStream> {
        if self.config.chunk_size == 0 {
            return Err(anyhow!("chunk_size must be > 0"));
        }
        if self.config.nominal_bytes_per_second == 0 {
            return Err(anyhow!("nominal_bytes_per_second must be > 0"));
        }

        let url = resolve_url(self.config.base_url.as_deref(), src)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(BufferShared {
            kind,
            source: HttpSource::new(self.client.clone(), url, self.config.headers.clone()),
            chunk_size: self.config.chunk_size,
            timeline: Mutex::new(Timeline::default()),
            events: events_tx,
            resume: Notify::new(),
            cancel: CancellationToken::new(),
        });

        let element = Arc::new(HttpMediaElement {
            shared,
            options,
            bytes_per_second: self.config.nominal_bytes_per_second as f64,
            worker_started: AtomicBool::new(false),
        });

        Ok(MediaStream {
            element,
            events: events_rx,
        })
    }
}

#[derive(Debug, Default)]
struct Timeline {
    content_length: Option<u64>,
    downloaded: u64,
    position: f64,
    playing: bool,
    attached: bool,
}

struct BufferShared {
    kind: ResourceKind,
    source: HttpSource,
    chunk_size: u64,
    timeline: Mutex<Timeline>,
    events: mpsc::UnboundedSender<MediaEvent>,
    resume: Notify,
    cancel: CancellationToken,
}

impl BufferShared {
    async fn run(self: Arc<Self>) {
        let result = tokio::select! {
            result = self.buffer() => result,
            _ = self.cancel.cancelled() => {
                debug!("media buffering cancelled url={}", self.source.url());
                return;
            }
        };

        if let Err(e) = result {
            warn!("media buffering failed url={}: {}", self.source.url(), e);
            let _ = self.events.send(MediaEvent::Error(e));
        }
    }

    async fn buffer(&self) -> Result<()> {
        let info = self.source.probe().await?;
        if info.content_length == 0 {
            return Err(anyhow!("{} has no content", self.source.url()));
        }
        let content_length = info.content_length;
        self.timeline.lock().content_length = Some(content_length);
        debug!(
            "media probed url={} bytes={} type={} range={}",
            self.source.url(),
            content_length,
            info.content_type,
            info.supports_range
        );

        let mut offset = 0u64;
        while offset < content_length {
            self.wait_until_playing().await;

            let request_len = if offset == 0 {
                self.chunk_size.max(FORMAT_PROBE_BYTES)
            } else {
                self.chunk_size
            };
            let end = (offset + request_len).min(content_length) - 1;
            let data = self.source.fetch_range(offset, end).await?;
            if data.is_empty() {
                return Err(anyhow!("empty response for bytes {}-{}", offset, end));
            }

            if offset == 0 {
                let format = detect_format(&data);
                if !format.is_playable_as(self.kind) {
                    return Err(anyhow!(
                        "cannot decode {} as {}: unsupported container {:?}",
                        self.source.url(),
                        self.kind,
                        format
                    ));
                }
            }

            offset = (offset + data.len() as u64).min(content_length);
            self.timeline.lock().downloaded = offset;

            if self.events.send(MediaEvent::CanPlayThrough).is_err() {
                // Nobody is listening any more.
                return Ok(());
            }
        }

        debug!("media fully buffered url={} bytes={}", self.source.url(), content_length);
        Ok(())
    }

    async fn wait_until_playing(&self) {
        loop {
            let notified = self.resume.notified();
            if self.timeline.lock().playing {
                return;
            }
            notified.await;
        }
    }
}

pub struct HttpMediaElement {
    shared: Arc<BufferShared>,
    options: PlaybackOptions,
    bytes_per_second: f64,
    worker_started: AtomicBool,
}

impl MediaElement for HttpMediaElement {
    fn attach(&self) {
        self.shared.timeline.lock().attached = true;
        debug!(
            "media element attached url={} muted={} preload_auto={} offscreen={}",
            self.shared.source.url(),
            self.options.muted,
            self.options.preload_auto,
            self.options.offscreen
        );
    }

    fn play(&self) {
        if self.shared.cancel.is_cancelled() {
            return;
        }
        {
            let mut timeline = self.shared.timeline.lock();
            if !timeline.attached {
                debug!("media element playing while detached url={}", self.shared.source.url());
            }
            timeline.playing = true;
        }
        self.shared.resume.notify_one();

        if !self.worker_started.swap(true, Ordering::AcqRel) {
            tokio::spawn(Arc::clone(&self.shared).run());
        }
    }

    fn pause(&self) {
        self.shared.timeline.lock().playing = false;
    }

    fn seek(&self, position: f64) {
        let duration = self.duration();
        let mut timeline = self.shared.timeline.lock();
        timeline.position = match duration {
            Some(d) => position.clamp(0.0, d),
            None => position.max(0.0),
        };
    }

    fn buffered_end(&self) -> Option<f64> {
        let downloaded = self.shared.timeline.lock().downloaded;
        (downloaded > 0).then(|| downloaded as f64 / self.bytes_per_second)
    }

    fn duration(&self) -> Option<f64> {
        let content_length = self.shared.timeline.lock().content_length;
        content_length.map(|len| len as f64 / self.bytes_per_second)
    }

    fn detach(&self) {
        let position = {
            let mut timeline = self.shared.timeline.lock();
            timeline.playing = false;
            timeline.attached = false;
            timeline.position
        };
        self.shared.cancel.cancel();
        debug!(
            "media element detached url={} position={:.2}",
            self.shared.source.url(),
            position
        );
    }
}

impl Drop for HttpMediaElement {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}
