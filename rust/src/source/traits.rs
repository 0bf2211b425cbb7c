use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::resource::spec::ResourceKind;

pub struct SourceInfo {
    pub content_length: u64,
    pub content_type: String,
    pub supports_range: bool,
}

/// Remote bytes addressed by a single location.
#[async_trait]
pub trait ByteSource: Send + Sync {
    async fn probe(&self) -> Result<SourceInfo>;
    /// Inclusive range `[start, end]`.
    async fn fetch_range(&self, start: u64, end: u64) -> Result<Bytes>;
    async fn fetch_all(&self) -> Result<Bytes>;
}

/// Fetches an image and reports whether it can be displayed.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, src: &str) -> Result<()>;
}

/// Signals a playback element delivers while it buffers.
#[derive(Debug)]
pub enum MediaEvent {
    /// Enough data is buffered to play through; may repeat as buffering continues.
    CanPlayThrough,
    Error(anyhow::Error),
}

/// How a preload element is configured before it starts buffering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackOptions {
    pub muted: bool,
    /// Buffer the whole resource rather than metadata only.
    pub preload_auto: bool,
    /// Attach outside the visible viewport.
    pub offscreen: bool,
}

impl PlaybackOptions {
    /// Muted, auto-preloading and invisible.
    pub fn background() -> Self {
        Self {
            muted: true,
            preload_auto: true,
            offscreen: true,
        }
    }
}

/// A playback element owned by the preloader while it buffers.
pub trait MediaElement: Send + Sync {
    fn attach(&self);
    fn play(&self);
    fn pause(&self);
    fn seek(&self, position: f64);
    /// End of the first buffered time range, if any data is buffered.
    fn buffered_end(&self) -> Option<f64>;
    /// Total duration, once known.
    fn duration(&self) -> Option<f64>;
    /// Remove the element from its container and stop all background work.
    fn detach(&self);
}

pub struct MediaStream {
    pub element: Arc<dyn MediaElement>,
    pub events: mpsc::UnboundedReceiver<MediaEvent>,
}

/// Creates playback elements for video and audio resources.
pub trait MediaBackend: Send + Sync {
    fn open(&self, kind: ResourceKind, src: &str, options: PlaybackOptions) -> Result<MediaStream>;
}
