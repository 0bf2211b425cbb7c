// In-memory image fetcher and media backend driven by the tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use ma_preload_engine::source::traits::{
    ImageFetcher, MediaBackend, MediaElement, MediaEvent, MediaStream, PlaybackOptions,
};
use ma_preload_engine::{LoadHandlers, ResourceKind, ResourceManager};

#[derive(Debug, Clone)]
pub enum ImageBehavior {
    Succeed,
    Fail(&'static str),
    Stall,
}

#[derive(Default)]
pub struct FakeImages {
    behaviors: Mutex<HashMap<String, ImageBehavior>>,
    calls: AtomicUsize,
}

impl FakeImages {
    pub fn set(&self, src: &str, behavior: ImageBehavior) {
        self.behaviors.lock().insert(src.to_string(), behavior);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageFetcher for FakeImages {
    async fn fetch(&self, src: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self
            .behaviors
            .lock()
            .get(src)
            .cloned()
            .unwrap_or(ImageBehavior::Succeed);
        match behavior {
            ImageBehavior::Succeed => Ok(()),
            ImageBehavior::Fail(msg) => Err(anyhow!(msg)),
            ImageBehavior::Stall => std::future::pending().await,
        }
    }
}

#[derive(Default)]
pub struct FakeElement {
    pub buffered: Mutex<Option<f64>>,
    pub duration: Mutex<Option<f64>>,
    pub seeks: Mutex<Vec<f64>>,
    pub attached: AtomicBool,
    pub playing: AtomicBool,
    pub detached: AtomicBool,
    pub play_calls: AtomicUsize,
}

impl FakeElement {
    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

impl MediaElement for FakeElement {
    fn attach(&self) {
        self.attached.store(true, Ordering::SeqCst);
    }

    fn play(&self) {
        self.playing.store(true, Ordering::SeqCst);
        self.play_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }

    fn seek(&self, position: f64) {
        self.seeks.lock().push(position);
    }

    fn buffered_end(&self) -> Option<f64> {
        *self.buffered.lock()
    }

    fn duration(&self) -> Option<f64> {
        *self.duration.lock()
    }

    fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
        self.detached.store(true, Ordering::SeqCst);
    }
}

pub struct OpenedMedia {
    pub kind: ResourceKind,
    pub options: PlaybackOptions,
    pub element: Arc<FakeElement>,
    pub events: mpsc::UnboundedSender<MediaEvent>,
}

#[derive(Default)]
pub struct FakeMedia {
    opened: Mutex<HashMap<String, OpenedMedia>>,
    fail_open: Mutex<HashSet<String>>,
}

impl FakeMedia {
    pub fn fail_open(&self, src: &str) {
        self.fail_open.lock().insert(src.to_string());
    }

    pub fn opened_count(&self) -> usize {
        self.opened.lock().len()
    }

    pub fn element(&self, src: &str) -> Arc<FakeElement> {
        Arc::clone(&self.opened.lock()[src].element)
    }

    pub fn options(&self, src: &str) -> (ResourceKind, PlaybackOptions) {
        let opened = self.opened.lock();
        (opened[src].kind, opened[src].options)
    }

    /// Move the buffered edge and fire a buffering signal.
    pub fn buffer(&self, src: &str, buffered_end: f64, duration: Option<f64>) {
        let opened = self.opened.lock();
        let media = &opened[src];
        *media.element.buffered.lock() = Some(buffered_end);
        *media.element.duration.lock() = duration;
        let _ = media.events.send(MediaEvent::CanPlayThrough);
    }

    pub fn fail(&self, src: &str, msg: &'static str) {
        let opened = self.opened.lock();
        let _ = opened[src].events.send(MediaEvent::Error(anyhow!(msg)));
    }
}

impl MediaBackend for FakeMedia {
    fn open(&self, kind: ResourceKind, src: &str, options: PlaybackOptions) -> Result<MediaStream> {
        if self.fail_open.lock().contains(src) {
            return Err(anyhow!("unsupported source {}", src));
        }
        let element = Arc::new(FakeElement::default());
        let (tx, rx) = mpsc::unbounded_channel();
        self.opened.lock().insert(
            src.to_string(),
            OpenedMedia {
                kind,
                options,
                element: Arc::clone(&element),
                events: tx,
            },
        );
        Ok(MediaStream {
            element,
            events: rx,
        })
    }
}

/// Everything the handlers observed, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Progress(f64, Option<String>),
    Complete,
    Error(String, String),
}

pub fn recording() -> (LoadHandlers, mpsc::UnboundedReceiver<Seen>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let progress_tx = tx.clone();
    let complete_tx = tx.clone();
    let handlers = LoadHandlers::new()
        .on_progress(move |progress, current| {
            let _ = progress_tx.send(Seen::Progress(progress, current.map(str::to_string)));
        })
        .on_complete(move || {
            let _ = complete_tx.send(Seen::Complete);
        })
        .on_error(move |error, current| {
            let _ = tx.send(Seen::Error(current.to_string(), error.to_string()));
        });
    (handlers, rx)
}

pub fn fake_manager() -> (ResourceManager, Arc<FakeImages>, Arc<FakeMedia>) {
    let images = Arc::new(FakeImages::default());
    let media = Arc::new(FakeMedia::default());
    let manager = ResourceManager::new(images.clone(), media.clone());
    (manager, images, media)
}

/// Let spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
