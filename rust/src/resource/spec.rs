use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_RESOURCE_WEIGHT;
use crate::error::PreloadError;

/// Media kind of a resource; selects the loading strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Image,
    Video,
    Audio,
}

impl ResourceKind {
    /// Video and audio share the streaming-media strategy.
    pub fn is_media(self) -> bool {
        matches!(self, ResourceKind::Video | ResourceKind::Audio)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResourceKind::Image => "image",
            ResourceKind::Video => "video",
            ResourceKind::Audio => "audio",
        };
        f.write_str(label)
    }
}

/// One resource as declared by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub name: String,
    pub src: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: ResourceKind,
    /// Unset means `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preload: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl ResourceSpec {
    pub fn new(name: impl Into<String>, src: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            src: src.into(),
            kind,
            preload: None,
            weight: None,
        }
    }

    pub fn image(name: impl Into<String>, src: impl Into<String>) -> Self {
        Self::new(name, src, ResourceKind::Image)
    }

    pub fn video(name: impl Into<String>, src: impl Into<String>) -> Self {
        Self::new(name, src, ResourceKind::Video)
    }

    pub fn audio(name: impl Into<String>, src: impl Into<String>) -> Self {
        Self::new(name, src, ResourceKind::Audio)
    }

    pub fn with_preload(mut self, preload: bool) -> Self {
        self.preload = Some(preload);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Whether the batch waits on this resource.
    pub fn preloads(&self) -> bool {
        self.preload.unwrap_or(true)
    }

    /// Declared weight, or the default when missing, non-positive or not finite.
    pub fn effective_weight(&self) -> f64 {
        match self.weight {
            Some(w) if w.is_finite() && w > 0.0 => w,
            _ => DEFAULT_RESOURCE_WEIGHT,
        }
    }
}

/// A resource list plus batch timeout, as loaded from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Zero disables the timeout.
    #[serde(default)]
    pub timeout_ms: u64,
    pub resources: Vec<ResourceSpec>,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, PreloadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PreloadError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| PreloadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}
