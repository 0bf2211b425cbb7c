pub mod api;
pub mod config;
pub mod detect;
pub mod engine;
pub mod error;
pub mod resource;
pub mod source;

pub use engine::callbacks::LoadHandlers;
pub use engine::manager::{BatchPhase, Completion, ResourceManager, ResourceProgress};
pub use error::PreloadError;
pub use resource::spec::{Manifest, ResourceKind, ResourceSpec};
