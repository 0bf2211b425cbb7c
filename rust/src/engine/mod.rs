// Preload engine: batch lifecycle, dispatch to per-kind strategies and progress aggregation.

pub mod aggregate;
pub mod callbacks;
pub(crate) mod dispatch;
pub mod estimate;
pub(crate) mod image;
pub mod manager;
pub(crate) mod media;
