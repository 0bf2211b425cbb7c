// Collaborator interfaces for fetching and buffering, plus reqwest-backed implementations.

pub mod http_image;
pub mod http_media;
pub mod http_source;
pub mod traits;
