// Entry points for applications: logging setup and one-shot manifest preloading.

pub mod preload_api;
pub mod simple;
