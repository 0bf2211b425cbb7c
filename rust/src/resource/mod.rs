// Resource declarations and the per-batch registry that tracks them.

pub mod registry;
pub mod spec;
