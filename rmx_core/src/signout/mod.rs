pub mod api;
pub mod classifier;
pub mod cleanup;
pub mod task;
