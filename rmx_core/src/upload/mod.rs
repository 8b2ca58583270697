pub mod binder;
pub mod listener;
pub mod projector;
pub mod tracker;
