//! Application services built on the store and sync layers.

mod tracker;

pub use tracker::Tracker;
