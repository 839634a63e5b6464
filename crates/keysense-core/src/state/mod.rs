// Keysense State Module
// Pressed-key and modifier bookkeeping

pub mod tracker;

pub use tracker::{is_tap, KeyRecord, KeyTracker};
