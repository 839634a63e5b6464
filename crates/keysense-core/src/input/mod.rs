// Keysense Input Module
// Raw event normalization and the published event type

pub mod event;
pub mod normalize;

pub use event::{KeyEvent, RawKey};
pub use normalize::{normalize, KeyLocation, Normalized};
