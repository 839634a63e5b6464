// Keysense Core Library
// Key normalization and sequence matching for interactive applications

pub mod action;
pub mod config;
pub mod engine;
pub mod input;
pub mod key;
pub mod modifier;
pub mod sequence;
pub mod state;

pub use action::Action;
pub use config::EngineConfig;
pub use engine::Engine;
pub use input::event::{KeyEvent, RawKey};
pub use input::normalize::{normalize, KeyLocation, Normalized};
pub use key::{key_from_name, keys, Key};
pub use modifier::{ModifierState, RawModifiers, Side};
pub use sequence::definition::{
    ModifierMatch, ModifierSpec, RegistryError, SequenceDefinition, SequenceKind, SequencePattern,
};
pub use sequence::hold::{HoldEvent, HoldEventKind, HoldSnapshot, FLAG_WINDOW_MS};
pub use sequence::matcher::{MatchedSequence, SequenceMatcher};
pub use state::tracker::{is_tap, KeyRecord, KeyTracker};
