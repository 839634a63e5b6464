// Keysense Sequence Module
// Pattern definitions, matching state machines, and hold progress

pub mod definition;
pub mod hold;
pub mod matcher;

pub use definition::{
    ModifierMatch, ModifierSpec, RegistryError, SequenceDefinition, SequenceKind, SequencePattern,
};
pub use hold::{HoldEvent, HoldEventKind, HoldSnapshot};
pub use matcher::{MatchedSequence, SequenceMatcher};
