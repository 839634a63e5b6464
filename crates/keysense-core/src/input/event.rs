// Keysense Input Events
// Raw ingress values and the normalized, published event type

use crate::{Action, Key, ModifierState};

use super::normalize::KeyLocation;

/// A raw key identifier as delivered by the platform capture layer.
///
/// `code` is whatever the platform reports ("ControlLeft", "KeyA", "é");
/// `location` disambiguates duplicated keys on platforms that report a
/// generic code plus a location field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKey<'a> {
    pub code: &'a str,
    pub location: KeyLocation,
}

impl<'a> RawKey<'a> {
    pub fn new(code: &'a str) -> Self {
        Self {
            code,
            location: KeyLocation::Standard,
        }
    }

    pub fn with_location(code: &'a str, location: KeyLocation) -> Self {
        Self { code, location }
    }
}

impl<'a> From<&'a str> for RawKey<'a> {
    fn from(code: &'a str) -> Self {
        RawKey::new(code)
    }
}

/// A normalized key transition, published once per discrete transition and
/// never mutated afterwards.
///
/// Release events carry the press duration and its tap/hold classification;
/// press events leave `duration` empty and both flags false. The modifier
/// snapshot reflects the state after this transition was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub key: Key,
    pub action: Action,
    /// Host-supplied timestamp in milliseconds
    pub timestamp: u64,
    /// Press duration in milliseconds, release events only
    pub duration: Option<u64>,
    /// Release was shorter than the tap/hold threshold
    pub is_tap: bool,
    /// Release was at or past the tap/hold threshold
    pub is_hold: bool,
    pub modifiers: ModifierState,
}

impl KeyEvent {
    /// Build a press event
    pub fn pressed(key: Key, timestamp: u64, modifiers: ModifierState) -> Self {
        Self {
            key,
            action: Action::Press,
            timestamp,
            duration: None,
            is_tap: false,
            is_hold: false,
            modifiers,
        }
    }

    /// Build a release event with its tap/hold classification attached
    pub fn released(
        key: Key,
        timestamp: u64,
        duration: u64,
        is_tap: bool,
        modifiers: ModifierState,
    ) -> Self {
        Self {
            key,
            action: Action::Release,
            timestamp,
            duration: Some(duration),
            is_tap,
            is_hold: !is_tap,
            modifiers,
        }
    }
}
