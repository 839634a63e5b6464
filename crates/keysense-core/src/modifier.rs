// Keysense Modifier State
// Canonical modifier flags with left/right duplicate resolution

use std::fmt;

use crate::Key;

/// Physical side of a duplicated key (left/right modifier variants).
///
/// Left and right variants collapse to one canonical [`Key`]; the side is
/// carried separately so it stays queryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// Raw modifier snapshot delivered by the platform alongside each key event.
///
/// This is the untrusted input; the tracker reconciles it against the keys
/// it believes are pressed (a snapshot that says `ctrl: false` while a ctrl
/// key is tracked as pressed means the keyup was lost).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RawModifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl RawModifiers {
    /// Snapshot with no modifiers held
    pub fn none() -> Self {
        Self::default()
    }

    /// Read the flag for a canonical modifier key, if `key` is one
    pub fn flag_for(&self, key: &Key) -> Option<bool> {
        match key.as_str() {
            "ctrl" => Some(self.ctrl),
            "shift" => Some(self.shift),
            "alt" => Some(self.alt),
            "meta" => Some(self.meta),
            _ => None,
        }
    }
}

/// Canonical modifier state, mutated only by the state tracker and
/// read-shared by every other component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ModifierState {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl ModifierState {
    /// State with no modifiers active
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_raw(raw: RawModifiers) -> Self {
        Self {
            ctrl: raw.ctrl,
            shift: raw.shift,
            alt: raw.alt,
            meta: raw.meta,
        }
    }

    /// True if no modifier is active
    pub fn is_empty(&self) -> bool {
        !(self.ctrl || self.shift || self.alt || self.meta)
    }

    /// True if every modifier active in `other` is also active here
    pub fn contains(&self, other: &ModifierState) -> bool {
        (!other.ctrl || self.ctrl)
            && (!other.shift || self.shift)
            && (!other.alt || self.alt)
            && (!other.meta || self.meta)
    }

    /// Union of two states
    pub fn union(&self, other: &ModifierState) -> ModifierState {
        ModifierState {
            ctrl: self.ctrl || other.ctrl,
            shift: self.shift || other.shift,
            alt: self.alt || other.alt,
            meta: self.meta || other.meta,
        }
    }

    /// Set the flag for a canonical modifier key. Non-modifier keys are a
    /// no-op.
    pub fn set_key(&mut self, key: &Key, value: bool) {
        match key.as_str() {
            "ctrl" => self.ctrl = value,
            "shift" => self.shift = value,
            "alt" => self.alt = value,
            "meta" => self.meta = value,
            _ => {}
        }
    }
}

impl fmt::Display for ModifierState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("ctrl");
        }
        if self.shift {
            parts.push("shift");
        }
        if self.alt {
            parts.push("alt");
        }
        if self.meta {
            parts.push("meta");
        }
        if parts.is_empty() {
            write!(f, "(none)")
        } else {
            write!(f, "{}", parts.join("+"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;

    #[test]
    fn test_modifier_state_from_raw() {
        let raw = RawModifiers {
            ctrl: true,
            shift: false,
            alt: true,
            meta: false,
        };
        let state = ModifierState::from_raw(raw);
        assert!(state.ctrl);
        assert!(!state.shift);
        assert!(state.alt);
        assert!(!state.meta);
    }

    #[test]
    fn test_modifier_state_contains() {
        let held = ModifierState {
            ctrl: true,
            shift: true,
            ..Default::default()
        };
        let required = ModifierState {
            ctrl: true,
            ..Default::default()
        };
        assert!(held.contains(&required));
        assert!(!required.contains(&held));
        assert!(held.contains(&ModifierState::none()));
    }

    #[test]
    fn test_modifier_state_set_key() {
        let mut state = ModifierState::none();
        state.set_key(&keys::CTRL, true);
        assert!(state.ctrl);
        state.set_key(&keys::CTRL, false);
        assert!(state.is_empty());

        // Non-modifier keys are ignored
        state.set_key(&crate::Key::new("a"), true);
        assert!(state.is_empty());
    }

    #[test]
    fn test_raw_modifiers_flag_for() {
        let raw = RawModifiers {
            shift: true,
            ..Default::default()
        };
        assert_eq!(raw.flag_for(&keys::SHIFT), Some(true));
        assert_eq!(raw.flag_for(&keys::CTRL), Some(false));
        assert_eq!(raw.flag_for(&crate::Key::new("a")), None);
    }

    #[test]
    fn test_modifier_state_display() {
        let state = ModifierState {
            ctrl: true,
            shift: true,
            ..Default::default()
        };
        assert_eq!(state.to_string(), "ctrl+shift");
        assert_eq!(ModifierState::none().to_string(), "(none)");
    }
}
