// Keysense Sequence Definitions
// Chord, combo, and hold pattern definitions with registration validation

use smol_str::SmolStr;

use crate::{Key, ModifierState};

/// How a [`ModifierSpec`] compares against the live modifier state.
///
/// `Subset` (the default) only requires the listed modifiers to be held;
/// extra modifiers do not break the match. `Exact` additionally rejects
/// any unlisted modifier. Subset is the default because a stuck or
/// orphaned modifier is a recoverable input condition, not a different
/// user intent.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ModifierMatch {
    #[default]
    Subset,
    Exact,
}

/// Required modifier flags for a chord or hold definition.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(default)]
pub struct ModifierSpec {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
    pub match_mode: ModifierMatch,
}

impl ModifierSpec {
    fn required(&self) -> ModifierState {
        ModifierState {
            ctrl: self.ctrl,
            shift: self.shift,
            alt: self.alt,
            meta: self.meta,
        }
    }

    /// Whether the live modifier state satisfies this spec
    pub fn matches(&self, state: &ModifierState) -> bool {
        match self.match_mode {
            ModifierMatch::Subset => state.contains(&self.required()),
            ModifierMatch::Exact => *state == self.required(),
        }
    }
}

/// Pattern kind tag, used in match records and diagnostics.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SequenceKind {
    Chord,
    Combo,
    Hold,
}

/// One pattern over the key event stream.
///
/// The three variants carry their own evaluation strategy in the matcher;
/// dispatch is explicit on the tag, never on runtime type inspection.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SequencePattern {
    /// Unordered set of keys that must all be simultaneously pressed.
    /// With `exact`, no other non-modifier key may be down.
    Chord {
        keys: Vec<Key>,
        #[serde(default)]
        modifiers: Option<ModifierSpec>,
        #[serde(default)]
        exact: bool,
    },
    /// Ordered key list; each step must arrive within `timeout_ms` of the
    /// previous accepted one.
    Combo { keys: Vec<Key>, timeout_ms: u64 },
    /// Single key held for at least `min_hold_ms`. Continuous holds
    /// re-arm and fire again for every further full interval held.
    Hold {
        key: Key,
        #[serde(default)]
        modifiers: Option<ModifierSpec>,
        min_hold_ms: u64,
        #[serde(default)]
        continuous: bool,
    },
}

/// A registered pattern, keyed by a unique id.
///
/// Definitions are immutable once registered for the lifetime of the
/// matching session.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SequenceDefinition {
    pub id: SmolStr,
    #[serde(flatten)]
    pub pattern: SequencePattern,
}

impl SequenceDefinition {
    pub fn chord(id: &str, keys: Vec<Key>) -> Self {
        Self {
            id: SmolStr::new(id),
            pattern: SequencePattern::Chord {
                keys,
                modifiers: None,
                exact: false,
            },
        }
    }

    pub fn combo(id: &str, keys: Vec<Key>, timeout_ms: u64) -> Self {
        Self {
            id: SmolStr::new(id),
            pattern: SequencePattern::Combo { keys, timeout_ms },
        }
    }

    pub fn hold(id: &str, key: Key, min_hold_ms: u64) -> Self {
        Self {
            id: SmolStr::new(id),
            pattern: SequencePattern::Hold {
                key,
                modifiers: None,
                min_hold_ms,
                continuous: false,
            },
        }
    }

    pub fn kind(&self) -> SequenceKind {
        match self.pattern {
            SequencePattern::Chord { .. } => SequenceKind::Chord,
            SequencePattern::Combo { .. } => SequenceKind::Combo,
            SequencePattern::Hold { .. } => SequenceKind::Hold,
        }
    }

    /// Validate this definition in isolation
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.id.is_empty() {
            return Err(RegistryError::EmptyId);
        }
        match &self.pattern {
            SequencePattern::Chord { keys, .. } => {
                if keys.is_empty() {
                    return Err(RegistryError::EmptyKeys {
                        id: self.id.clone(),
                    });
                }
            }
            SequencePattern::Combo { keys, timeout_ms } => {
                if keys.is_empty() {
                    return Err(RegistryError::EmptyKeys {
                        id: self.id.clone(),
                    });
                }
                if *timeout_ms == 0 {
                    return Err(RegistryError::NonPositiveTimeout {
                        id: self.id.clone(),
                    });
                }
            }
            SequencePattern::Hold { min_hold_ms, .. } => {
                if *min_hold_ms == 0 {
                    return Err(RegistryError::NonPositiveHold {
                        id: self.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Errors rejected at registration time. The registry is left unchanged
/// when any definition in a batch fails.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("sequence id must not be empty")]
    EmptyId,

    #[error("duplicate sequence id '{0}'")]
    DuplicateId(SmolStr),

    #[error("sequence '{id}' has an empty key list")]
    EmptyKeys { id: SmolStr },

    #[error("sequence '{id}': min_hold_ms must be positive")]
    NonPositiveHold { id: SmolStr },

    #[error("sequence '{id}': timeout_ms must be positive")]
    NonPositiveTimeout { id: SmolStr },
}
