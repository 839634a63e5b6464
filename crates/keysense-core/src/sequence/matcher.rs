// Keysense Sequence Matcher
// Evaluates the registry against the normalized event stream

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::input::event::KeyEvent;
use crate::state::tracker::KeyTracker;
use crate::Key;

use super::definition::{
    ModifierSpec, RegistryError, SequenceDefinition, SequenceKind, SequencePattern,
};
use super::hold::{HoldRelease, HoldSnapshot, HoldTracker};

/// Record of one successful match, appended to the bounded history.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedSequence {
    pub sequence_id: SmolStr,
    pub kind: SequenceKind,
    pub timestamp: u64,
    pub matched_keys: SmallVec<[Key; 4]>,
}

/// Progress of one combo attempt.
#[derive(Debug, Clone, Copy, Default)]
struct ComboCursor {
    /// Next expected position in the key list
    index: usize,
    /// Timestamp of the last accepted key
    last_accepted: u64,
}

/// Holds the registry of pattern definitions and evaluates every
/// normalized transition (and frame tick, for holds) against them.
///
/// Definitions are evaluated in registration order; a single transition
/// fires at most one match per definition but may match several
/// independent definitions.
#[derive(Debug)]
pub struct SequenceMatcher {
    registry: IndexMap<SmolStr, SequenceDefinition>,
    satisfied_chords: HashSet<SmolStr>,
    combo_cursors: HashMap<SmolStr, ComboCursor>,
    holds: HoldTracker,
    history: VecDeque<MatchedSequence>,
    history_limit: usize,
}

impl SequenceMatcher {
    pub fn new(match_history_limit: usize, hold_history_limit: usize) -> Self {
        Self {
            registry: IndexMap::new(),
            satisfied_chords: HashSet::new(),
            combo_cursors: HashMap::new(),
            holds: HoldTracker::new(hold_history_limit),
            history: VecDeque::new(),
            history_limit: match_history_limit,
        }
    }

    /// Register a batch of definitions.
    ///
    /// The whole batch is validated first; on any failure the registry is
    /// left unchanged.
    pub fn register(&mut self, definitions: Vec<SequenceDefinition>) -> Result<(), RegistryError> {
        let mut batch_ids: HashSet<SmolStr> = HashSet::new();
        for def in &definitions {
            def.validate()?;
            if self.registry.contains_key(&def.id) || !batch_ids.insert(def.id.clone()) {
                return Err(RegistryError::DuplicateId(def.id.clone()));
            }
        }
        for def in definitions {
            log::debug!("registered {} '{}'", def.kind(), def.id);
            self.registry.insert(def.id.clone(), def);
        }
        Ok(())
    }

    /// Evaluate one normalized transition against every definition
    pub fn on_event(&mut self, event: &KeyEvent, tracker: &KeyTracker) -> Vec<MatchedSequence> {
        let mut matches = Vec::new();

        for index in 0..self.registry.len() {
            let Some((id, def)) = self.registry.get_index(index) else {
                break;
            };
            match &def.pattern {
                SequencePattern::Chord {
                    keys,
                    modifiers,
                    exact,
                } => {
                    let satisfied = chord_satisfied(keys, *modifiers, *exact, tracker);
                    if satisfied {
                        if self.satisfied_chords.insert(id.clone()) {
                            // Edge into the fully-satisfied state
                            matches.push(MatchedSequence {
                                sequence_id: id.clone(),
                                kind: SequenceKind::Chord,
                                timestamp: event.timestamp,
                                matched_keys: keys.iter().cloned().collect(),
                            });
                        }
                    } else {
                        self.satisfied_chords.remove(id);
                    }
                }
                SequencePattern::Combo { keys, timeout_ms } => {
                    if !event.action.just_pressed() {
                        continue;
                    }
                    let cursor = self.combo_cursors.entry(id.clone()).or_default();
                    if advance_combo(cursor, keys, *timeout_ms, event) {
                        matches.push(MatchedSequence {
                            sequence_id: id.clone(),
                            kind: SequenceKind::Combo,
                            timestamp: event.timestamp,
                            matched_keys: keys.iter().cloned().collect(),
                        });
                    }
                }
                SequencePattern::Hold {
                    key,
                    modifiers,
                    min_hold_ms,
                    continuous,
                } => {
                    if event.key != *key {
                        continue;
                    }
                    if event.action.just_pressed() {
                        let mods_ok = modifiers
                            .map(|spec| spec.matches(&event.modifiers))
                            .unwrap_or(true);
                        if mods_ok {
                            self.holds
                                .start(id, event.timestamp, *min_hold_ms, *continuous);
                        }
                    } else if event.action.is_released() {
                        if self.holds.release(id, event.timestamp)
                            == HoldRelease::CompletedOnRelease
                        {
                            matches.push(MatchedSequence {
                                sequence_id: id.clone(),
                                kind: SequenceKind::Hold,
                                timestamp: event.timestamp,
                                matched_keys: SmallVec::from_elem(key.clone(), 1),
                            });
                        }
                    }
                }
            }
        }

        self.remember(&matches);
        matches
    }

    /// Evaluate all charging holds against the frame clock
    pub fn on_tick(&mut self, now: u64) -> Vec<MatchedSequence> {
        let fired = self.holds.tick(now);
        if fired.is_empty() {
            return Vec::new();
        }

        // Re-order completions by registration order
        let fired: HashSet<SmolStr> = fired.into_iter().collect();
        let mut matches = Vec::new();
        for (id, def) in &self.registry {
            if !fired.contains(id) {
                continue;
            }
            if let SequencePattern::Hold { key, .. } = &def.pattern {
                matches.push(MatchedSequence {
                    sequence_id: id.clone(),
                    kind: SequenceKind::Hold,
                    timestamp: now,
                    matched_keys: SmallVec::from_elem(key.clone(), 1),
                });
            }
        }
        self.remember(&matches);
        matches
    }

    /// Forced recovery: cancel all charging holds and abandon in-flight
    /// combo attempts. Chord satisfaction is re-derived from the tracker
    /// as the synthesized releases stream through `on_event`.
    pub fn recover(&mut self, now: u64) {
        for id in self.holds.cancel_all(now) {
            log::debug!("recover: cancelled hold '{}'", id);
        }
        self.combo_cursors.clear();
    }

    /// Whether the host needs to keep its frame clock running
    pub fn needs_ticks(&self) -> bool {
        self.holds.any_active()
    }

    /// Derived view of one hold id at `now`
    pub fn hold_snapshot(&self, id: &str, now: u64) -> HoldSnapshot {
        self.holds.snapshot(id, now)
    }

    pub fn definition(&self, id: &str) -> Option<&SequenceDefinition> {
        self.registry.get(id)
    }

    /// Registered definitions in registration order
    pub fn definitions(&self) -> impl Iterator<Item = &SequenceDefinition> {
        self.registry.values()
    }

    /// Bounded history of matches, oldest first
    pub fn history(&self) -> &VecDeque<MatchedSequence> {
        &self.history
    }

    fn remember(&mut self, matches: &[MatchedSequence]) {
        for matched in matches {
            if self.history.len() == self.history_limit {
                self.history.pop_front();
            }
            self.history.push_back(matched.clone());
        }
    }
}

/// Whether the chord's key set (and only it, in exact mode) is down.
///
/// Canonical modifier keys are exempt from the exact-set comparison; they
/// are governed by the modifier spec instead.
fn chord_satisfied(
    keys: &[Key],
    modifiers: Option<ModifierSpec>,
    exact: bool,
    tracker: &KeyTracker,
) -> bool {
    if !keys.iter().all(|key| tracker.is_pressed(key)) {
        return false;
    }
    if let Some(spec) = modifiers {
        if !spec.matches(&tracker.modifiers()) {
            return false;
        }
    }
    if exact {
        let wanted: HashSet<&Key> = keys.iter().filter(|k| !k.is_modifier()).collect();
        let pressed = tracker.pressed_keys();
        let pressed: HashSet<&Key> = pressed.iter().filter(|k| !k.is_modifier()).collect();
        if wanted != pressed {
            return false;
        }
    }
    true
}

/// Feed one accepted press into a combo cursor. Returns true on
/// completion (the cursor is reset for the next attempt).
fn advance_combo(cursor: &mut ComboCursor, keys: &[Key], timeout_ms: u64, event: &KeyEvent) -> bool {
    // Lazy expiry against the rolling timeout
    if cursor.index > 0 && event.timestamp.saturating_sub(cursor.last_accepted) > timeout_ms {
        log::trace!("combo attempt expired, resetting");
        cursor.index = 0;
    }

    if event.key == keys[cursor.index] {
        cursor.index += 1;
        cursor.last_accepted = event.timestamp;
    } else if cursor.index > 0 {
        // A failed attempt does not consume this key as a new start
        // unless it happens to open the combo
        cursor.index = 0;
        if event.key == keys[0] {
            cursor.index = 1;
            cursor.last_accepted = event.timestamp;
        }
    }

    if cursor.index == keys.len() {
        cursor.index = 0;
        return true;
    }
    false
}
