// Keysense Key Tracker
// Canonical pressed-key state with desync recovery

use smallvec::SmallVec;
use std::collections::HashMap;

use crate::input::event::KeyEvent;
use crate::input::normalize::Normalized;
use crate::{Action, Key, ModifierState, RawModifiers, Side};

/// Tap/hold classification for a completed press.
///
/// A release shorter than the threshold is a tap, anything at or past it
/// is a hold. The threshold must be positive, so a zero-duration press is
/// always a tap.
pub fn is_tap(duration_ms: u64, threshold_ms: u64) -> bool {
    duration_ms < threshold_ms
}

/// Which physical variants of a canonical key are currently down.
///
/// Both left and right Ctrl can be held at once; the canonical key stays
/// pressed until the last variant is released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SideSet {
    left: bool,
    right: bool,
    sideless: bool,
}

impl SideSet {
    fn add(&mut self, side: Option<Side>) {
        match side {
            Some(Side::Left) => self.left = true,
            Some(Side::Right) => self.right = true,
            None => self.sideless = true,
        }
    }

    fn holds(&self, side: Option<Side>) -> bool {
        match side {
            Some(Side::Left) => self.left,
            Some(Side::Right) => self.right,
            None => self.sideless || self.left || self.right,
        }
    }

    fn remove(&mut self, side: Option<Side>) {
        match side {
            // A concrete side releases that variant; a sideless release
            // means the platform lost the location, so drop everything
            Some(Side::Left) if self.right => self.left = false,
            Some(Side::Right) if self.left => self.right = false,
            _ => *self = SideSet::default(),
        }
    }

    fn is_empty(&self) -> bool {
        !(self.left || self.right || self.sideless)
    }
}

/// Per-key tracked state, created on key-down and destroyed on key-up
/// after classification (or forcibly by [`KeyTracker::recover`]).
#[derive(Debug, Clone)]
pub struct KeyRecord {
    pub key: Key,
    /// Timestamp of the first down, never reset by key-repeat
    pub press_start: u64,
    pub last_action: Action,
    sides: SideSet,
}

/// Key/modifier state tracker.
///
/// Consumes normalized down/up transitions, maintains the set of
/// currently-pressed canonical keys and the modifier flags, and repairs
/// desynchronization (duplicate downs, orphan ups, stuck modifiers, lost
/// keyups on focus loss). Never panics on malformed input; every path
/// degrades to a consistent state.
#[derive(Debug)]
pub struct KeyTracker {
    records: HashMap<Key, KeyRecord>,
    modifiers: ModifierState,
    tap_hold_threshold_ms: u64,
}

impl KeyTracker {
    pub fn new(tap_hold_threshold_ms: u64) -> Self {
        Self {
            records: HashMap::new(),
            modifiers: ModifierState::none(),
            tap_hold_threshold_ms,
        }
    }

    /// Process a normalized key-down.
    ///
    /// Returns the events this transition produced, in order: any
    /// stuck-modifier releases first, then the press itself. Duplicate
    /// downs for an already-pressed key are idempotent: the press timer
    /// is not reset and no event is emitted.
    pub fn press(
        &mut self,
        normalized: &Normalized,
        timestamp: u64,
        raw: RawModifiers,
    ) -> SmallVec<[KeyEvent; 2]> {
        let mut events = self.sweep_stuck_modifiers(raw, timestamp, Some(&normalized.key));

        if let Some(record) = self.records.get_mut(&normalized.key) {
            if record.sides.holds(normalized.side) {
                // Key-repeat: record it, emit nothing
                record.last_action = Action::Repeat;
            } else {
                // Second physical variant of a duplicated key
                record.sides.add(normalized.side);
            }
            self.refresh_modifiers(raw);
            return events;
        }

        let mut sides = SideSet::default();
        sides.add(normalized.side);
        self.records.insert(
            normalized.key.clone(),
            KeyRecord {
                key: normalized.key.clone(),
                press_start: timestamp,
                last_action: Action::Press,
                sides,
            },
        );
        self.refresh_modifiers(raw);
        events.push(KeyEvent::pressed(
            normalized.key.clone(),
            timestamp,
            self.modifiers,
        ));
        events
    }

    /// Process a normalized key-up.
    ///
    /// An orphan up (no prior down was seen, a real platform condition)
    /// synthesizes a zero-duration record instead of failing. Releasing
    /// one variant of a duplicated key while the other is still down
    /// produces no event; the canonical key remains pressed.
    pub fn release(
        &mut self,
        normalized: &Normalized,
        timestamp: u64,
        raw: RawModifiers,
    ) -> SmallVec<[KeyEvent; 2]> {
        let mut events = self.sweep_stuck_modifiers(raw, timestamp, Some(&normalized.key));

        let Some(record) = self.records.get_mut(&normalized.key) else {
            log::debug!(
                "orphan key-up for '{}', synthesizing zero-duration press",
                normalized.key
            );
            let tap = is_tap(0, self.tap_hold_threshold_ms);
            self.refresh_modifiers(raw);
            events.push(KeyEvent::released(
                normalized.key.clone(),
                timestamp,
                0,
                tap,
                self.modifiers,
            ));
            return events;
        };

        record.sides.remove(normalized.side);
        if !record.sides.is_empty() {
            // The other physical variant is still down
            self.refresh_modifiers(raw);
            return events;
        }

        if let Some(record) = self.records.remove(&normalized.key) {
            let duration = timestamp.saturating_sub(record.press_start);
            let tap = is_tap(duration, self.tap_hold_threshold_ms);
            self.refresh_modifiers(raw);
            events.push(KeyEvent::released(
                record.key,
                timestamp,
                duration,
                tap,
                self.modifiers,
            ));
        }
        events
    }

    /// Force-release every tracked key.
    ///
    /// Invoked on loss of input focus or visibility: a key that never
    /// receives its real keyup must not remain pressed forever. Each
    /// synthesized up carries the duration elapsed so far and its tap/hold
    /// classification inferred from it.
    pub fn recover(&mut self, timestamp: u64) -> Vec<KeyEvent> {
        let mut records: Vec<KeyRecord> = self.records.drain().map(|(_, r)| r).collect();
        records.sort_by(|a, b| {
            a.press_start
                .cmp(&b.press_start)
                .then_with(|| a.key.cmp(&b.key))
        });

        let mut events = Vec::with_capacity(records.len());
        for record in records {
            let duration = timestamp.saturating_sub(record.press_start);
            let tap = is_tap(duration, self.tap_hold_threshold_ms);
            self.modifiers.set_key(&record.key, false);
            log::debug!("recover: force-releasing '{}'", record.key);
            events.push(KeyEvent::released(
                record.key,
                timestamp,
                duration,
                tap,
                self.modifiers,
            ));
        }
        self.modifiers = ModifierState::none();
        events
    }

    /// Release tracked modifier keys the raw snapshot says are up.
    ///
    /// A snapshot claiming `ctrl: false` while a ctrl record exists means
    /// the keyup was lost (focus steal, OS shortcut). The tracked state is
    /// repaired immediately rather than waiting for recover().
    fn sweep_stuck_modifiers(
        &mut self,
        raw: RawModifiers,
        timestamp: u64,
        exclude: Option<&Key>,
    ) -> SmallVec<[KeyEvent; 2]> {
        let mut stuck: SmallVec<[Key; 2]> = SmallVec::new();
        for key in self.records.keys() {
            if Some(key) == exclude {
                continue;
            }
            if raw.flag_for(key) == Some(false) {
                stuck.push(key.clone());
            }
        }

        let mut events = SmallVec::new();
        for key in stuck {
            if let Some(record) = self.records.remove(&key) {
                log::debug!("releasing stuck modifier '{}'", key);
                let duration = timestamp.saturating_sub(record.press_start);
                let tap = is_tap(duration, self.tap_hold_threshold_ms);
                self.refresh_modifiers(raw);
                events.push(KeyEvent::released(
                    key,
                    timestamp,
                    duration,
                    tap,
                    self.modifiers,
                ));
            }
        }
        events
    }

    /// Recompute modifier flags from the raw snapshot plus tracked keys
    fn refresh_modifiers(&mut self, raw: RawModifiers) {
        let mut tracked = ModifierState::none();
        for key in self.records.keys() {
            tracked.set_key(key, true);
        }
        self.modifiers = ModifierState::from_raw(raw).union(&tracked);
    }

    /// Whether the canonical key is currently pressed
    pub fn is_pressed(&self, key: &Key) -> bool {
        self.records.contains_key(key)
    }

    /// Currently pressed canonical keys, sorted by name
    pub fn pressed_keys(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.records.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Current canonical modifier state
    pub fn modifiers(&self) -> ModifierState {
        self.modifiers
    }

    /// Physical side of a pressed duplicated key.
    ///
    /// Returns the side when exactly one sided variant is down; `None`
    /// for unpressed keys, sideless keys, or both variants held.
    pub fn pressed_side(&self, key: &Key) -> Option<Side> {
        let sides = self.records.get(key)?.sides;
        match (sides.left, sides.right) {
            (true, false) => Some(Side::Left),
            (false, true) => Some(Side::Right),
            _ => None,
        }
    }

    /// Tracked record for a pressed key
    pub fn record(&self, key: &Key) -> Option<&KeyRecord> {
        self.records.get(key)
    }

    /// Currently pressed modifier keys, sorted for stable comparison.
    /// SmallVec keeps the common 0-4 modifier case off the heap.
    pub fn modifier_snapshot(&self) -> SmallVec<[Key; 4]> {
        let mut mods: SmallVec<[Key; 4]> = self
            .records
            .keys()
            .filter(|k| k.is_modifier())
            .cloned()
            .collect();
        mods.sort();
        mods
    }

    /// Number of pressed canonical keys
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn tap_hold_threshold_ms(&self) -> u64 {
        self.tap_hold_threshold_ms
    }
}
