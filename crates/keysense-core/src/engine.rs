// Keysense Engine
// The facade tying normalization, tracking, and matching together

use std::collections::VecDeque;

use crate::config::EngineConfig;
use crate::input::event::{KeyEvent, RawKey};
use crate::input::normalize::normalize;
use crate::sequence::definition::{RegistryError, SequenceDefinition};
use crate::sequence::hold::HoldSnapshot;
use crate::sequence::matcher::{MatchedSequence, SequenceMatcher};
use crate::state::tracker::KeyTracker;
use crate::{Key, ModifierState, RawModifiers, Side};

type EventListener = Box<dyn FnMut(&KeyEvent)>;
type MatchListener = Box<dyn FnMut(&MatchedSequence)>;

/// One key normalization and sequence-matching engine.
///
/// An engine is a plain owned value: construct it, register definitions,
/// feed it transitions and frame ticks, drop it when done. Instances are
/// fully independent; nothing is shared process-wide.
///
/// Entry points are strictly ordered: each transition is fully processed
/// (state update, classification, match evaluation, listener publication)
/// before the next transition or tick is accepted, so no partial state is
/// ever observable.
///
/// ```
/// use keysense_core::{Engine, RawModifiers, SequenceDefinition, Key};
///
/// let mut engine = Engine::new();
/// engine
///     .register(vec![SequenceDefinition::hold("charge", Key::new("f"), 500)])
///     .unwrap();
///
/// engine.key_down("KeyF".into(), 0, RawModifiers::none());
/// engine.tick(250);
/// assert_eq!(engine.hold_state("charge").progress, 50.0);
/// ```
pub struct Engine {
    config: EngineConfig,
    tracker: KeyTracker,
    matcher: SequenceMatcher,
    event_listeners: Vec<EventListener>,
    match_listeners: Vec<MatchListener>,
    /// Latest timestamp observed on any entry point
    now: u64,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            tracker: KeyTracker::new(config.tap_hold_threshold_ms),
            matcher: SequenceMatcher::new(config.match_history_limit, config.hold_history_limit),
            event_listeners: Vec::new(),
            match_listeners: Vec::new(),
            now: 0,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register sequence definitions.
    ///
    /// The batch is validated as a whole; on error the registry is left
    /// unchanged. Registration order is evaluation order.
    pub fn register(&mut self, definitions: Vec<SequenceDefinition>) -> Result<(), RegistryError> {
        self.matcher.register(definitions)
    }

    /// Subscribe to every published normalized event
    pub fn on_event(&mut self, listener: impl FnMut(&KeyEvent) + 'static) {
        self.event_listeners.push(Box::new(listener));
    }

    /// Subscribe to every sequence match
    pub fn on_match(&mut self, listener: impl FnMut(&MatchedSequence) + 'static) {
        self.match_listeners.push(Box::new(listener));
    }

    /// Ingress: raw key-down from the capture layer.
    ///
    /// Unknown raw codes and duplicate downs are absorbed without error.
    pub fn key_down(&mut self, raw: RawKey<'_>, timestamp: u64, modifiers: RawModifiers) {
        self.observe(timestamp);
        let Some(normalized) = normalize(raw) else {
            log::trace!("ignoring unactionable key-down '{}'", raw.code);
            return;
        };
        let events = self.tracker.press(&normalized, timestamp, modifiers);
        self.publish(events.into_vec());
    }

    /// Ingress: raw key-up from the capture layer.
    ///
    /// An up without a prior down synthesizes a zero-duration press.
    pub fn key_up(&mut self, raw: RawKey<'_>, timestamp: u64, modifiers: RawModifiers) {
        self.observe(timestamp);
        let Some(normalized) = normalize(raw) else {
            log::trace!("ignoring unactionable key-up '{}'", raw.code);
            return;
        };
        let events = self.tracker.release(&normalized, timestamp, modifiers);
        self.publish(events.into_vec());
    }

    /// Ingress: focus or visibility was lost.
    ///
    /// Synchronously force-releases every pressed key and cancels every
    /// charging hold. Consumers see ordinary release events and
    /// `just_cancelled` flags, never an error.
    pub fn recover(&mut self, timestamp: u64) {
        self.observe(timestamp);
        self.matcher.recover(timestamp);
        let events = self.tracker.recover(timestamp);
        self.publish(events);
    }

    /// Ingress: one tick of the host's frame clock.
    ///
    /// Only needed while [`Engine::needs_ticks`] is true; hold progress
    /// and completion are evaluated against the supplied timestamp, never
    /// a wall clock.
    pub fn tick(&mut self, timestamp: u64) {
        self.observe(timestamp);
        let matches = self.matcher.on_tick(timestamp);
        for matched in &matches {
            for listener in &mut self.match_listeners {
                listener(matched);
            }
        }
    }

    /// Whether the host should keep its frame clock running.
    ///
    /// Becomes true on the first hold activation and false again when the
    /// last one ends, so hosts can pause their tick loop entirely while
    /// nothing is charging.
    pub fn needs_ticks(&self) -> bool {
        self.matcher.needs_ticks()
    }

    /// Whether the canonical key is currently pressed
    pub fn is_key_pressed(&self, key: &Key) -> bool {
        self.tracker.is_pressed(key)
    }

    /// Currently pressed canonical keys, sorted by name
    pub fn pressed_keys(&self) -> Vec<Key> {
        self.tracker.pressed_keys()
    }

    /// Current canonical modifier state
    pub fn active_modifiers(&self) -> ModifierState {
        self.tracker.modifiers()
    }

    /// Physical side of a pressed duplicated key, when unambiguous
    pub fn pressed_side(&self, key: &Key) -> Option<Side> {
        self.tracker.pressed_side(key)
    }

    /// Derived per-frame view of one hold id, relative to the latest
    /// observed timestamp
    pub fn hold_state(&self, id: &str) -> HoldSnapshot {
        self.matcher.hold_snapshot(id, self.now)
    }

    /// Bounded history of matches, oldest first
    pub fn match_history(&self) -> &VecDeque<MatchedSequence> {
        self.matcher.history()
    }

    /// Registered definitions in registration order
    pub fn definitions(&self) -> impl Iterator<Item = &SequenceDefinition> {
        self.matcher.definitions()
    }

    /// Process and publish a batch of normalized events in order
    fn publish(&mut self, events: Vec<KeyEvent>) {
        for event in events {
            for listener in &mut self.event_listeners {
                listener(&event);
            }
            let matches = self.matcher.on_event(&event, &self.tracker);
            for matched in &matches {
                log::debug!(
                    "matched {} '{}' at {}ms",
                    matched.kind,
                    matched.sequence_id,
                    matched.timestamp
                );
                for listener in &mut self.match_listeners {
                    listener(matched);
                }
            }
        }
    }

    /// Timestamps never move backwards; a stale one is clamped forward
    fn observe(&mut self, timestamp: u64) {
        self.now = self.now.max(timestamp);
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::keys;

    fn ctrl_raw() -> RawModifiers {
        RawModifiers {
            ctrl: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_listener_receives_events() {
        let seen: Rc<RefCell<Vec<(Key, crate::Action)>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut engine = Engine::new();
        engine.on_event(move |event| sink.borrow_mut().push((event.key.clone(), event.action)));

        engine.key_down("KeyA".into(), 0, RawModifiers::none());
        engine.key_up("KeyA".into(), 50, RawModifiers::none());

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], (Key::new("a"), crate::Action::Press));
        assert_eq!(seen[1], (Key::new("a"), crate::Action::Release));
    }

    #[test]
    fn test_match_listener_fires() {
        let matched: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&matched);

        let mut engine = Engine::new();
        engine
            .register(vec![SequenceDefinition::chord(
                "save",
                vec![keys::CTRL, Key::new("s")],
            )])
            .unwrap();
        engine.on_match(move |m| sink.borrow_mut().push(m.sequence_id.to_string()));

        engine.key_down("ControlLeft".into(), 0, ctrl_raw());
        engine.key_down("KeyS".into(), 10, ctrl_raw());

        assert_eq!(matched.borrow().as_slice(), &["save".to_string()]);
    }

    #[test]
    fn test_queries() {
        let mut engine = Engine::new();
        engine.key_down("ControlLeft".into(), 0, ctrl_raw());
        engine.key_down("KeyA".into(), 10, ctrl_raw());

        assert!(engine.is_key_pressed(&keys::CTRL));
        assert!(engine.is_key_pressed(&Key::new("a")));
        assert_eq!(engine.pressed_keys(), vec![Key::new("a"), keys::CTRL]);
        assert!(engine.active_modifiers().ctrl);
        assert_eq!(engine.pressed_side(&keys::CTRL), Some(Side::Left));
    }

    #[test]
    fn test_unknown_raw_codes_are_absorbed() {
        let mut engine = Engine::new();
        engine.key_down("Unidentified".into(), 0, RawModifiers::none());
        engine.key_up("Dead".into(), 10, RawModifiers::none());
        assert!(engine.pressed_keys().is_empty());
    }

    #[test]
    fn test_recover_clears_state_and_cancels_holds() {
        let mut engine = Engine::new();
        engine
            .register(vec![SequenceDefinition::hold("charge", Key::new("f"), 500)])
            .unwrap();

        engine.key_down("KeyF".into(), 0, RawModifiers::none());
        engine.key_down("KeyA".into(), 10, RawModifiers::none());
        assert!(engine.needs_ticks());

        engine.recover(100);
        assert!(engine.pressed_keys().is_empty());
        assert!(!engine.needs_ticks());
        assert!(engine.hold_state("charge").just_cancelled);
    }

    #[test]
    fn test_instances_are_independent() {
        let mut a = Engine::new();
        let mut b = Engine::new();
        a.key_down("KeyA".into(), 0, RawModifiers::none());
        assert!(a.is_key_pressed(&Key::new("a")));
        assert!(!b.is_key_pressed(&Key::new("a")));
        b.key_down("KeyB".into(), 0, RawModifiers::none());
        assert_eq!(a.pressed_keys(), vec![Key::new("a")]);
        assert_eq!(b.pressed_keys(), vec![Key::new("b")]);
    }

    #[test]
    fn test_timestamps_never_regress() {
        let mut engine = Engine::new();
        engine
            .register(vec![SequenceDefinition::hold("charge", Key::new("f"), 500)])
            .unwrap();
        engine.key_down("KeyF".into(), 1000, RawModifiers::none());
        engine.tick(1600);
        // A stale tick cannot pull progress backwards
        engine.tick(1200);
        assert_eq!(engine.hold_state("charge").progress, 100.0);
    }
}
