// Keysense Integration Tests
//
// Cross-module behavior: registration validation through the engine,
// normalizer stability guarantees, and egress queries.

use keysense_core::{
    key_from_name, keys, normalize, Engine, Key, KeyLocation, RawKey, RawModifiers, RegistryError,
    SequenceDefinition, Side,
};

fn ctrl_raw() -> RawModifiers {
    RawModifiers {
        ctrl: true,
        ..Default::default()
    }
}

// =========================================================================
// Registration
// =========================================================================

#[test]
fn registration_failure_leaves_registry_unchanged() {
    let mut engine = Engine::new();
    engine
        .register(vec![SequenceDefinition::chord("save", vec![keys::CTRL])])
        .unwrap();

    let result = engine.register(vec![
        SequenceDefinition::combo("ok", vec![Key::new("a")], 300),
        SequenceDefinition::hold("bad", Key::new("f"), 0),
    ]);
    assert!(matches!(result, Err(RegistryError::NonPositiveHold { .. })));

    let ids: Vec<String> = engine
        .definitions()
        .map(|d| d.id.to_string())
        .collect();
    assert_eq!(ids, vec!["save"]);
}

#[test]
fn registration_error_messages_name_the_definition() {
    let mut engine = Engine::new();
    let err = engine
        .register(vec![SequenceDefinition::hold("charge", Key::new("f"), 0)])
        .unwrap_err();
    assert_eq!(err.to_string(), "sequence 'charge': min_hold_ms must be positive");

    let err = engine
        .register(vec![SequenceDefinition::chord("empty", vec![])])
        .unwrap_err();
    assert_eq!(err.to_string(), "sequence 'empty' has an empty key list");
}

#[test]
fn incremental_registration_preserves_order() {
    let mut engine = Engine::new();
    engine
        .register(vec![SequenceDefinition::chord("first", vec![Key::new("a")])])
        .unwrap();
    engine
        .register(vec![SequenceDefinition::chord("second", vec![Key::new("b")])])
        .unwrap();

    let ids: Vec<String> = engine
        .definitions()
        .map(|d| d.id.to_string())
        .collect();
    assert_eq!(ids, vec!["first", "second"]);
}

// =========================================================================
// Normalizer Guarantees
// =========================================================================

#[test]
fn same_physical_key_same_canonical_id() {
    // Pairs of raw spellings that must land on the same canonical key
    let pairs = [
        ("ControlLeft", "Control"),
        ("OSLeft", "MetaLeft"),
        ("Win", "Meta"),
        ("Esc", "Escape"),
        ("Return", "Enter"),
        ("Del", "Delete"),
        ("Spacebar", " "),
        ("Up", "ArrowUp"),
        ("Digit7", "Numpad7"),
    ];
    for (a, b) in pairs {
        let ka = normalize(RawKey::new(a)).unwrap().key;
        let kb = normalize(RawKey::new(b)).unwrap().key;
        assert_eq!(ka, kb, "'{}' and '{}' diverged", a, b);
    }
}

#[test]
fn config_names_reach_the_same_vocabulary_as_raw_codes() {
    // A definition written with "Ctrl" must match the key the normalizer
    // produces for "ControlLeft"
    let from_config = key_from_name("Ctrl").unwrap();
    let from_raw = normalize(RawKey::new("ControlLeft")).unwrap().key;
    assert_eq!(from_config, from_raw);

    let from_config = key_from_name("Esc").unwrap();
    let from_raw = normalize(RawKey::new("Escape")).unwrap().key;
    assert_eq!(from_config, from_raw);
}

#[test]
fn sided_keys_collapse_but_stay_queryable() {
    let mut engine = Engine::new();
    engine.key_down("ControlRight".into(), 0, ctrl_raw());

    assert!(engine.is_key_pressed(&keys::CTRL));
    assert_eq!(engine.pressed_side(&keys::CTRL), Some(Side::Right));

    engine.key_up("ControlRight".into(), 50, RawModifiers::none());
    assert_eq!(engine.pressed_side(&keys::CTRL), None);
}

#[test]
fn generic_code_with_location_field() {
    let mut engine = Engine::new();
    engine.key_down(
        RawKey::with_location("Shift", KeyLocation::Left),
        0,
        RawModifiers {
            shift: true,
            ..Default::default()
        },
    );
    assert_eq!(engine.pressed_side(&keys::SHIFT), Some(Side::Left));
}

// =========================================================================
// Egress Queries
// =========================================================================

#[test]
fn pressed_keys_and_modifiers_stay_in_sync() {
    let mut engine = Engine::new();
    engine.key_down("ControlLeft".into(), 0, ctrl_raw());
    engine.key_down("KeyS".into(), 10, ctrl_raw());

    assert_eq!(engine.pressed_keys(), vec![keys::CTRL, Key::new("s")]);
    assert!(engine.active_modifiers().ctrl);

    engine.key_up("KeyS".into(), 50, ctrl_raw());
    engine.key_up("ControlLeft".into(), 60, RawModifiers::none());

    assert!(engine.pressed_keys().is_empty());
    assert!(engine.active_modifiers().is_empty());
}

#[test]
fn hold_state_for_registered_but_idle_hold() {
    let mut engine = Engine::new();
    engine
        .register(vec![SequenceDefinition::hold("charge", Key::new("f"), 500)])
        .unwrap();

    let state = engine.hold_state("charge");
    assert_eq!(state.progress, 0.0);
    assert!(!state.is_charging);
    assert!(!state.just_started);
    assert!(state.event_history.is_empty());
}

#[test]
fn tick_loop_gate_follows_hold_lifecycle() {
    let mut engine = Engine::new();
    engine
        .register(vec![
            SequenceDefinition::hold("left", Key::new("a"), 500),
            SequenceDefinition::hold("right", Key::new("d"), 500),
        ])
        .unwrap();
    assert!(!engine.needs_ticks());

    engine.key_down("KeyA".into(), 0, RawModifiers::none());
    assert!(engine.needs_ticks());
    engine.key_down("KeyD".into(), 10, RawModifiers::none());
    engine.key_up("KeyA".into(), 100, RawModifiers::none());
    // One hold still charging
    assert!(engine.needs_ticks());
    engine.key_up("KeyD".into(), 150, RawModifiers::none());
    assert!(!engine.needs_ticks());
}

#[test]
fn hold_event_history_survives_the_activation() {
    let mut engine = Engine::new();
    engine
        .register(vec![SequenceDefinition::hold("charge", Key::new("f"), 500)])
        .unwrap();

    engine.key_down("KeyF".into(), 0, RawModifiers::none());
    engine.key_up("KeyF".into(), 100, RawModifiers::none());
    engine.key_down("KeyF".into(), 1000, RawModifiers::none());
    engine.tick(1500);
    engine.key_up("KeyF".into(), 1600, RawModifiers::none());

    let history = engine.hold_state("charge").event_history;
    let kinds: Vec<String> = history.iter().map(|e| e.kind.to_string()).collect();
    assert_eq!(kinds, vec!["started", "cancelled", "started", "completed"]);
}
