// Keysense Key Normalizer
// Raw platform key codes to canonical identifiers

use crate::{Key, Side};

use super::event::RawKey;

/// Physical location field reported with a raw key event.
///
/// Some platforms report a generic code ("Control") plus a location instead
/// of a sided code ("ControlLeft"); the normalizer folds both shapes into
/// the same canonical result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyLocation {
    #[default]
    Standard,
    Left,
    Right,
    Numpad,
}

/// Result of normalizing one raw key identifier.
///
/// `side` is populated for left/right variants of duplicated keys; the
/// canonical `key` itself never encodes a side, so consumer logic keyed on
/// key names stays side-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub key: Key,
    pub side: Option<Side>,
}

impl Normalized {
    fn sideless(key: Key) -> Self {
        Self { key, side: None }
    }

    fn sided(key: Key, side: Side) -> Self {
        Self {
            key,
            side: Some(side),
        }
    }
}

/// Static quirk table for named raw codes.
///
/// Covers the modern sided codes, the generic legacy names, and the
/// old-IE spellings that still show up on real devices. Entries must never
/// change the meaning of an existing canonical identifier, only add new
/// spellings for it.
static QUIRKS: &[(&str, &str, Option<Side>)] = &[
    ("Control", "ctrl", None),
    ("ControlLeft", "ctrl", Some(Side::Left)),
    ("ControlRight", "ctrl", Some(Side::Right)),
    ("Shift", "shift", None),
    ("ShiftLeft", "shift", Some(Side::Left)),
    ("ShiftRight", "shift", Some(Side::Right)),
    ("Alt", "alt", None),
    ("AltLeft", "alt", Some(Side::Left)),
    ("AltRight", "alt", Some(Side::Right)),
    // AltGr decomposes to the right Alt; the phantom Control some
    // platforms report alongside it arrives as its own event
    ("AltGraph", "alt", Some(Side::Right)),
    ("Meta", "meta", None),
    ("MetaLeft", "meta", Some(Side::Left)),
    ("MetaRight", "meta", Some(Side::Right)),
    ("OS", "meta", None),
    ("OSLeft", "meta", Some(Side::Left)),
    ("OSRight", "meta", Some(Side::Right)),
    ("Win", "meta", None),
    ("Super", "meta", None),
    ("Hyper", "meta", None),
    ("Enter", "enter", None),
    ("Return", "enter", None),
    ("NumpadEnter", "enter", None),
    ("Escape", "escape", None),
    ("Esc", "escape", None),
    ("Space", "space", None),
    ("Spacebar", "space", None),
    (" ", "space", None),
    ("Tab", "tab", None),
    ("Backspace", "backspace", None),
    ("Delete", "delete", None),
    ("Del", "delete", None),
    ("Insert", "insert", None),
    ("CapsLock", "capslock", None),
    ("NumLock", "numlock", None),
    ("ScrollLock", "scrolllock", None),
    ("Scroll", "scrolllock", None),
    ("ContextMenu", "contextmenu", None),
    ("Apps", "contextmenu", None),
    ("PrintScreen", "printscreen", None),
    ("Pause", "pause", None),
    ("Home", "home", None),
    ("End", "end", None),
    ("PageUp", "pageup", None),
    ("PageDown", "pagedown", None),
    ("ArrowUp", "arrowup", None),
    ("Up", "arrowup", None),
    ("ArrowDown", "arrowdown", None),
    ("Down", "arrowdown", None),
    ("ArrowLeft", "arrowleft", None),
    ("Left", "arrowleft", None),
    ("ArrowRight", "arrowright", None),
    ("Right", "arrowright", None),
    ("NumpadAdd", "+", None),
    ("NumpadSubtract", "-", None),
    ("NumpadMultiply", "*", None),
    ("NumpadDivide", "/", None),
    ("NumpadDecimal", ".", None),
];

/// Raw values that carry no actionable key.
static UNACTIONABLE: &[&str] = &["", "Unidentified", "Dead", "Process"];

/// Normalize a raw platform key into its canonical identity.
///
/// Pure function over the raw code, the location disambiguator, and the
/// static quirk tables. The same physical key always yields the same
/// canonical key; left/right modifier variants collapse to one identity
/// with the side reported separately. Returns `None` when the raw event
/// carries no actionable key.
pub fn normalize(raw: RawKey<'_>) -> Option<Normalized> {
    if UNACTIONABLE.contains(&raw.code) {
        return None;
    }

    if let Some(&(_, canonical, side)) = QUIRKS.iter().find(|(code, _, _)| *code == raw.code) {
        let side = side.or_else(|| side_from_location(raw.location));
        return Some(Normalized {
            key: Key::new(canonical),
            side,
        });
    }

    // "KeyA".."KeyZ"
    if let Some(letter) = raw.code.strip_prefix("Key") {
        let mut chars = letter.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_uppercase() {
                return Some(Normalized::sideless(Key::new(letter)));
            }
        }
    }

    // "Digit0".."Digit9" and "Numpad0".."Numpad9" collapse to the digit;
    // the numpad variant keeps its location queryable through `RawKey`
    for prefix in ["Digit", "Numpad"] {
        if let Some(digit) = raw.code.strip_prefix(prefix) {
            if digit.len() == 1 && digit.chars().all(|c| c.is_ascii_digit()) {
                return Some(Normalized::sideless(Key::new(digit)));
            }
        }
    }

    // Function keys pass through as lowercase
    if let Some(n) = raw.code.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
        if (1..=24).contains(&n) {
            return Some(Normalized::sideless(Key::new(&raw.code.to_lowercase())));
        }
    }

    // Single printable character: layout-dependent output, lowercased
    let mut chars = raw.code.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if !c.is_control() && !c.is_whitespace() {
            return Some(Normalized::sideless(Key::new(raw.code)));
        }
        return None;
    }

    // Unknown multi-character code: keep it as an opaque lowercase
    // identifier so downstream state stays consistent
    log::trace!("unrecognized raw key code '{}', passing through", raw.code);
    Some(Normalized {
        key: Key::new(raw.code),
        side: side_from_location(raw.location),
    })
}

fn side_from_location(location: KeyLocation) -> Option<Side> {
    match location {
        KeyLocation::Left => Some(Side::Left),
        KeyLocation::Right => Some(Side::Right),
        KeyLocation::Standard | KeyLocation::Numpad => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;

    fn key_of(code: &str) -> Key {
        normalize(RawKey::new(code)).unwrap().key
    }

    #[test]
    fn test_modifier_variants_collapse() {
        assert_eq!(key_of("ControlLeft"), keys::CTRL);
        assert_eq!(key_of("ControlRight"), keys::CTRL);
        assert_eq!(key_of("Control"), keys::CTRL);
        assert_eq!(key_of("MetaLeft"), keys::META);
        assert_eq!(key_of("OSLeft"), keys::META);
        assert_eq!(key_of("Win"), keys::META);
    }

    #[test]
    fn test_side_stays_queryable() {
        let left = normalize(RawKey::new("ControlLeft")).unwrap();
        assert_eq!(left.side, Some(Side::Left));
        let right = normalize(RawKey::new("ControlRight")).unwrap();
        assert_eq!(right.side, Some(Side::Right));
        let plain = normalize(RawKey::new("KeyA")).unwrap();
        assert_eq!(plain.side, None);
    }

    #[test]
    fn test_location_disambiguates_generic_codes() {
        let sided = normalize(RawKey::with_location("Shift", KeyLocation::Right)).unwrap();
        assert_eq!(sided.key, keys::SHIFT);
        assert_eq!(sided.side, Some(Side::Right));
    }

    #[test]
    fn test_altgr_resolves_to_right_alt() {
        let altgr = normalize(RawKey::new("AltGraph")).unwrap();
        assert_eq!(altgr.key, keys::ALT);
        assert_eq!(altgr.side, Some(Side::Right));
    }

    #[test]
    fn test_letters_and_digits() {
        assert_eq!(key_of("KeyA"), Key::new("a"));
        assert_eq!(key_of("KeyZ"), Key::new("z"));
        assert_eq!(key_of("Digit5"), Key::new("5"));
        assert_eq!(key_of("Numpad5"), Key::new("5"));
        assert_eq!(key_of("F5"), Key::new("f5"));
    }

    #[test]
    fn test_layout_dependent_characters() {
        assert_eq!(key_of("é"), Key::new("é"));
        assert_eq!(key_of("É"), Key::new("é"));
        assert_eq!(key_of("a"), Key::new("a"));
    }

    #[test]
    fn test_legacy_names_share_canonical_ids() {
        assert_eq!(key_of("Esc"), key_of("Escape"));
        assert_eq!(key_of("Del"), key_of("Delete"));
        assert_eq!(key_of("Spacebar"), key_of(" "));
        assert_eq!(key_of("Up"), key_of("ArrowUp"));
        assert_eq!(key_of("Return"), key_of("Enter"));
        assert_eq!(key_of("NumpadEnter"), key_of("Enter"));
    }

    #[test]
    fn test_unactionable_codes() {
        assert_eq!(normalize(RawKey::new("Unidentified")), None);
        assert_eq!(normalize(RawKey::new("Dead")), None);
        assert_eq!(normalize(RawKey::new("")), None);
    }

    #[test]
    fn test_unknown_codes_pass_through_stably() {
        let a = normalize(RawKey::new("LaunchApplication7")).unwrap();
        let b = normalize(RawKey::new("LaunchApplication7")).unwrap();
        assert_eq!(a, b);
    }
}
