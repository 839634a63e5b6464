// Keysense Key Type
// Canonical key identifiers, stable across platforms and layouts

use std::fmt;

use smol_str::SmolStr;

/// Canonical identifier for a physical key.
///
/// Produced by the normalizer (see [`crate::input::normalize`]) or parsed
/// from a configuration name via [`key_from_name`]. The identifier is an
/// opaque lowercase string; consumers compare keys, they do not interpret
/// them. Cheap to clone and hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct Key(SmolStr);

impl Key {
    /// Construct a key from a compile-time identifier.
    pub(crate) const fn from_static(name: &'static str) -> Self {
        Key(SmolStr::new_static(name))
    }

    /// Create a key from an arbitrary identifier.
    ///
    /// The identifier is lowercased so that layout-dependent printable
    /// characters ("É", "Ñ") and hand-written names collapse to a single
    /// canonical form.
    pub fn new(name: &str) -> Self {
        if name.chars().all(|c| c.is_lowercase() || !c.is_alphabetic()) {
            Key(SmolStr::new(name))
        } else {
            Key(SmolStr::new(name.to_lowercase()))
        }
    }

    /// Get the canonical name of this key
    pub fn name(&self) -> &str {
        self.0.as_str()
    }

    /// Get the canonical name of this key
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether this key is one of the four canonical modifiers
    pub fn is_modifier(&self) -> bool {
        matches!(self.0.as_str(), "ctrl" | "shift" | "alt" | "meta")
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::new(name)
    }
}

/// Named-key constants: the stable public vocabulary.
///
/// Consumer logic keyed on these names is guaranteed to keep working when
/// new platform quirks are added to the normalizer.
pub mod keys {
    use super::Key;

    pub const CTRL: Key = Key::from_static("ctrl");
    pub const SHIFT: Key = Key::from_static("shift");
    pub const ALT: Key = Key::from_static("alt");
    pub const META: Key = Key::from_static("meta");

    pub const ENTER: Key = Key::from_static("enter");
    pub const ESCAPE: Key = Key::from_static("escape");
    pub const SPACE: Key = Key::from_static("space");
    pub const TAB: Key = Key::from_static("tab");
    pub const BACKSPACE: Key = Key::from_static("backspace");
    pub const DELETE: Key = Key::from_static("delete");
    pub const INSERT: Key = Key::from_static("insert");
    pub const CAPS_LOCK: Key = Key::from_static("capslock");
    pub const NUM_LOCK: Key = Key::from_static("numlock");
    pub const SCROLL_LOCK: Key = Key::from_static("scrolllock");
    pub const CONTEXT_MENU: Key = Key::from_static("contextmenu");
    pub const PRINT_SCREEN: Key = Key::from_static("printscreen");
    pub const PAUSE: Key = Key::from_static("pause");

    pub const HOME: Key = Key::from_static("home");
    pub const END: Key = Key::from_static("end");
    pub const PAGE_UP: Key = Key::from_static("pageup");
    pub const PAGE_DOWN: Key = Key::from_static("pagedown");
    pub const ARROW_UP: Key = Key::from_static("arrowup");
    pub const ARROW_DOWN: Key = Key::from_static("arrowdown");
    pub const ARROW_LEFT: Key = Key::from_static("arrowleft");
    pub const ARROW_RIGHT: Key = Key::from_static("arrowright");

    pub const F1: Key = Key::from_static("f1");
    pub const F2: Key = Key::from_static("f2");
    pub const F3: Key = Key::from_static("f3");
    pub const F4: Key = Key::from_static("f4");
    pub const F5: Key = Key::from_static("f5");
    pub const F6: Key = Key::from_static("f6");
    pub const F7: Key = Key::from_static("f7");
    pub const F8: Key = Key::from_static("f8");
    pub const F9: Key = Key::from_static("f9");
    pub const F10: Key = Key::from_static("f10");
    pub const F11: Key = Key::from_static("f11");
    pub const F12: Key = Key::from_static("f12");
}

/// Alias table for configuration names.
///
/// Accepts the names users actually write in definition files, not just
/// the canonical identifiers.
static NAME_ALIASES: &[(&str, &str)] = &[
    ("ctrl", "ctrl"),
    ("control", "ctrl"),
    ("lctrl", "ctrl"),
    ("rctrl", "ctrl"),
    ("shift", "shift"),
    ("lshift", "shift"),
    ("rshift", "shift"),
    ("alt", "alt"),
    ("option", "alt"),
    ("opt", "alt"),
    ("altgr", "alt"),
    ("meta", "meta"),
    ("super", "meta"),
    ("win", "meta"),
    ("cmd", "meta"),
    ("command", "meta"),
    ("enter", "enter"),
    ("return", "enter"),
    ("escape", "escape"),
    ("esc", "escape"),
    ("space", "space"),
    ("spacebar", "space"),
    ("tab", "tab"),
    ("backspace", "backspace"),
    ("delete", "delete"),
    ("del", "delete"),
    ("insert", "insert"),
    ("ins", "insert"),
    ("capslock", "capslock"),
    ("caps", "capslock"),
    ("numlock", "numlock"),
    ("scrolllock", "scrolllock"),
    ("contextmenu", "contextmenu"),
    ("menu", "contextmenu"),
    ("apps", "contextmenu"),
    ("printscreen", "printscreen"),
    ("prtscr", "printscreen"),
    ("pause", "pause"),
    ("home", "home"),
    ("end", "end"),
    ("pageup", "pageup"),
    ("pgup", "pageup"),
    ("pagedown", "pagedown"),
    ("pgdn", "pagedown"),
    ("arrowup", "arrowup"),
    ("up", "arrowup"),
    ("arrowdown", "arrowdown"),
    ("down", "arrowdown"),
    ("arrowleft", "arrowleft"),
    ("left", "arrowleft"),
    ("arrowright", "arrowright"),
    ("right", "arrowright"),
];

/// Try to parse a key name to a canonical key.
///
/// Accepts canonical identifiers, the alias table above (case-insensitive),
/// single printable characters, and function keys F1..F24. Returns `None`
/// for names outside the stable vocabulary.
pub fn key_from_name(name: &str) -> Option<Key> {
    if name.is_empty() {
        return None;
    }

    // Single printable character: lowercase it and use it directly
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if !c.is_whitespace() && !c.is_control() {
            return Some(Key::new(name));
        }
        return None;
    }

    let lower = name.to_lowercase();

    if let Some(&(_, canonical)) = NAME_ALIASES.iter().find(|(alias, _)| *alias == lower) {
        return Some(Key::new(canonical));
    }

    // Function keys F1..F24
    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
        if (1..=24).contains(&n) {
            return Some(Key::new(&lower));
        }
    }

    None
}

// Deserialization goes through the alias table so definition files can say
// "Ctrl" or "Esc"; unknown names degrade to an opaque lowercase identifier.
impl<'de> serde::Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(key_from_name(&name).unwrap_or_else(|| Key::new(&name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_name() {
        assert_eq!(key_from_name("a"), Some(Key::new("a")));
        assert_eq!(key_from_name("A"), Some(Key::new("a")));
        assert_eq!(key_from_name("Ctrl"), Some(keys::CTRL));
        assert_eq!(key_from_name("LCtrl"), Some(keys::CTRL));
        assert_eq!(key_from_name("Esc"), Some(keys::ESCAPE));
        assert_eq!(key_from_name("Cmd"), Some(keys::META));
        assert_eq!(key_from_name("Up"), Some(keys::ARROW_UP));
        assert_eq!(key_from_name("F12"), Some(keys::F12));
        assert_eq!(key_from_name("f24"), Some(Key::new("f24")));
        assert_eq!(key_from_name("f25"), None);
        assert_eq!(key_from_name("definitely_not_a_key"), None);
        assert_eq!(key_from_name(""), None);
    }

    #[test]
    fn test_key_new_lowercases() {
        assert_eq!(Key::new("É"), Key::new("é"));
        assert_eq!(Key::new("Q").name(), "q");
    }

    #[test]
    fn test_key_display() {
        assert_eq!(keys::CTRL.to_string(), "ctrl");
        assert_eq!(Key::new("a").to_string(), "a");
    }

    #[test]
    fn test_key_is_modifier() {
        assert!(keys::CTRL.is_modifier());
        assert!(keys::SHIFT.is_modifier());
        assert!(keys::ALT.is_modifier());
        assert!(keys::META.is_modifier());
        assert!(!keys::ENTER.is_modifier());
        assert!(!Key::new("a").is_modifier());
    }

    #[test]
    fn test_key_hash() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(Key::new("a"), "value");
        assert_eq!(map.get(&Key::new("a")), Some(&"value"));
    }

    #[test]
    fn test_key_ordering() {
        assert!(Key::new("a") < Key::new("b"));
    }
}
