// Keysense Engine Configuration

/// Tunable parameters for an engine instance.
///
/// Everything here is fixed at construction; the registry of sequence
/// definitions is configured separately through
/// [`crate::Engine::register`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Releases shorter than this classify as taps, everything else as
    /// holds
    pub tap_hold_threshold_ms: u64,
    /// Bound on the match history kept for inspection
    pub match_history_limit: usize,
    /// Bound on each hold's lifecycle event ring
    pub hold_history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tap_hold_threshold_ms: 200,
            match_history_limit: 64,
            hold_history_limit: 32,
        }
    }
}
