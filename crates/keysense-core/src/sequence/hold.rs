// Keysense Hold Progress
// Active hold lifecycle, frame-driven progress, and animation coefficients

use std::collections::{HashMap, VecDeque};

use smol_str::SmolStr;

/// Observation window for the just-started/completed/cancelled flags.
/// Consumers polling once per frame must be able to see each flag at
/// least once, so the window is fixed well above one frame interval.
pub const FLAG_WINDOW_MS: u64 = 100;

/// Progress fraction above which the glow coefficient ramps in.
const READY_CUTOFF: f32 = 0.9;

/// Oscillation frequency for the shake coefficient while glowing.
const SHAKE_HZ: f32 = 12.0;

/// Lifecycle entry in a hold's bounded event history.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, serde::Serialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum HoldEventKind {
    Started,
    Completed,
    Cancelled,
}

/// One lifecycle event of a hold activation. Entries persist in the ring
/// buffer after the activation itself is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct HoldEvent {
    pub timestamp: u64,
    pub kind: HoldEventKind,
}

/// Outcome of releasing the key of a hold definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldRelease {
    /// No activation existed for this definition
    NotActive,
    /// Released before the threshold
    Cancelled,
    /// Threshold was passed but no tick had fired the completion yet;
    /// the release completes it lazily
    CompletedOnRelease,
    /// Completion already fired on an earlier tick
    AlreadyCompleted,
}

/// A hold activation being charged.
#[derive(Debug, Clone)]
struct ActiveHold {
    start: u64,
    min_hold_ms: u64,
    continuous: bool,
    /// Completions fired for this activation so far
    fires: u32,
}

impl ActiveHold {
    fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.start)
    }

    /// Whether a completion is due at `now`. Non-continuous holds fire
    /// once; continuous holds re-arm for every further full interval.
    fn completion_due(&self, now: u64) -> bool {
        if self.fires > 0 && !self.continuous {
            return false;
        }
        let due_at = self.min_hold_ms.saturating_mul(u64::from(self.fires) + 1);
        self.elapsed(now) >= due_at
    }
}

/// Derived per-frame view of one hold id.
///
/// Every field is recomputed from the activation and the event history;
/// nothing here is persisted state.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldSnapshot {
    /// 0..=100, exactly 100 at and past the threshold
    pub progress: f32,
    pub elapsed_ms: u64,
    pub remaining_ms: u64,
    /// An activation currently exists for this id
    pub is_charging: bool,
    /// Animation scale in [1.0, 1.3]
    pub scale: f32,
    /// Animation opacity in [0.3, 1.0]
    pub opacity: f32,
    /// Ready glow in [0, 1], non-zero only above the ready cutoff
    pub glow: f32,
    /// Time-based oscillation, non-zero only while glowing
    pub shake: f32,
    pub just_started: bool,
    pub just_completed: bool,
    pub just_cancelled: bool,
    pub event_history: Vec<HoldEvent>,
}

impl HoldSnapshot {
    fn idle() -> Self {
        Self::from_progress(0.0, 0, 0, false, 0)
    }

    fn from_progress(
        progress: f32,
        elapsed_ms: u64,
        remaining_ms: u64,
        is_charging: bool,
        oscillation_ms: u64,
    ) -> Self {
        let t = progress / 100.0;
        let glow = glow_for(t);
        Self {
            progress,
            elapsed_ms,
            remaining_ms,
            is_charging,
            scale: scale_for(t),
            opacity: opacity_for(t),
            glow,
            shake: shake_for(glow, oscillation_ms),
            just_started: false,
            just_completed: false,
            just_cancelled: false,
            event_history: Vec::new(),
        }
    }
}

/// Scale coefficient as a pure function of progress fraction
fn scale_for(t: f32) -> f32 {
    1.0 + 0.3 * t
}

/// Opacity coefficient as a pure function of progress fraction
fn opacity_for(t: f32) -> f32 {
    0.3 + 0.7 * t
}

/// Glow ramps linearly from the ready cutoff to full charge
fn glow_for(t: f32) -> f32 {
    if t < READY_CUTOFF {
        0.0
    } else {
        ((t - READY_CUTOFF) / (1.0 - READY_CUTOFF)).clamp(0.0, 1.0)
    }
}

/// Shake oscillates with elapsed time, gated and scaled by glow
fn shake_for(glow: f32, elapsed_ms: u64) -> f32 {
    if glow <= 0.0 {
        return 0.0;
    }
    let phase = elapsed_ms as f32 / 1000.0 * SHAKE_HZ * std::f32::consts::TAU;
    glow * phase.sin()
}

/// Tracks every in-progress hold activation plus the bounded per-id
/// lifecycle history used for transition flags and diagnostics.
#[derive(Debug)]
pub struct HoldTracker {
    active: HashMap<SmolStr, ActiveHold>,
    history: HashMap<SmolStr, VecDeque<HoldEvent>>,
    history_limit: usize,
}

impl HoldTracker {
    pub fn new(history_limit: usize) -> Self {
        Self {
            active: HashMap::new(),
            history: HashMap::new(),
            history_limit,
        }
    }

    /// Begin charging a hold definition
    pub fn start(&mut self, id: &SmolStr, now: u64, min_hold_ms: u64, continuous: bool) {
        if self.active.contains_key(id) {
            // Already charging; a second activation cannot begin until the
            // key is released
            return;
        }
        log::trace!("hold '{}' started charging", id);
        self.active.insert(
            id.clone(),
            ActiveHold {
                start: now,
                min_hold_ms,
                continuous,
                fires: 0,
            },
        );
        self.push_history(id, now, HoldEventKind::Started);
    }

    /// Evaluate all activations against the frame clock.
    ///
    /// Returns the ids whose completion fired on this tick, in no
    /// particular order; the caller re-orders by registration. At most one
    /// completion fires per activation per tick, so a stalled frame clock
    /// cannot produce a burst.
    pub fn tick(&mut self, now: u64) -> Vec<SmolStr> {
        let mut fired = Vec::new();
        for (id, hold) in self.active.iter_mut() {
            if hold.completion_due(now) {
                hold.fires += 1;
                fired.push(id.clone());
            }
        }
        for id in &fired {
            self.push_history(id, now, HoldEventKind::Completed);
        }
        fired
    }

    /// Handle the defining key's release
    pub fn release(&mut self, id: &SmolStr, now: u64) -> HoldRelease {
        let Some(hold) = self.active.remove(id) else {
            return HoldRelease::NotActive;
        };
        if hold.fires > 0 {
            return HoldRelease::AlreadyCompleted;
        }
        if hold.elapsed(now) >= hold.min_hold_ms {
            // Threshold passed but no tick observed it; complete lazily
            self.push_history(id, now, HoldEventKind::Completed);
            return HoldRelease::CompletedOnRelease;
        }
        log::trace!("hold '{}' cancelled at {}ms", id, hold.elapsed(now));
        self.push_history(id, now, HoldEventKind::Cancelled);
        HoldRelease::Cancelled
    }

    /// Force-cancel every activation (focus/visibility loss).
    ///
    /// Returns the cancelled ids. Activations that already completed and
    /// are not re-arming end silently; they have nothing left to cancel.
    pub fn cancel_all(&mut self, now: u64) -> Vec<SmolStr> {
        let mut cancelled = Vec::new();
        for (id, hold) in self.active.drain() {
            if hold.fires == 0 || hold.continuous {
                cancelled.push(id);
            }
        }
        for id in &cancelled {
            self.push_history(id, now, HoldEventKind::Cancelled);
        }
        cancelled
    }

    /// Whether any activation exists (drives the host's tick loop)
    pub fn any_active(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn is_active(&self, id: &SmolStr) -> bool {
        self.active.contains_key(id)
    }

    /// Derived view of one hold id at `now`
    pub fn snapshot(&self, id: &str, now: u64) -> HoldSnapshot {
        let mut snapshot = match self.active.get(id) {
            Some(hold) => {
                let elapsed = hold.elapsed(now);
                let progress =
                    (elapsed as f32 / hold.min_hold_ms as f32 * 100.0).clamp(0.0, 100.0);
                let remaining = hold.min_hold_ms.saturating_sub(elapsed);
                HoldSnapshot::from_progress(progress, elapsed, remaining, true, elapsed)
            }
            None => HoldSnapshot::idle(),
        };

        if let Some(history) = self.history.get(id) {
            for event in history {
                if now.saturating_sub(event.timestamp) > FLAG_WINDOW_MS {
                    continue;
                }
                match event.kind {
                    HoldEventKind::Started => snapshot.just_started = true,
                    HoldEventKind::Completed => snapshot.just_completed = true,
                    HoldEventKind::Cancelled => snapshot.just_cancelled = true,
                }
            }
            snapshot.event_history = history.iter().copied().collect();
        }
        snapshot
    }

    fn push_history(&mut self, id: &SmolStr, timestamp: u64, kind: HoldEventKind) {
        let ring = self.history.entry(id.clone()).or_default();
        if ring.len() == self.history_limit {
            ring.pop_front();
        }
        ring.push_back(HoldEvent { timestamp, kind });
    }
}
