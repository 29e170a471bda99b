//! The pet aggregate.
//!
//! [`PetState`] holds the vitals, the terminal `alive` flag and the optional
//! sleep sub-state. The two flags that carry invariants are private:
//! `alive` can only go from `true` to `false` (via [`PetState::die`]), and the
//! sleep start time exists exactly while the pet is asleep because it lives
//! inside [`SleepState`].

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::types::{CRITICAL_THRESHOLD, LOW_THRESHOLD, Vital, Vitals};

/// Why the pet died.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    /// Reached the end of its lifespan.
    OldAge,
    /// A vital was allowed to drain to zero.
    Neglect,
}

impl fmt::Display for DeathCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OldAge => f.write_str("old age"),
            Self::Neglect => f.write_str("neglect"),
        }
    }
}

/// Sleep sub-state. Present exactly while the pet is napping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepState {
    /// When the nap started.
    pub started_at: DateTime<Utc>,
    /// Energy when the nap started; recovery is measured from here.
    pub energy_at_start: u16,
}

/// Derived display tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    /// Awake and rested enough.
    Normal,
    /// Awake but energy below half.
    Drowsy,
    /// Napping.
    Sleeping,
}

/// Derived lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Nothing urgent.
    Alive,
    /// Hunger, energy or hygiene is below the critical threshold.
    Critical,
    /// Terminal.
    Dead,
}

/// The single live pet.
#[derive(Debug, Clone, PartialEq)]
pub struct PetState {
    /// Hunger, happiness, energy, hygiene.
    pub vitals: Vitals,
    /// Carried through persistence; not derived from decay.
    pub age: u32,
    /// Timestamp of the last applied decay.
    pub last_update: DateTime<Utc>,
    alive: bool,
    sleep: Option<SleepState>,
    life_start: DateTime<Utc>,
}

impl PetState {
    /// A freshly hatched, fully satisfied pet born at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            vitals: Vitals::FULL,
            age: 0,
            last_update: now,
            alive: true,
            sleep: None,
            life_start: now,
        }
    }

    /// Rebuild a pet from a stored snapshot. Restored pets are always awake.
    #[must_use]
    pub fn restore(
        vitals: Vitals,
        age: u32,
        alive: bool,
        last_update: DateTime<Utc>,
        life_start: DateTime<Utc>,
    ) -> Self {
        Self {
            vitals,
            age,
            last_update,
            alive,
            sleep: None,
            life_start,
        }
    }

    /// Whether the pet is still alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether the pet is napping.
    #[must_use]
    pub fn is_sleeping(&self) -> bool {
        self.sleep.is_some()
    }

    /// The current nap, if any.
    #[must_use]
    pub fn sleep_state(&self) -> Option<&SleepState> {
        self.sleep.as_ref()
    }

    /// Birth timestamp.
    #[must_use]
    pub fn life_start(&self) -> DateTime<Utc> {
        self.life_start
    }

    /// Whole days lived as of `now`.
    #[must_use]
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.life_start).num_days()
    }

    /// Kill the pet. Returns `true` if this call caused the transition.
    pub fn die(&mut self, cause: DeathCause) -> bool {
        if !self.alive {
            return false;
        }
        self.alive = false;
        self.sleep = None;
        info!(%cause, vitals = %self.vitals, "Pet died");
        true
    }

    /// Zero-floor check: a pet with any vital at zero dies of neglect.
    ///
    /// Returns `true` if the pet died during this call.
    pub fn check_alive(&mut self) -> bool {
        if self.alive && self.vitals.any_depleted() {
            return self.die(DeathCause::Neglect);
        }
        false
    }

    pub(crate) fn fall_asleep(&mut self, now: DateTime<Utc>) {
        self.sleep = Some(SleepState {
            started_at: now,
            energy_at_start: self.vitals.energy(),
        });
    }

    pub(crate) fn wake(&mut self) -> Option<SleepState> {
        self.sleep.take()
    }

    /// Seconds left in the current nap (negative once overdue), or `None` when awake.
    #[must_use]
    pub fn sleep_remaining_secs(&self, now: DateTime<Utc>, duration_secs: u32) -> Option<i64> {
        self.sleep.map(|s| {
            (i64::from(duration_secs) * 1000 - (now - s.started_at).num_milliseconds()) / 1000
        })
    }

    /// Display tag recomputed from current state.
    #[must_use]
    pub fn pose(&self) -> Pose {
        if self.is_sleeping() {
            Pose::Sleeping
        } else if self.vitals.energy() < LOW_THRESHOLD {
            Pose::Drowsy
        } else {
            Pose::Normal
        }
    }

    /// Lifecycle stage recomputed from current state.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        if !self.alive {
            return Lifecycle::Dead;
        }
        let critical = [Vital::Hunger, Vital::Energy, Vital::Hygiene]
            .iter()
            .any(|&v| self.vitals.get(v) < CRITICAL_THRESHOLD);
        if critical {
            Lifecycle::Critical
        } else {
            Lifecycle::Alive
        }
    }
}
