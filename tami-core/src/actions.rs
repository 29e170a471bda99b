//! Action controller.
//!
//! Care actions share one guard shape: each guard is checked in order against
//! the pre-action state, the first failing guard becomes a [`Refusal`], and
//! otherwise a fixed effect vector is applied in one step.
//!
//! | Action | Guards (in order)                                   | Effect                                      |
//! |--------|-----------------------------------------------------|---------------------------------------------|
//! | feed   | dead, asleep, energy < 2000, hunger ≥ 7900          | hunger +2000, energy −200, hygiene −500, happiness +300 |
//! | play   | dead, asleep, energy < 2000, hunger < 2000, happiness ≥ 7900 | happiness +1500, energy −1000, hunger −800, hygiene −500 |
//! | clean  | dead, asleep, energy < 2000, hygiene ≥ 7900         | hygiene +3000, energy −500, happiness +300  |
//!
//! [`sleep`] toggles the nap sub-state and always has something to say.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::config::SleepConfig;
use crate::pet::PetState;
use crate::types::{CRITICAL_THRESHOLD, FULL_THRESHOLD, GOOD_THRESHOLD, Vital};

/// Happiness granted for sharing a memory.
pub const MEMORY_HAPPINESS_REWARD: i64 = 500;

/// Happiness granted for chatting.
pub const CHAT_HAPPINESS_REWARD: i64 = 100;

/// Why an action was refused. `Display` is the pet's own words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Refusal {
    /// The pet is dead.
    #[error("...")]
    Dead,
    /// Feeding a sleeping pet.
    #[error("I'm sleeping... don't wake me up to eat!")]
    AsleepForFood,
    /// Playing with a sleeping pet.
    #[error("I'm sleeping... don't wake me up to play!")]
    AsleepForPlay,
    /// Bathing a sleeping pet.
    #[error("I'm sleeping... don't wake me up for a bath!")]
    AsleepForBath,
    /// Energy too low to eat.
    #[error("I'm too tired... I need to sleep first")]
    TooTiredToEat,
    /// Energy too low to play.
    #[error("I'm too tired to play...")]
    TooTiredToPlay,
    /// Energy too low to bathe.
    #[error("I'm too tired for a bath...")]
    TooTiredToBathe,
    /// Hunger too low to play.
    #[error("I'm too hungry to play...")]
    TooHungryToPlay,
    /// Hunger too low to sleep.
    #[error("I can't sleep... I'm too hungry")]
    TooHungryToSleep,
    /// Hunger already full.
    #[error("I'm full! I can't eat any more")]
    Full,
    /// Happiness already full.
    #[error("I'm already really happy! I need to rest a bit")]
    AlreadyHappy,
    /// Hygiene already full.
    #[error("I'm already squeaky clean! I don't need another bath")]
    AlreadyClean,
    /// Energy already full.
    #[error("I'm not sleepy, I'm full of energy!")]
    NotSleepy,
}

/// A fixed change to the four vitals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effect {
    /// Hunger delta.
    pub hunger: i64,
    /// Happiness delta.
    pub happiness: i64,
    /// Energy delta.
    pub energy: i64,
    /// Hygiene delta.
    pub hygiene: i64,
}

impl Effect {
    /// Apply every delta, clamping each vital.
    pub fn apply(&self, state: &mut PetState) {
        state.vitals.adjust(Vital::Hunger, self.hunger);
        state.vitals.adjust(Vital::Happiness, self.happiness);
        state.vitals.adjust(Vital::Energy, self.energy);
        state.vitals.adjust(Vital::Hygiene, self.hygiene);
    }
}

/// Effect of a successful feed.
pub const FEED: Effect = Effect {
    hunger: 2000,
    happiness: 300,
    energy: -200,
    hygiene: -500,
};

/// Effect of a successful play session.
pub const PLAY: Effect = Effect {
    hunger: -800,
    happiness: 1500,
    energy: -1000,
    hygiene: -500,
};

/// Effect of a successful bath.
pub const CLEAN: Effect = Effect {
    hunger: 0,
    happiness: 300,
    energy: -500,
    hygiene: 3000,
};

fn ensure(refused: bool, refusal: Refusal) -> Result<(), Refusal> {
    if refused { Err(refusal) } else { Ok(()) }
}

/// Feed the pet.
///
/// # Errors
/// Returns the first failing guard as a [`Refusal`]; the state is untouched.
pub fn feed(state: &mut PetState) -> Result<(), Refusal> {
    let v = state.vitals;
    ensure(!state.is_alive(), Refusal::Dead)?;
    ensure(state.is_sleeping(), Refusal::AsleepForFood)?;
    ensure(v.energy() < CRITICAL_THRESHOLD, Refusal::TooTiredToEat)?;
    ensure(v.hunger() >= FULL_THRESHOLD, Refusal::Full)?;
    FEED.apply(state);
    Ok(())
}

/// Play with the pet.
///
/// # Errors
/// Returns the first failing guard as a [`Refusal`]; the state is untouched.
pub fn play(state: &mut PetState) -> Result<(), Refusal> {
    let v = state.vitals;
    ensure(!state.is_alive(), Refusal::Dead)?;
    ensure(state.is_sleeping(), Refusal::AsleepForPlay)?;
    ensure(v.energy() < CRITICAL_THRESHOLD, Refusal::TooTiredToPlay)?;
    ensure(v.hunger() < CRITICAL_THRESHOLD, Refusal::TooHungryToPlay)?;
    ensure(v.happiness() >= FULL_THRESHOLD, Refusal::AlreadyHappy)?;
    PLAY.apply(state);
    Ok(())
}

/// Give the pet a bath.
///
/// # Errors
/// Returns the first failing guard as a [`Refusal`]; the state is untouched.
pub fn clean(state: &mut PetState) -> Result<(), Refusal> {
    let v = state.vitals;
    ensure(!state.is_alive(), Refusal::Dead)?;
    ensure(state.is_sleeping(), Refusal::AsleepForBath)?;
    ensure(v.energy() < CRITICAL_THRESHOLD, Refusal::TooTiredToBathe)?;
    ensure(v.hygiene() >= FULL_THRESHOLD, Refusal::AlreadyClean)?;
    CLEAN.apply(state);
    Ok(())
}

/// Result of the sleep toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    /// The pet started a nap.
    FellAsleep {
        /// Nap length.
        duration_secs: u32,
    },
    /// Already napping; this much time is left.
    StillSleeping {
        /// Whole seconds until waking.
        remaining_secs: i64,
    },
    /// The nap was over, so the pet woke up.
    WokeUp,
    /// The pet would not go to sleep.
    Refused(Refusal),
}

impl SleepOutcome {
    /// Whether the pet changed between awake and asleep.
    #[must_use]
    pub fn changed_state(&self) -> bool {
        matches!(self, Self::FellAsleep { .. } | Self::WokeUp)
    }
}

impl fmt::Display for SleepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FellAsleep { duration_secs } if duration_secs % 60 == 0 => {
                write!(f, "I'm going to sleep for {} minutes...", duration_secs / 60)
            }
            Self::FellAsleep { duration_secs } => {
                write!(f, "I'm going to sleep for {duration_secs} seconds...")
            }
            Self::StillSleeping { remaining_secs } => {
                write!(f, "I'm sleeping... {remaining_secs} seconds until I wake up")
            }
            Self::WokeUp => f.write_str("I just woke up! I feel full of energy"),
            Self::Refused(refusal) => write!(f, "{refusal}"),
        }
    }
}

/// Toggle sleep.
///
/// Awake: start a nap if energy is not full and the pet is not starving.
/// Asleep: report the time left, or wake up if the nap is over.
pub fn sleep(state: &mut PetState, now: DateTime<Utc>, config: &SleepConfig) -> SleepOutcome {
    if !state.is_alive() {
        return SleepOutcome::Refused(Refusal::Dead);
    }

    if let Some(nap) = state.sleep_state() {
        let remaining_ms =
            i64::from(config.duration_secs) * 1000 - (now - nap.started_at).num_milliseconds();
        if remaining_ms > 0 {
            return SleepOutcome::StillSleeping {
                remaining_secs: remaining_ms / 1000,
            };
        }
        wake_up(state, now, config);
        return SleepOutcome::WokeUp;
    }

    let v = state.vitals;
    if v.energy() >= FULL_THRESHOLD {
        return SleepOutcome::Refused(Refusal::NotSleepy);
    }
    if v.hunger() < CRITICAL_THRESHOLD {
        return SleepOutcome::Refused(Refusal::TooHungryToSleep);
    }

    state.fall_asleep(now);
    info!(energy = v.energy(), "Pet fell asleep");
    SleepOutcome::FellAsleep {
        duration_secs: config.duration_secs,
    }
}

/// End the current nap.
///
/// Decay resumes from `now`, so the nap itself costs nothing. Waking with
/// energy above the good threshold grants a happiness bonus.
///
/// Returns `true` if the bonus was granted.
pub fn wake_up(state: &mut PetState, now: DateTime<Utc>, config: &SleepConfig) -> bool {
    if state.wake().is_none() {
        return false;
    }
    state.last_update = now;
    let rested = state.vitals.energy() > GOOD_THRESHOLD;
    if rested {
        state
            .vitals
            .adjust(Vital::Happiness, i64::from(config.wake_happiness_bonus));
    }
    info!(energy = state.vitals.energy(), rested, "Pet woke up");
    rested
}

/// Grant the memory-sharing reward. Dead pets gain nothing.
pub fn reward_memory(state: &mut PetState) {
    if state.is_alive() {
        state.vitals.adjust(Vital::Happiness, MEMORY_HAPPINESS_REWARD);
    }
}

/// Grant the chat reward. Dead pets gain nothing.
pub fn reward_chat(state: &mut PetState) {
    if state.is_alive() {
        state.vitals.adjust(Vital::Happiness, CHAT_HAPPINESS_REWARD);
    }
}
