//! Decay / recovery engine.
//!
//! One call to [`tick`] evaluates the window since the last update:
//!
//! - **Awake**: each vital loses `floor(elapsed_minutes × rate)` points, where
//!   the per-minute rate is drawn uniformly from its configured range and
//!   then scaled by cross-vital penalties evaluated on the pre-tick values:
//!
//!   | Condition        | Effect                               |
//!   |------------------|--------------------------------------|
//!   | hunger < 4000    | energy ×1.5, happiness ×1.3          |
//!   | energy < 4000    | hunger ×1.3, happiness ×1.3          |
//!   | hygiene < 4000   | happiness ×1.2                       |
//!
//! - **Asleep**: decay is suspended for every vital. Energy is recomputed as
//!   `energy_at_start + floor(seconds_slept × gain)`, so repeated ticks with the
//!   same `now` land on the same value. Once the nap is over the pet wakes.
//!
//! Age is checked before any decay: a pet past its lifespan dies and the
//! tick ends there.

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::debug;

use crate::actions;
use crate::config::{DecayConfig, RateRange, TamiConfig};
use crate::pet::{DeathCause, PetState};
use crate::types::{LOW_THRESHOLD, MAX_VITAL, Vital, Vitals};

/// Penalty applied to energy and happiness while hungry.
pub const HUNGRY_ENERGY_PENALTY: f64 = 1.5;
/// Penalty applied to happiness while hungry.
pub const HUNGRY_HAPPINESS_PENALTY: f64 = 1.3;
/// Penalty applied to hunger while tired.
pub const TIRED_HUNGER_PENALTY: f64 = 1.3;
/// Penalty applied to happiness while tired.
pub const TIRED_HAPPINESS_PENALTY: f64 = 1.3;
/// Penalty applied to happiness while dirty.
pub const DIRTY_HAPPINESS_PENALTY: f64 = 1.2;

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The pet is dead; nothing changed.
    Idle,
    /// Normal decay was applied over this many minutes.
    Decayed {
        /// Fractional minutes since the previous update.
        elapsed_minutes: f64,
    },
    /// Still napping; energy recomputed.
    Recovering {
        /// Energy after recovery.
        energy: u16,
    },
    /// The nap ended during this tick.
    WokeUp,
    /// The pet died during this tick.
    Died(DeathCause),
}

impl TickOutcome {
    /// Whether the tick changed the pet in a way worth saving.
    #[must_use]
    pub fn changed_state(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Per-minute loss rates for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayRates {
    /// Hunger points per minute.
    pub hunger: f64,
    /// Energy points per minute.
    pub energy: f64,
    /// Hygiene points per minute.
    pub hygiene: f64,
    /// Happiness points per minute.
    pub happiness: f64,
}

impl DecayRates {
    /// Rate for `vital`.
    #[must_use]
    pub fn get(&self, vital: Vital) -> f64 {
        match vital {
            Vital::Hunger => self.hunger,
            Vital::Happiness => self.happiness,
            Vital::Energy => self.energy,
            Vital::Hygiene => self.hygiene,
        }
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, range: RateRange) -> f64 {
    rng.gen_range(range.min..=range.max)
}

/// Draw the four base rates, in the order hunger, energy, hygiene, happiness.
pub fn draw_rates<R: Rng + ?Sized>(rng: &mut R, config: &DecayConfig) -> DecayRates {
    let hunger = sample(rng, config.hunger);
    let energy = sample(rng, config.energy);
    let hygiene = sample(rng, config.hygiene);
    let happiness = sample(rng, config.happiness);
    DecayRates {
        hunger,
        energy,
        hygiene,
        happiness,
    }
}

/// Scale `rates` by the cross-vital penalties for `vitals` (pre-tick values).
pub fn apply_penalties(rates: &mut DecayRates, vitals: &Vitals) {
    if vitals.hunger() < LOW_THRESHOLD {
        rates.energy *= HUNGRY_ENERGY_PENALTY;
        rates.happiness *= HUNGRY_HAPPINESS_PENALTY;
    }
    if vitals.energy() < LOW_THRESHOLD {
        rates.hunger *= TIRED_HUNGER_PENALTY;
        rates.happiness *= TIRED_HAPPINESS_PENALTY;
    }
    if vitals.hygiene() < LOW_THRESHOLD {
        rates.happiness *= DIRTY_HAPPINESS_PENALTY;
    }
}

/// Fractional minutes from `from` to `to`. Never negative.
#[must_use]
pub fn elapsed_minutes(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_milliseconds() as f64 / 60_000.0).max(0.0)
}

/// Points lost over `minutes` at `rate` points per minute.
#[must_use]
pub fn decay_loss(minutes: f64, rate: f64) -> i64 {
    (minutes * rate).floor() as i64
}

/// Energy after sleeping `slept_secs` from a nap that began at `energy_at_start`.
#[must_use]
pub fn sleep_energy(energy_at_start: u16, slept_secs: f64, gain_per_second: f64) -> u16 {
    let gain = (slept_secs.max(0.0) * gain_per_second).floor() as i64;
    let energy = (i64::from(energy_at_start) + gain).min(i64::from(MAX_VITAL));
    u16::try_from(energy).unwrap_or(MAX_VITAL)
}

/// Advance the pet to `now`.
///
/// The caller owns persistence: save the state whenever
/// [`TickOutcome::changed_state`] is true.
pub fn tick<R: Rng + ?Sized>(
    state: &mut PetState,
    now: DateTime<Utc>,
    rng: &mut R,
    config: &TamiConfig,
) -> TickOutcome {
    if !state.is_alive() {
        return TickOutcome::Idle;
    }
    if state.is_sleeping() {
        tick_asleep(state, now, config)
    } else {
        tick_awake(state, now, rng, config)
    }
}

fn tick_asleep(state: &mut PetState, now: DateTime<Utc>, config: &TamiConfig) -> TickOutcome {
    let Some(nap) = state.sleep_state().copied() else {
        return TickOutcome::Idle;
    };
    let slept_secs = (now - nap.started_at).num_milliseconds() as f64 / 1000.0;

    if slept_secs >= f64::from(config.sleep.duration_secs) {
        actions::wake_up(state, now, &config.sleep);
        return TickOutcome::WokeUp;
    }

    let energy = sleep_energy(
        nap.energy_at_start,
        slept_secs,
        config.sleep.energy_gain_per_second,
    );
    state.vitals.set(Vital::Energy, i64::from(energy));
    debug!(slept_secs, energy, "Sleep recovery");
    TickOutcome::Recovering { energy }
}

fn tick_awake<R: Rng + ?Sized>(
    state: &mut PetState,
    now: DateTime<Utc>,
    rng: &mut R,
    config: &TamiConfig,
) -> TickOutcome {
    if state.age_days(now) >= i64::from(config.lifecycle.lifespan_days) {
        state.die(DeathCause::OldAge);
        return TickOutcome::Died(DeathCause::OldAge);
    }

    let minutes = elapsed_minutes(state.last_update, now);
    let mut rates = draw_rates(rng, &config.decay);
    apply_penalties(&mut rates, &state.vitals);

    for vital in Vital::ALL {
        state.vitals.adjust(vital, -decay_loss(minutes, rates.get(vital)));
    }
    state.last_update = now;

    debug!(
        elapsed_minutes = minutes,
        vitals = %state.vitals,
        "Applied decay"
    );

    if config.lifecycle.zero_vital_is_fatal && state.check_alive() {
        return TickOutcome::Died(DeathCause::Neglect);
    }

    TickOutcome::Decayed {
        elapsed_minutes: minutes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn rates_stay_within_configured_ranges() {
        let config = DecayConfig::default();
        let mut rng = rng();
        for _ in 0..500 {
            let r = draw_rates(&mut rng, &config);
            assert!((8.0..=15.0).contains(&r.hunger));
            assert!((6.0..=12.0).contains(&r.energy));
            assert!((4.0..=10.0).contains(&r.hygiene));
            assert!((3.0..=8.0).contains(&r.happiness));
        }
    }

    #[test]
    fn penalties_compound_in_order() {
        let mut rates = DecayRates {
            hunger: 10.0,
            energy: 10.0,
            hygiene: 10.0,
            happiness: 10.0,
        };
        apply_penalties(&mut rates, &Vitals::new(1000, 8000, 1000, 1000));
        assert!((rates.energy - 15.0).abs() < 1e-9);
        assert!((rates.hunger - 13.0).abs() < 1e-9);
        assert!((rates.hygiene - 10.0).abs() < 1e-9);
        assert!((rates.happiness - 10.0 * 1.3 * 1.3 * 1.2).abs() < 1e-9);
    }

    #[test]
    fn no_penalties_above_low_threshold() {
        let base = DecayRates {
            hunger: 9.0,
            energy: 7.0,
            hygiene: 5.0,
            happiness: 4.0,
        };
        let mut rates = base;
        apply_penalties(&mut rates, &Vitals::new(4000, 0, 4000, 4000));
        assert_eq!(rates, base);
    }

    #[test]
    fn ten_minutes_of_decay_stays_in_expected_band() {
        let start = Utc::now();
        let mut pet = PetState::new(start);
        let config = TamiConfig::default();
        let now = start + Duration::minutes(10);

        let outcome = tick(&mut pet, now, &mut rng(), &config);
        assert!(matches!(outcome, TickOutcome::Decayed { .. }));

        let lost = |v: Vital| i64::from(MAX_VITAL) - i64::from(pet.vitals.get(v));
        assert!((80..=150).contains(&lost(Vital::Hunger)));
        assert!((60..=120).contains(&lost(Vital::Energy)));
        assert!((40..=100).contains(&lost(Vital::Hygiene)));
        assert!((30..=80).contains(&lost(Vital::Happiness)));
        assert_eq!(pet.last_update, now);
    }

    #[test]
    fn same_seed_same_result() {
        let start = Utc::now();
        let config = TamiConfig::default();
        let now = start + Duration::minutes(37);

        let mut a = PetState::new(start);
        let mut b = PetState::new(start);
        tick(&mut a, now, &mut StdRng::seed_from_u64(9), &config);
        tick(&mut b, now, &mut StdRng::seed_from_u64(9), &config);
        assert_eq!(a, b);
    }

    #[test]
    fn long_absence_floors_at_zero_and_kills() {
        let start = Utc::now();
        let mut pet = PetState::new(start);
        let config = TamiConfig::default();

        let outcome = tick(&mut pet, start + Duration::days(2), &mut rng(), &config);
        assert_eq!(outcome, TickOutcome::Died(DeathCause::Neglect));
        assert_eq!(pet.vitals.hunger(), 0);
        assert!(!pet.is_alive());
    }

    #[test]
    fn zero_vital_is_survivable_when_configured() {
        let start = Utc::now();
        let mut pet = PetState::new(start);
        let mut config = TamiConfig::default();
        config.lifecycle.zero_vital_is_fatal = false;

        let outcome = tick(&mut pet, start + Duration::days(2), &mut rng(), &config);
        assert!(matches!(outcome, TickOutcome::Decayed { .. }));
        assert!(pet.is_alive());
    }

    #[test]
    fn old_age_kills_before_decay() {
        let now = Utc::now();
        let mut pet = PetState::new(now - Duration::days(6));
        pet.last_update = now - Duration::minutes(1);
        let before = pet.vitals;
        let last_update = pet.last_update;

        let outcome = tick(&mut pet, now, &mut rng(), &TamiConfig::default());
        assert_eq!(outcome, TickOutcome::Died(DeathCause::OldAge));
        assert!(!pet.is_alive());
        assert_eq!(pet.vitals, before);
        assert_eq!(pet.last_update, last_update);
    }

    #[test]
    fn dead_pets_do_not_tick() {
        let start = Utc::now();
        let mut pet = PetState::new(start);
        pet.die(DeathCause::Neglect);
        let snapshot = pet.clone();

        let outcome = tick(&mut pet, start + Duration::hours(1), &mut rng(), &TamiConfig::default());
        assert_eq!(outcome, TickOutcome::Idle);
        assert_eq!(pet, snapshot);
    }

    #[test]
    fn sleep_recovery_is_anchored_and_idempotent() {
        let start = Utc::now();
        let mut pet = PetState::new(start);
        pet.vitals.set(Vital::Energy, 3000);
        pet.fall_asleep(start);
        let config = TamiConfig::default();
        let now = start + Duration::seconds(60);

        let first = tick(&mut pet, now, &mut rng(), &config);
        let second = tick(&mut pet, now, &mut rng(), &config);
        assert_eq!(first, TickOutcome::Recovering { energy: 3100 });
        assert_eq!(first, second);
        assert_eq!(pet.vitals.energy(), 3100);
    }

    #[test]
    fn sleep_freezes_other_vitals() {
        let start = Utc::now();
        let mut pet = PetState::new(start);
        pet.vitals = Vitals::new(5000, 5000, 5000, 5000);
        pet.fall_asleep(start);

        tick(&mut pet, start + Duration::seconds(120), &mut rng(), &TamiConfig::default());
        assert_eq!(pet.vitals.hunger(), 5000);
        assert_eq!(pet.vitals.happiness(), 5000);
        assert_eq!(pet.vitals.hygiene(), 5000);
    }

    #[test]
    fn nap_ends_after_duration() {
        let start = Utc::now();
        let mut pet = PetState::new(start);
        pet.vitals = Vitals::new(5000, 5000, 5000, 5000);
        pet.fall_asleep(start);

        let outcome = tick(&mut pet, start + Duration::seconds(300), &mut rng(), &TamiConfig::default());
        assert_eq!(outcome, TickOutcome::WokeUp);
        assert!(!pet.is_sleeping());
    }

    #[test]
    fn sleep_energy_caps_at_max() {
        assert_eq!(sleep_energy(7000, 299.0, 1.67), MAX_VITAL);
        assert_eq!(sleep_energy(0, 10.0, 1.67), 16);
    }

    #[test]
    fn clock_skew_counts_as_no_time() {
        let now = Utc::now();
        assert!(elapsed_minutes(now, now - Duration::minutes(5)).abs() < f64::EPSILON);
    }
}
