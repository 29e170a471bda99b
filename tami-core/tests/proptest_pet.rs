//! Property tests for the pet engine.
//!
//! Vitals stay inside `[0, 8000]` under any sequence of ticks and actions,
//! death is permanent, and a fixed seed always produces the same pet.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use tami_core::actions;
use tami_core::config::TamiConfig;
use tami_core::decay;
use tami_core::{MAX_VITAL, PetState, Vital, Vitals};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).single().expect("valid date")
}

#[derive(Debug, Clone)]
enum Step {
    Wait(i64),
    Feed,
    Play,
    Clean,
    Sleep,
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (1i64..7_200).prop_map(Step::Wait),
        Just(Step::Feed),
        Just(Step::Play),
        Just(Step::Clean),
        Just(Step::Sleep),
    ]
}

fn arb_vitals() -> impl Strategy<Value = Vitals> {
    (0i64..=8000, 0i64..=8000, 0i64..=8000, 0i64..=8000)
        .prop_map(|(h, p, e, y)| Vitals::new(h, p, e, y))
}

fn in_range(v: &Vitals) -> bool {
    Vital::ALL.iter().all(|&vital| v.get(vital) <= MAX_VITAL)
}

proptest! {
    #[test]
    fn construction_clamps(h in -20_000i64..20_000, p in -20_000i64..20_000) {
        let v = Vitals::new(h, p, h, p);
        prop_assert!(in_range(&v));
        prop_assert_eq!(i64::from(v.hunger()), h.clamp(0, 8000));
        prop_assert_eq!(i64::from(v.happiness()), p.clamp(0, 8000));
    }

    #[test]
    fn vitals_stay_in_range_and_death_is_final(
        start in arb_vitals(),
        steps in prop::collection::vec(arb_step(), 1..60),
        seed in any::<u64>(),
    ) {
        let config = TamiConfig::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut now = t0();
        let mut pet = PetState::restore(start, 0, true, now, now);
        let mut was_dead = false;

        for step in steps {
            match step {
                Step::Wait(secs) => {
                    now += Duration::seconds(secs);
                    decay::tick(&mut pet, now, &mut rng, &config);
                }
                Step::Feed => { let _ = actions::feed(&mut pet); }
                Step::Play => { let _ = actions::play(&mut pet); }
                Step::Clean => { let _ = actions::clean(&mut pet); }
                Step::Sleep => { actions::sleep(&mut pet, now, &config.sleep); }
            }
            prop_assert!(in_range(&pet.vitals));
            if was_dead {
                prop_assert!(!pet.is_alive());
            }
            was_dead = !pet.is_alive();
        }
    }

    #[test]
    fn awake_decay_never_raises_a_vital(start in arb_vitals(), minutes in 0i64..600, seed in any::<u64>()) {
        let config = TamiConfig::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pet = PetState::restore(start, 0, true, t0(), t0());
        decay::tick(&mut pet, t0() + Duration::minutes(minutes), &mut rng, &config);
        for vital in Vital::ALL {
            prop_assert!(pet.vitals.get(vital) <= start.get(vital));
        }
    }

    #[test]
    fn refused_actions_change_nothing(start in arb_vitals()) {
        let mut pet = PetState::restore(start, 0, true, t0(), t0());
        let before = pet.clone();
        if actions::feed(&mut pet).is_err() {
            prop_assert_eq!(&pet, &before);
        }
        let mut pet = before.clone();
        if actions::play(&mut pet).is_err() {
            prop_assert_eq!(&pet, &before);
        }
        let mut pet = before.clone();
        if actions::clean(&mut pet).is_err() {
            prop_assert_eq!(&pet, &before);
        }
    }

    #[test]
    fn same_seed_same_pet(start in arb_vitals(), seed in any::<u64>(), minutes in 1i64..300) {
        let config = TamiConfig::default();
        let run = || {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut pet = PetState::restore(start, 0, true, t0(), t0());
            decay::tick(&mut pet, t0() + Duration::minutes(minutes), &mut rng, &config);
            decay::tick(&mut pet, t0() + Duration::minutes(minutes * 2), &mut rng, &config);
            pet
        };
        prop_assert_eq!(run(), run());
    }
}
