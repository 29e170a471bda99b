//! Tami engine benchmarks.
//!
//! Targets:
//!   tick_awake_decay ........... < 2μs
//!   tick_asleep_recovery ....... < 1μs
//!   care_actions_cycle ......... < 1μs
//!   relevance_filter_100 ....... < 50μs
//!   snapshot_save_in_memory .... < 100μs

use chrono::Duration;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use tami_bench::{epoch, memories, pet_at};
use tami_core::config::{PersistenceConfig, TamiConfig};
use tami_core::memory::relevant_memories;
use tami_core::persistence::PetStore;
use tami_core::{actions, advisory, decay};

fn bench_tick_awake(c: &mut Criterion) {
    let config = TamiConfig::default();
    let mut rng = StdRng::seed_from_u64(7);
    let now = epoch() + Duration::minutes(5);
    c.bench_function("tick_awake_decay", |b| {
        b.iter(|| {
            let mut pet = pet_at(6000);
            black_box(decay::tick(&mut pet, black_box(now), &mut rng, &config));
        });
    });
}

fn bench_tick_asleep(c: &mut Criterion) {
    let config = TamiConfig::default();
    let mut rng = StdRng::seed_from_u64(7);
    let mut napping = pet_at(5000);
    actions::sleep(&mut napping, epoch(), &config.sleep);
    let now = epoch() + Duration::seconds(120);
    c.bench_function("tick_asleep_recovery", |b| {
        b.iter(|| {
            let mut pet = napping.clone();
            black_box(decay::tick(&mut pet, black_box(now), &mut rng, &config));
        });
    });
}

fn bench_actions(c: &mut Criterion) {
    c.bench_function("care_actions_cycle", |b| {
        b.iter(|| {
            let mut pet = pet_at(5000);
            let _ = black_box(actions::feed(&mut pet));
            let _ = black_box(actions::play(&mut pet));
            let _ = black_box(actions::clean(&mut pet));
            black_box(advisory::need_phrases(&pet.vitals));
        });
    });
}

fn bench_relevance(c: &mut Criterion) {
    let entries = memories(100);
    c.bench_function("relevance_filter_100", |b| {
        b.iter(|| {
            black_box(relevant_memories(
                black_box(&entries),
                black_box("What is my favourite food? Tell me about my family"),
            ));
        });
    });
}

fn bench_save(c: &mut Criterion) {
    let config = PersistenceConfig {
        wal_mode: false,
        ..PersistenceConfig::default()
    };
    let Ok(store) = PetStore::open_in_memory(&config) else {
        return;
    };
    let pet = pet_at(4000);
    c.bench_function("snapshot_save_in_memory", |b| {
        b.iter(|| {
            let _ = black_box(store.save_pet(black_box(&pet)));
        });
    });
}

criterion_group!(
    benches,
    bench_tick_awake,
    bench_tick_asleep,
    bench_actions,
    bench_relevance,
    bench_save,
);
criterion_main!(benches);
