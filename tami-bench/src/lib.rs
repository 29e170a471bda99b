//! Shared fixtures for the Tami benchmarks.

use chrono::{DateTime, TimeZone, Utc};
use tami_core::{MemoryCategory, MemoryEntry, PetState, Vitals};

/// A fixed reference instant.
#[must_use]
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// A pet with every vital at `value`, born and last updated at [`epoch`].
#[must_use]
pub fn pet_at(value: i64) -> PetState {
    PetState::restore(Vitals::new(value, value, value, value), 0, true, epoch(), epoch())
}

/// `n` memories cycling through the categories.
#[must_use]
pub fn memories(n: usize) -> Vec<MemoryEntry> {
    (0..n)
        .map(|i| MemoryEntry {
            category: MemoryCategory::ALL[i % MemoryCategory::ALL.len()],
            content: format!("Fact number {i} about the owner's favourite things"),
            created_at: epoch(),
        })
        .collect()
}
