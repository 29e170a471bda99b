//! The owned, lock-serialized live pet.
//!
//! A [`PetSession`] holds the pet, its store and its RNG behind one mutex.
//! Every operation that reads and then writes the pet runs entirely under
//! that lock, so a periodic tick can never interleave with a user action.
//! Mutations are saved before the lock is released.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::actions::{self, Refusal, SleepOutcome};
use crate::clock::Clock;
use crate::config::TamiConfig;
use crate::decay::{self, TickOutcome};
use crate::error::Result;
use crate::memory::{self, MemoryCategory, MemoryEntry};
use crate::persistence::PetStore;
use crate::pet::PetState;
use crate::types::Vitals;

/// Everything the chat layer may look at, copied out under the lock.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSnapshot {
    /// The pet's name.
    pub pet_name: String,
    /// Vitals at capture time.
    pub vitals: Vitals,
    /// Whether the pet was alive at capture time.
    pub alive: bool,
    /// All stored memories.
    pub memories: Vec<MemoryEntry>,
}

struct Inner {
    state: PetState,
    store: PetStore,
    rng: StdRng,
}

/// The single live pet plus its storage.
pub struct PetSession {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
    config: TamiConfig,
}

impl std::fmt::Debug for PetSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PetSession")
            .field("pet_name", &self.config.general.pet_name)
            .finish_non_exhaustive()
    }
}

impl PetSession {
    /// Open the configured store and load (or hatch) the pet.
    ///
    /// An unopenable store degrades to an in-memory one; an unreadable
    /// snapshot degrades to a fresh pet. Both are logged, neither is fatal.
    ///
    /// # Errors
    ///
    /// Fails only if even the in-memory fallback cannot be created or the
    /// fresh pet cannot be saved.
    pub fn open(config: TamiConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let store = match PetStore::open(&config.persistence.path, &config.persistence) {
            Ok(store) => store,
            Err(e) => {
                warn!(
                    path = %config.persistence.path,
                    error = %e,
                    "Pet store unavailable, progress will not be saved"
                );
                PetStore::open_in_memory(&config.persistence)?
            }
        };
        let rng = match config.driver.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_store(config, clock, store, rng)
    }

    /// Build a session around an already opened store.
    ///
    /// # Errors
    ///
    /// Returns an error if a freshly hatched pet cannot be saved.
    pub fn with_store(
        config: TamiConfig,
        clock: Arc<dyn Clock>,
        store: PetStore,
        rng: StdRng,
    ) -> Result<Self> {
        let now = clock.now();
        let state = match load_checked(&store, now) {
            Some(state) => state,
            None => {
                let state = PetState::new(now);
                store.save_pet(&state)?;
                info!(name = %config.general.pet_name, "A new pet hatched");
                state
            }
        };

        info!(
            name = %config.general.pet_name,
            alive = state.is_alive(),
            vitals = %state.vitals,
            "Pet session opened"
        );

        Ok(Self {
            inner: Mutex::new(Inner { state, store, rng }),
            clock,
            config,
        })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &TamiConfig {
        &self.config
    }

    /// Current time according to the session clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Run one decay/recovery step and save if anything changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub fn tick(&self) -> Result<TickOutcome> {
        let now = self.clock.now();
        let mut guard = self.inner.lock();
        let Inner { state, store, rng } = &mut *guard;
        let outcome = decay::tick(state, now, rng, &self.config);
        if outcome.changed_state() {
            store.save_pet(state)?;
        }
        Ok(outcome)
    }

    /// Feed the pet. `Some(text)` is the refusal; `None` means it ate.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub fn feed(&self) -> Result<Option<String>> {
        self.act(actions::feed)
    }

    /// Play with the pet. `Some(text)` is the refusal.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub fn play(&self) -> Result<Option<String>> {
        self.act(actions::play)
    }

    /// Bathe the pet. `Some(text)` is the refusal.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub fn clean(&self) -> Result<Option<String>> {
        self.act(actions::clean)
    }

    /// Toggle sleep. Always has something to say.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub fn sleep(&self) -> Result<Option<String>> {
        Ok(Some(self.sleep_outcome()?.to_string()))
    }

    /// Like [`PetSession::sleep`] but returns the typed outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub fn sleep_outcome(&self) -> Result<SleepOutcome> {
        let now = self.clock.now();
        let mut guard = self.inner.lock();
        let outcome = actions::sleep(&mut guard.state, now, &self.config.sleep);
        if outcome.changed_state() {
            guard.store.save_pet(&guard.state)?;
        }
        Ok(outcome)
    }

    fn act(
        &self,
        action: fn(&mut PetState) -> std::result::Result<(), Refusal>,
    ) -> Result<Option<String>> {
        let mut guard = self.inner.lock();
        match action(&mut guard.state) {
            Ok(()) => {
                guard.store.save_pet(&guard.state)?;
                Ok(None)
            }
            Err(refusal) => Ok(Some(refusal.to_string())),
        }
    }

    /// Remember `content` under `category` and reward the pet for sharing.
    ///
    /// # Errors
    ///
    /// Returns `TamiError::InvalidMemory` for empty or oversized content, or
    /// a database error if the write fails.
    pub fn add_memory(&self, category: MemoryCategory, content: &str) -> Result<()> {
        let content = memory::validate_content(content, &self.config.memory)?;
        let now = self.clock.now();
        let mut guard = self.inner.lock();
        guard.store.upsert_memory(category, &content, now)?;
        actions::reward_memory(&mut guard.state);
        guard.store.save_pet(&guard.state)?;
        Ok(())
    }

    /// Count a chat message towards happiness. Blank messages and messages
    /// to a dead pet are ignored and nothing is saved.
    ///
    /// Returns whether the message counted.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub fn record_chat(&self, message: &str) -> Result<bool> {
        if message.trim().is_empty() {
            return Ok(false);
        }
        let mut guard = self.inner.lock();
        if !guard.state.is_alive() {
            return Ok(false);
        }
        actions::reward_chat(&mut guard.state);
        guard.store.save_pet(&guard.state)?;
        Ok(true)
    }

    /// A copy of the pet as it is right now.
    #[must_use]
    pub fn snapshot(&self) -> PetState {
        self.inner.lock().state.clone()
    }

    /// Copy out what the chat layer needs.
    ///
    /// # Errors
    ///
    /// Returns a database error if the memories cannot be read.
    pub fn chat_snapshot(&self) -> Result<ChatSnapshot> {
        let guard = self.inner.lock();
        Ok(ChatSnapshot {
            pet_name: self.config.general.pet_name.clone(),
            vitals: guard.state.vitals,
            alive: guard.state.is_alive(),
            memories: guard.store.memories()?,
        })
    }

    /// Stored memories, optionally narrowed to one category.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn memories(&self, category: Option<MemoryCategory>) -> Result<Vec<MemoryEntry>> {
        let guard = self.inner.lock();
        match category {
            Some(category) => guard.store.memories_by_category(category),
            None => guard.store.memories(),
        }
    }

    /// Save the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub fn save(&self) -> Result<()> {
        let guard = self.inner.lock();
        guard.store.save_pet(&guard.state)
    }

    /// Write a rotating backup of the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup cannot be written.
    pub fn backup(&self) -> Result<()> {
        self.inner.lock().store.create_rotating_backup()
    }

    /// How long the driver should wait before the next tick.
    #[must_use]
    pub fn next_tick_interval(&self) -> Duration {
        let secs = if self.inner.lock().state.is_sleeping() {
            self.config.driver.sleeping_interval_secs
        } else {
            self.config.driver.awake_interval_secs
        };
        Duration::from_secs(secs.max(1))
    }
}

fn load_checked(store: &PetStore, now: DateTime<Utc>) -> Option<PetState> {
    match store.integrity_check() {
        Ok(true) => {}
        Ok(false) => {
            warn!("Pet store failed its integrity check, starting fresh");
            return None;
        }
        Err(e) => {
            warn!(error = %e, "Could not check pet store integrity, starting fresh");
            return None;
        }
    }
    match store.load_pet(now) {
        Ok(state) => state,
        Err(e) => {
            warn!(error = %e, "Saved pet is unreadable, starting fresh");
            None
        }
    }
}
