//! # Tami Core Library
//!
//! The pet engine behind Tami: a single virtual pet whose four vitals
//! (hunger, happiness, energy, hygiene) drain over wall-clock time and are
//! restored by care actions.
//!
//! - [`pet`]: the [`PetState`] aggregate, its derived pose and lifecycle
//! - [`decay`]: elapsed-time decay and sleep recovery (`tick`)
//! - [`actions`]: guarded care actions (feed, play, clean, sleep)
//! - [`advisory`]: low-vital need phrases handed to the chat layer
//! - [`memory`]: the small category-keyed fact store
//! - [`persistence`]: SQLite snapshot + memory storage
//! - [`session`]: the owned, lock-serialized live pet
//!
//! ## Timing model
//!
//! Decay is computed from elapsed time, not from tick counts, so the engine
//! behaves the same whether it is polled every second or every minute. All
//! time flows through a [`Clock`] and all randomness through an injected
//! [`rand::Rng`], which keeps every rule reproducible in tests.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod actions;
pub mod advisory;
pub mod clock;
pub mod config;
pub mod decay;
pub mod error;
pub mod memory;
pub mod persistence;
pub mod pet;
pub mod session;
pub mod types;

pub use actions::{Refusal, SleepOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TamiConfig;
pub use error::TamiError;
pub use memory::{MemoryCategory, MemoryEntry};
pub use pet::{Lifecycle, PetState, Pose};
pub use session::{ChatSnapshot, PetSession};
pub use types::*;
