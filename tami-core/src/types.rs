//! Core type definitions: the four vitals and their thresholds.

use std::fmt;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Upper bound of every vital. 8000 means fully satisfied.
pub const MAX_VITAL: u16 = 8000;

/// 25%: below this several actions are refused.
pub const CRITICAL_THRESHOLD: u16 = 2000;

/// 50%: below this, decay penalties kick in.
pub const LOW_THRESHOLD: u16 = 4000;

/// 75%: waking up above this grants a happiness bonus.
pub const GOOD_THRESHOLD: u16 = 6000;

/// ~99%: at or above this a vital counts as "full" for action guards.
pub const FULL_THRESHOLD: u16 = 7900;

fn clamp_vital(value: i64) -> u16 {
    u16::try_from(value.clamp(0, i64::from(MAX_VITAL))).unwrap_or(MAX_VITAL)
}

// ---------------------------------------------------------------------------
// Vital
// ---------------------------------------------------------------------------

/// One of the pet's four needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vital {
    /// Satiety. Low means hungry.
    Hunger,
    /// Mood.
    Happiness,
    /// Rest. Low means tired.
    Energy,
    /// Cleanliness.
    Hygiene,
}

impl Vital {
    /// All vitals in their canonical check order.
    pub const ALL: [Vital; 4] = [Vital::Hunger, Vital::Happiness, Vital::Energy, Vital::Hygiene];

    /// Lower-case display label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Hunger => "hunger",
            Self::Happiness => "happiness",
            Self::Energy => "energy",
            Self::Hygiene => "hygiene",
        }
    }
}

impl fmt::Display for Vital {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Vitals
// ---------------------------------------------------------------------------

/// The four-resource vector. Every constructor and setter clamps to
/// `[0, MAX_VITAL]`, so an out-of-range value can never be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vitals {
    hunger: u16,
    happiness: u16,
    energy: u16,
    hygiene: u16,
}

impl Vitals {
    /// A fully satisfied pet.
    pub const FULL: Self = Self {
        hunger: MAX_VITAL,
        happiness: MAX_VITAL,
        energy: MAX_VITAL,
        hygiene: MAX_VITAL,
    };

    /// Build a vitals vector, clamping each value.
    #[must_use]
    pub fn new(hunger: i64, happiness: i64, energy: i64, hygiene: i64) -> Self {
        Self {
            hunger: clamp_vital(hunger),
            happiness: clamp_vital(happiness),
            energy: clamp_vital(energy),
            hygiene: clamp_vital(hygiene),
        }
    }

    /// Current value of `vital`.
    #[must_use]
    pub fn get(&self, vital: Vital) -> u16 {
        match vital {
            Vital::Hunger => self.hunger,
            Vital::Happiness => self.happiness,
            Vital::Energy => self.energy,
            Vital::Hygiene => self.hygiene,
        }
    }

    /// Set `vital`, clamped to `[0, MAX_VITAL]`.
    pub fn set(&mut self, vital: Vital, value: i64) {
        let slot = match vital {
            Vital::Hunger => &mut self.hunger,
            Vital::Happiness => &mut self.happiness,
            Vital::Energy => &mut self.energy,
            Vital::Hygiene => &mut self.hygiene,
        };
        *slot = clamp_vital(value);
    }

    /// Add `delta` (may be negative) to `vital`, clamping the result.
    pub fn adjust(&mut self, vital: Vital, delta: i64) {
        self.set(vital, i64::from(self.get(vital)) + delta);
    }

    /// Hunger (satiety) value.
    #[must_use]
    pub fn hunger(&self) -> u16 {
        self.hunger
    }

    /// Happiness value.
    #[must_use]
    pub fn happiness(&self) -> u16 {
        self.happiness
    }

    /// Energy value.
    #[must_use]
    pub fn energy(&self) -> u16 {
        self.energy
    }

    /// Hygiene value.
    #[must_use]
    pub fn hygiene(&self) -> u16 {
        self.hygiene
    }

    /// Integer percentage of `MAX_VITAL` (0–100).
    #[must_use]
    pub fn percent(&self, vital: Vital) -> u8 {
        let pct = u32::from(self.get(vital)) * 100 / u32::from(MAX_VITAL);
        u8::try_from(pct).unwrap_or(100)
    }

    /// Whether any vital has hit zero.
    #[must_use]
    pub fn any_depleted(&self) -> bool {
        Vital::ALL.iter().any(|&v| self.get(v) == 0)
    }

    /// `(vital, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Vital, u16)> + '_ {
        Vital::ALL.iter().map(move |&v| (v, self.get(v)))
    }
}

impl Default for Vitals {
    fn default() -> Self {
        Self::FULL
    }
}

impl fmt::Display for Vitals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hunger {}% | happiness {}% | energy {}% | hygiene {}%",
            self.percent(Vital::Hunger),
            self.percent(Vital::Happiness),
            self.percent(Vital::Energy),
            self.percent(Vital::Hygiene),
        )
    }
}
