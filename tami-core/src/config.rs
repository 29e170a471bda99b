//! Configuration for Tami.
//!
//! Maps directly to `tami.toml`. Every field has a serde default, so an empty
//! file (or no file at all) yields the stock pet.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TamiError};

/// Top-level Tami configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TamiConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Per-minute decay rates.
    #[serde(default)]
    pub decay: DecayConfig,
    /// Nap length and recovery curve.
    #[serde(default)]
    pub sleep: SleepConfig,
    /// Lifespan and death rules.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    /// Memory store limits.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Chat delegate settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Persistence / save settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Periodic driver settings.
    #[serde(default)]
    pub driver: DriverConfig,
}

impl TamiConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `TamiError::Config` if the TOML is invalid or a value is out of range.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| TamiError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_file_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject values the engine cannot work with.
    ///
    /// # Errors
    /// Returns `TamiError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        for (name, range) in [
            ("decay.hunger", &self.decay.hunger),
            ("decay.energy", &self.decay.energy),
            ("decay.hygiene", &self.decay.hygiene),
            ("decay.happiness", &self.decay.happiness),
        ] {
            if !(range.min >= 0.0 && range.min <= range.max) {
                return Err(TamiError::Config(format!(
                    "{name}: expected 0 <= min <= max, got [{}, {}]",
                    range.min, range.max
                )));
            }
        }
        if self.sleep.duration_secs == 0 {
            return Err(TamiError::Config("sleep.duration_secs must be > 0".into()));
        }
        if self.sleep.energy_gain_per_second < 0.0 {
            return Err(TamiError::Config(
                "sleep.energy_gain_per_second must be >= 0".into(),
            ));
        }
        if self.driver.awake_interval_secs == 0 || self.driver.sleeping_interval_secs == 0 {
            return Err(TamiError::Config("driver intervals must be > 0".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// The pet's name, used in prompts and the status line.
    #[serde(default = "default_pet_name")]
    pub pet_name: String,
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            pet_name: default_pet_name(),
            log_level: default_log_level(),
        }
    }
}

/// An inclusive range of points lost per elapsed minute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateRange {
    /// Lowest rate.
    pub min: f64,
    /// Highest rate.
    pub max: f64,
}

impl RateRange {
    /// Build a range.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Random per-minute decay ranges, one per vital.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecayConfig {
    /// Hunger drains fastest.
    #[serde(default = "default_hunger_rate")]
    pub hunger: RateRange,
    /// Slower than hunger.
    #[serde(default = "default_energy_rate")]
    pub energy: RateRange,
    /// Slower than energy.
    #[serde(default = "default_hygiene_rate")]
    pub hygiene: RateRange,
    /// Slowest of all.
    #[serde(default = "default_happiness_rate")]
    pub happiness: RateRange,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            hunger: default_hunger_rate(),
            energy: default_energy_rate(),
            hygiene: default_hygiene_rate(),
            happiness: default_happiness_rate(),
        }
    }
}

/// Nap settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepConfig {
    /// Length of a nap in seconds.
    #[serde(default = "default_300")]
    pub duration_secs: u32,
    /// Energy regained per second asleep (1.67 fills the bar in five minutes).
    #[serde(default = "default_energy_gain")]
    pub energy_gain_per_second: f64,
    /// Happiness granted on waking with good energy.
    #[serde(default = "default_200")]
    pub wake_happiness_bonus: u16,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            duration_secs: 300,
            energy_gain_per_second: default_energy_gain(),
            wake_happiness_bonus: 200,
        }
    }
}

/// Lifespan and death rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Whole days of life before the pet dies of old age.
    #[serde(default = "default_5")]
    pub lifespan_days: u32,
    /// Whether a vital reaching zero during decay kills the pet.
    #[serde(default = "default_true")]
    pub zero_vital_is_fatal: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            lifespan_days: 5,
            zero_vital_is_fatal: true,
        }
    }
}

/// Memory store limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Max character length of a single memory.
    #[serde(default = "default_500")]
    pub max_content_chars: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_content_chars: 500,
        }
    }
}

/// Chat delegate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider: "mistral", "openai", "ollama", "none".
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base URL for the LLM API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Hard timeout for any LLM call in milliseconds.
    #[serde(default = "default_15000")]
    pub request_timeout_ms: u64,
    /// Maximum tokens to generate per reply.
    #[serde(default = "default_300")]
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Retries per call. Chat failures surface to the user instead of retrying.
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            request_timeout_ms: 15_000,
            max_tokens: 300,
            temperature: default_temperature(),
            max_retries: 0,
        }
    }
}

/// Persistence / save configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// SQLite database path.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Use WAL mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Number of rotating backups written on shutdown (0 disables).
    #[serde(default = "default_3")]
    pub backup_count: u32,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            wal_mode: true,
            backup_count: 3,
        }
    }
}

/// Periodic driver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Seconds between ticks while awake.
    #[serde(default = "default_30")]
    pub awake_interval_secs: u64,
    /// Seconds between ticks while asleep.
    #[serde(default = "default_1")]
    pub sleeping_interval_secs: u64,
    /// Fixed RNG seed for reproducible decay. Random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            awake_interval_secs: 30,
            sleeping_interval_secs: 1,
            seed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_pet_name() -> String { "Tami".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_provider() -> String { "mistral".to_string() }
fn default_base_url() -> String { "https://api.mistral.ai".to_string() }
fn default_model() -> String { "mistral-large-latest".to_string() }
fn default_api_key_env() -> String { "MISTRAL_API_KEY".to_string() }
fn default_db_path() -> String { "pet_data.db".to_string() }
fn default_hunger_rate() -> RateRange { RateRange::new(8.0, 15.0) }
fn default_energy_rate() -> RateRange { RateRange::new(6.0, 12.0) }
fn default_hygiene_rate() -> RateRange { RateRange::new(4.0, 10.0) }
fn default_happiness_rate() -> RateRange { RateRange::new(3.0, 8.0) }
fn default_energy_gain() -> f64 { 1.67 }
fn default_temperature() -> f32 { 0.7 }
fn default_1() -> u64 { 1 }
fn default_3() -> u32 { 3 }
fn default_5() -> u32 { 5 }
fn default_30() -> u64 { 30 }
fn default_200() -> u16 { 200 }
fn default_300() -> u32 { 300 }
fn default_500() -> usize { 500 }
fn default_15000() -> u64 { 15_000 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = TamiConfig::from_toml("").expect("parse");
        assert_eq!(config.general.pet_name, "Tami");
        assert_eq!(config.sleep.duration_secs, 300);
        assert_eq!(config.lifecycle.lifespan_days, 5);
        assert_eq!(config.decay.hunger, RateRange::new(8.0, 15.0));
        assert_eq!(config.driver.awake_interval_secs, 30);
        assert_eq!(config.llm.max_retries, 0);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = TamiConfig::from_toml(
            r#"
            [general]
            pet_name = "Mochi"

            [decay]
            hunger = { min = 1.0, max = 2.0 }

            [driver]
            seed = 7
            "#,
        )
        .expect("parse");
        assert_eq!(config.general.pet_name, "Mochi");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.decay.hunger, RateRange::new(1.0, 2.0));
        assert_eq!(config.decay.energy, RateRange::new(6.0, 12.0));
        assert_eq!(config.driver.seed, Some(7));
    }

    #[test]
    fn inverted_rate_range_is_rejected() {
        let err = TamiConfig::from_toml("[decay]\nenergy = { min = 9.0, max = 3.0 }")
            .expect_err("should reject");
        assert!(err.to_string().contains("decay.energy"));
    }

    #[test]
    fn zero_sleep_duration_is_rejected() {
        assert!(TamiConfig::from_toml("[sleep]\nduration_secs = 0").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config =
            TamiConfig::from_file_or_default(&dir.path().join("absent.toml")).expect("defaults");
        assert_eq!(config.persistence.path, "pet_data.db");
    }

    #[test]
    fn example_file_matches_defaults() {
        let config = TamiConfig::from_toml(include_str!("../../tami.example.toml")).expect("parse");
        let defaults = TamiConfig::default();
        assert_eq!(config.decay.happiness, defaults.decay.happiness);
        assert_eq!(config.sleep.duration_secs, defaults.sleep.duration_secs);
        assert_eq!(config.llm.api_key_env, defaults.llm.api_key_env);
        assert_eq!(config.persistence.backup_count, defaults.persistence.backup_count);
        assert_eq!(config.driver.seed, None);
    }
}
