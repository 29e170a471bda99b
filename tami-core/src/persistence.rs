//! SQLite persistence for the pet snapshot and its memories.
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS pet_stats (
//!     id              INTEGER PRIMARY KEY,
//!     hunger          INTEGER,
//!     happiness       INTEGER,
//!     energy          INTEGER,
//!     hygiene         INTEGER,
//!     age             INTEGER,
//!     last_update     TEXT,
//!     is_alive        BOOLEAN,
//!     life_start_time TEXT DEFAULT NULL
//! );
//! CREATE TABLE IF NOT EXISTS pet_memories (
//!     id         INTEGER PRIMARY KEY AUTOINCREMENT,
//!     category   TEXT,
//!     content    TEXT,
//!     created_at TEXT
//! );
//! ```
//!
//! The snapshot is a single row with `id = 1`. Timestamps are written as
//! RFC 3339; older stores that wrote naive ISO-8601 are read back as UTC.
//! Stores that predate `life_start_time` get the column added on open.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, OpenFlags, params};
use tracing::{debug, info, warn};

use crate::config::PersistenceConfig;
use crate::error::{Result, TamiError};
use crate::memory::{MemoryCategory, MemoryEntry};
use crate::pet::PetState;
use crate::types::Vitals;

const SNAPSHOT_ID: i64 = 1;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS pet_stats (
        id              INTEGER PRIMARY KEY,
        hunger          INTEGER,
        happiness       INTEGER,
        energy          INTEGER,
        hygiene         INTEGER,
        age             INTEGER,
        last_update     TEXT,
        is_alive        BOOLEAN,
        life_start_time TEXT DEFAULT NULL
    );
    CREATE TABLE IF NOT EXISTS pet_memories (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        category   TEXT,
        content    TEXT,
        created_at TEXT
    );";

/// Parse a stored timestamp: RFC 3339 first, then naive ISO-8601 as UTC.
///
/// # Errors
/// Returns `TamiError::InvalidTimestamp` if neither form matches.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| TamiError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Handle to the pet database.
pub struct PetStore {
    conn: Connection,
    config: PersistenceConfig,
    db_path: PathBuf,
}

impl std::fmt::Debug for PetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PetStore")
            .field("db_path", &self.db_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PetStore {
    /// Open (or create) the database at `path`, creating or migrating the schema.
    ///
    /// # Errors
    ///
    /// Returns [`TamiError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;

        init_schema(&conn)?;

        info!(
            path = %db_path.display(),
            wal = config.wal_mode,
            "Pet store opened"
        );

        Ok(Self {
            conn,
            config: config.clone(),
            db_path,
        })
    }

    /// Open an in-memory database. Nothing survives the process.
    ///
    /// # Errors
    ///
    /// Returns [`TamiError::Database`] on SQLite failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;

        Ok(Self {
            conn,
            config: config.clone(),
            db_path: PathBuf::from(":memory:"),
        })
    }

    // ------------------------------------------------------------------
    // Pet snapshot
    // ------------------------------------------------------------------

    /// Write the snapshot row, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`TamiError::Database`] on SQLite failures.
    pub fn save_pet(&self, pet: &PetState) -> Result<()> {
        let start = Instant::now();
        let v = pet.vitals;
        self.conn.execute(
            "INSERT OR REPLACE INTO pet_stats
                (id, hunger, happiness, energy, hygiene, age, last_update, is_alive, life_start_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                SNAPSHOT_ID,
                v.hunger(),
                v.happiness(),
                v.energy(),
                v.hygiene(),
                pet.age,
                pet.last_update.to_rfc3339(),
                pet.is_alive(),
                pet.life_start().to_rfc3339(),
            ],
        )?;

        debug!(
            alive = pet.is_alive(),
            elapsed_us = start.elapsed().as_micros(),
            "Pet snapshot saved"
        );
        Ok(())
    }

    /// Read the snapshot row. `Ok(None)` if nothing was ever saved.
    ///
    /// A missing life start is taken as `now`.
    ///
    /// # Errors
    ///
    /// Returns [`TamiError::Database`] on SQLite failures and
    /// [`TamiError::InvalidTimestamp`] for unreadable timestamps.
    pub fn load_pet(&self, now: DateTime<Utc>) -> Result<Option<PetState>> {
        let start = Instant::now();
        let row = self
            .conn
            .query_row(
                "SELECT hunger, happiness, energy, hygiene, age, last_update, is_alive, life_start_time
                 FROM pet_stats WHERE id = ?1",
                params![SNAPSHOT_ID],
                |row| {
                    Ok(StoredPet {
                        hunger: row.get::<_, Option<i64>>(0)?.unwrap_or_default(),
                        happiness: row.get::<_, Option<i64>>(1)?.unwrap_or_default(),
                        energy: row.get::<_, Option<i64>>(2)?.unwrap_or_default(),
                        hygiene: row.get::<_, Option<i64>>(3)?.unwrap_or_default(),
                        age: row.get::<_, Option<i64>>(4)?.unwrap_or_default(),
                        last_update: row.get(5)?,
                        is_alive: row.get::<_, Option<bool>>(6)?.unwrap_or(true),
                        life_start: row.get(7)?,
                    })
                },
            )
            .optional()?;

        let Some(stored) = row else {
            return Ok(None);
        };

        let last_update = match stored.last_update.as_deref() {
            Some(text) => parse_timestamp(text)?,
            None => now,
        };
        let life_start = match stored.life_start.as_deref() {
            Some(text) if !text.is_empty() => parse_timestamp(text)?,
            _ => now,
        };
        let pet = PetState::restore(
            Vitals::new(stored.hunger, stored.happiness, stored.energy, stored.hygiene),
            u32::try_from(stored.age.max(0)).unwrap_or(u32::MAX),
            stored.is_alive,
            last_update,
            life_start,
        );

        debug!(
            alive = pet.is_alive(),
            elapsed_us = start.elapsed().as_micros(),
            "Pet snapshot loaded"
        );
        Ok(Some(pet))
    }

    // ------------------------------------------------------------------
    // Memories
    // ------------------------------------------------------------------

    /// Save `content` under `category`, replacing the category's previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`TamiError::Database`] on SQLite failures.
    pub fn upsert_memory(
        &self,
        category: MemoryCategory,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM pet_memories WHERE category = ?1",
                params![category.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            tx.execute(
                "UPDATE pet_memories SET content = ?1, created_at = ?2 WHERE id = ?3",
                params![content, now.to_rfc3339(), id],
            )?;
        } else {
            tx.execute(
                "INSERT INTO pet_memories (category, content, created_at) VALUES (?1, ?2, ?3)",
                params![category.as_str(), content, now.to_rfc3339()],
            )?;
        }
        tx.commit()?;

        debug!(%category, replaced = existing.is_some(), "Memory saved");
        Ok(())
    }

    /// Every stored memory, oldest row first.
    ///
    /// # Errors
    ///
    /// Returns [`TamiError::Database`] on SQLite failures.
    pub fn memories(&self) -> Result<Vec<MemoryEntry>> {
        self.query_memories(None)
    }

    /// Stored memories in `category` (at most one).
    ///
    /// # Errors
    ///
    /// Returns [`TamiError::Database`] on SQLite failures.
    pub fn memories_by_category(&self, category: MemoryCategory) -> Result<Vec<MemoryEntry>> {
        self.query_memories(Some(category))
    }

    fn query_memories(&self, category: Option<MemoryCategory>) -> Result<Vec<MemoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, content, created_at FROM pet_memories
             WHERE ?1 IS NULL OR category = ?1
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![category.map(MemoryCategory::as_str)], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (category, content, created_at) = row?;
            let Some(category) = category.and_then(|c| c.parse::<MemoryCategory>().ok()) else {
                warn!("Skipping memory with unknown category");
                continue;
            };
            let created_at = match created_at.as_deref().map(parse_timestamp) {
                Some(Ok(ts)) => ts,
                Some(Err(e)) => {
                    warn!(error = %e, "Memory has unreadable timestamp");
                    DateTime::<Utc>::default()
                }
                None => DateTime::<Utc>::default(),
            };
            entries.push(MemoryEntry {
                category,
                content: content.unwrap_or_default(),
                created_at,
            });
        }
        Ok(entries)
    }

    // ------------------------------------------------------------------
    // Backup
    // ------------------------------------------------------------------

    /// Snapshot the whole pet store (pet row and memories) into `dest_path`.
    ///
    /// Uses SQLite's online backup, so the live store stays usable while the
    /// copy is written.
    ///
    /// # Errors
    ///
    /// Returns [`TamiError::Database`] on SQLite failures.
    pub fn backup<P: AsRef<Path>>(&self, dest_path: P) -> Result<()> {
        let dest_path = dest_path.as_ref();
        let start = Instant::now();
        let mut dest = Connection::open(dest_path)?;
        rusqlite::backup::Backup::new(&self.conn, &mut dest)?.run_to_completion(
            64,
            std::time::Duration::from_millis(10),
            None,
        )?;
        debug!(
            dest = %dest_path.display(),
            elapsed_ms = start.elapsed().as_millis(),
            "Pet store copied"
        );
        Ok(())
    }

    /// Keep the last `backup_count` copies of the pet next to its database,
    /// newest in `<db>.bak.1`. Does nothing for in-memory stores or when
    /// `backup_count` is zero.
    ///
    /// # Errors
    ///
    /// Returns [`TamiError::Database`] or [`TamiError::Io`] on failure.
    pub fn create_rotating_backup(&self) -> Result<()> {
        let keep = self.config.backup_count;
        if self.is_in_memory() || keep == 0 {
            return Ok(());
        }

        let expired = backup_slot(&self.db_path, keep);
        if expired.exists() {
            std::fs::remove_file(&expired)?;
        }
        for slot in (1..keep).rev() {
            let older = backup_slot(&self.db_path, slot);
            if older.exists() {
                std::fs::rename(&older, backup_slot(&self.db_path, slot + 1))?;
            }
        }

        let newest = backup_slot(&self.db_path, 1);
        self.backup(&newest)?;
        info!(path = %newest.display(), keep, "Pet backed up");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Utility
    // ------------------------------------------------------------------

    /// Database file path, or `:memory:`.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Whether this store lives only in memory.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.db_path.as_os_str() == ":memory:"
    }

    /// Run `PRAGMA integrity_check`. `Ok(false)` means corruption.
    ///
    /// # Errors
    ///
    /// Returns [`TamiError::Database`] if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }
}

struct StoredPet {
    hunger: i64,
    happiness: i64,
    energy: i64,
    hygiene: i64,
    age: i64,
    last_update: Option<String>,
    is_alive: bool,
    life_start: Option<String>,
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let mut stmt = conn.prepare("PRAGMA table_info(pet_stats)")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if !columns.iter().any(|c| c == "life_start_time") {
        conn.execute_batch("ALTER TABLE pet_stats ADD COLUMN life_start_time TEXT DEFAULT NULL;")?;
        info!("Migrated pet_stats: added life_start_time");
    }
    Ok(())
}

/// Adds `.optional()` to `rusqlite::Result`, mapping no rows to `Ok(None)`.
trait OptionalExt<T> {
    fn optional(self) -> std::result::Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> std::result::Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// `pet.db` -> `pet.db.bak.<slot>`.
fn backup_slot(db_path: &Path, slot: u32) -> PathBuf {
    let mut name = db_path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".bak.{slot}"));
    db_path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::DeathCause;
    use chrono::{Duration, TimeZone};

    fn test_config() -> PersistenceConfig {
        PersistenceConfig {
            wal_mode: false,
            ..PersistenceConfig::default()
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().expect("valid date")
    }

    #[test]
    fn empty_store_has_no_pet() {
        let store = PetStore::open_in_memory(&test_config()).expect("open");
        assert!(store.load_pet(t0()).expect("load").is_none());
    }

    #[test]
    fn snapshot_round_trip() {
        let store = PetStore::open_in_memory(&test_config()).expect("open");
        let mut pet = PetState::restore(
            Vitals::new(1234, 5678, 4321, 8000),
            3,
            true,
            t0() + Duration::minutes(90),
            t0(),
        );
        store.save_pet(&pet).expect("save");
        assert_eq!(store.load_pet(t0()).expect("load"), Some(pet.clone()));

        pet.die(DeathCause::OldAge);
        store.save_pet(&pet).expect("save again");
        let loaded = store.load_pet(t0()).expect("load").expect("some");
        assert!(!loaded.is_alive());
    }

    #[test]
    fn sleep_is_not_persisted() {
        let store = PetStore::open_in_memory(&test_config()).expect("open");
        let mut pet = PetState::new(t0());
        pet.fall_asleep(t0());
        store.save_pet(&pet).expect("save");
        let loaded = store.load_pet(t0()).expect("load").expect("some");
        assert!(!loaded.is_sleeping());
    }

    #[test]
    fn memories_upsert_per_category() {
        let store = PetStore::open_in_memory(&test_config()).expect("open");
        store.upsert_memory(MemoryCategory::Likes, "pizza", t0()).expect("first");
        store
            .upsert_memory(MemoryCategory::Likes, "sushi", t0() + Duration::seconds(5))
            .expect("second");
        store.upsert_memory(MemoryCategory::Name, "Alex", t0()).expect("name");

        let likes = store.memories_by_category(MemoryCategory::Likes).expect("likes");
        assert_eq!(likes.len(), 1);
        assert_eq!(likes[0].content, "sushi");
        assert_eq!(likes[0].created_at, t0() + Duration::seconds(5));

        assert_eq!(store.memories().expect("all").len(), 2);
        assert!(store.memories_by_category(MemoryCategory::Family).expect("family").is_empty());
    }

    #[test]
    fn naive_timestamps_are_utc() {
        assert_eq!(parse_timestamp("2025-03-01T12:00:00.250000").expect("parse"), t0() + Duration::milliseconds(250));
        assert_eq!(parse_timestamp("2025-03-01T12:00:00+00:00").expect("parse"), t0());
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(TamiError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn legacy_table_is_migrated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("legacy.db");
        {
            let conn = Connection::open(&db_path).expect("create legacy");
            conn.execute_batch(
                "CREATE TABLE pet_stats (
                    id INTEGER PRIMARY KEY, hunger INTEGER, happiness INTEGER,
                    energy INTEGER, hygiene INTEGER, age INTEGER,
                    last_update TEXT, is_alive BOOLEAN
                );
                INSERT INTO pet_stats VALUES (1, 4000, 5000, 6000, 7000, 2, '2025-03-01T12:00:00', 1);",
            )
            .expect("seed legacy");
        }

        let store = PetStore::open(&db_path, &test_config()).expect("open");
        let now = t0() + Duration::hours(1);
        let pet = store.load_pet(now).expect("load").expect("some");
        assert_eq!(pet.vitals, Vitals::new(4000, 5000, 6000, 7000));
        assert_eq!(pet.age, 2);
        assert_eq!(pet.last_update, t0());
        assert_eq!(pet.life_start(), now);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("pet.db");
        let config = PersistenceConfig::default();
        let pet = PetState::new(t0());
        {
            let store = PetStore::open(&db_path, &config).expect("open");
            store.save_pet(&pet).expect("save");
            assert!(store.integrity_check().expect("check"));
        }
        let store = PetStore::open(&db_path, &config).expect("reopen");
        assert_eq!(store.load_pet(t0()).expect("load"), Some(pet));
    }

    #[test]
    fn rotating_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("pet.db");
        let mut config = test_config();
        config.backup_count = 2;

        let store = PetStore::open(&db_path, &config).expect("open");
        store.save_pet(&PetState::new(t0())).expect("save");

        store.create_rotating_backup().expect("backup 1");
        store.create_rotating_backup().expect("backup 2");
        store.create_rotating_backup().expect("backup 3");

        assert!(dir.path().join("pet.db.bak.1").exists());
        assert!(dir.path().join("pet.db.bak.2").exists());
        assert!(!dir.path().join("pet.db.bak.3").exists());

        let restored = PetStore::open(dir.path().join("pet.db.bak.1"), &config).expect("open backup");
        assert!(restored.load_pet(t0()).expect("load").is_some());
    }

    #[test]
    fn backup_slots_sit_next_to_the_database() {
        assert_eq!(
            backup_slot(Path::new("/data/pet.db"), 2),
            PathBuf::from("/data/pet.db.bak.2")
        );
        assert_eq!(backup_slot(Path::new("pet"), 1), PathBuf::from("pet.bak.1"));
    }

    #[test]
    fn zero_backup_count_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("pet.db");
        let mut config = test_config();
        config.backup_count = 0;

        let store = PetStore::open(&db_path, &config).expect("open");
        store.create_rotating_backup().expect("skip");
        assert!(!dir.path().join("pet.db.bak.1").exists());
    }

    #[test]
    fn in_memory_backup_is_a_no_op() {
        let store = PetStore::open_in_memory(&test_config()).expect("open");
        assert!(store.is_in_memory());
        store.create_rotating_backup().expect("skip");
    }
}
