//! SQLite-based storage.
//!
//! Provides persistent storage for:
//! - Finished fights (training history, stats, day streaks)
//! - Key-value store for application state (preferences blob, seen combos)

use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::{data_dir, migrations};
use crate::error::{DatabaseError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightRecord {
    pub id: i64,
    pub category: String,
    pub difficulty: String,
    pub total_rounds: u32,
    pub rounds_completed: u32,
    /// Every round was fought (game over rather than stopped early).
    pub completed: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// A fight that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFight<'a> {
    pub category: &'a str,
    pub difficulty: &'a str,
    pub total_rounds: u32,
    pub rounds_completed: u32,
    pub completed: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightStats {
    pub total_fights: u64,
    pub completed_fights: u64,
    pub total_rounds: u64,
    pub today_fights: u64,
}

/// SQLite database for fight history and small pieces of app state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/shadowbox/shadowbox.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("shadowbox.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// In-memory database, mostly for tests.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Record a finished fight. Returns its row id.
    pub fn record_fight(&self, fight: &NewFight<'_>) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO fights (category, difficulty, total_rounds, rounds_completed, completed, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                fight.category,
                fight.difficulty,
                fight.total_rounds,
                fight.rounds_completed,
                fight.completed,
                fight.started_at.to_rfc3339(),
                fight.ended_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent fights first.
    pub fn recent_fights(&self, limit: usize) -> Result<Vec<FightRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, category, difficulty, total_rounds, rounds_completed, completed, started_at, ended_at
             FROM fights
             ORDER BY ended_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, u32>(4)?,
                row.get::<_, bool>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut fights = Vec::new();
        for row in rows {
            let (id, category, difficulty, total_rounds, rounds_completed, completed, started, ended) =
                row?;
            fights.push(FightRecord {
                id,
                category,
                difficulty,
                total_rounds,
                rounds_completed,
                completed,
                started_at: parse_timestamp(&started)?,
                ended_at: parse_timestamp(&ended)?,
            });
        }
        Ok(fights)
    }

    pub fn stats(&self) -> Result<FightStats> {
        let (total_fights, completed_fights, total_rounds) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(completed), 0), COALESCE(SUM(rounds_completed), 0)
             FROM fights",
            [],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?, row.get::<_, u64>(2)?)),
        )?;
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let today_fights = self.conn.query_row(
            "SELECT COUNT(*) FROM fights WHERE ended_at >= ?1",
            params![format!("{today}T00:00:00+00:00")],
            |row| row.get::<_, u64>(0),
        )?;
        Ok(FightStats {
            total_fights,
            completed_fights,
            total_rounds,
            today_fights,
        })
    }

    /// Consecutive days with at least one completed fight, counting back
    /// from `today` (or from yesterday when nothing is logged today yet).
    pub fn training_streak(&self, today: NaiveDate) -> Result<u32> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT substr(ended_at, 1, 10) AS day
             FROM fights
             WHERE completed = 1
             ORDER BY day DESC",
        )?;
        let days = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        let days: Vec<NaiveDate> = days
            .iter()
            .filter_map(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
            .filter(|day| *day <= today)
            .collect();

        let Some(&latest) = days.first() else {
            return Ok(0);
        };
        if latest < today - Duration::days(1) {
            return Ok(0);
        }
        let mut expected = latest;
        let mut streak = 0;
        for day in days {
            if day != expected {
                break;
            }
            streak += 1;
            expected = day - Duration::days(1);
        }
        Ok(streak)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp '{value}': {e}")).into())
}
