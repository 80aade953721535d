// SQLite persistence layer for player pools and slate metadata.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::Deserialize;
use tracing::warn;

use crate::player::{CandidatePlayer, PlayerStatus};
use crate::sources::{PlayerPoolSource, SlateMetadataSource};

/// SQLite-backed store for slates and their candidate player pools.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS slates (
                draft_group TEXT PRIMARY KEY,
                slate_date  TEXT NOT NULL,
                total_games INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS players (
                id          INTEGER NOT NULL,
                draft_group TEXT NOT NULL,
                name        TEXT NOT NULL,
                team        TEXT NOT NULL,
                positions   TEXT NOT NULL,
                salary      INTEGER NOT NULL,
                projection  REAL,
                status      TEXT NOT NULL,
                PRIMARY KEY (id, draft_group)
            );

            CREATE INDEX IF NOT EXISTS idx_players_group_team
                ON players(draft_group, team);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Register (or update) a slate. Uses INSERT OR REPLACE so re-importing
    /// the same draft group overwrites the previous metadata.
    pub fn upsert_slate(
        &self,
        draft_group: &str,
        slate_date: NaiveDate,
        total_games: u32,
    ) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO slates (draft_group, slate_date, total_games)
             VALUES (?1, ?2, ?3)",
            params![draft_group, slate_date.to_string(), total_games],
        )
        .context("failed to upsert slate")?;
        Ok(())
    }

    /// Insert or update a single candidate player. Position tags are stored
    /// as a JSON array so multi-position players round-trip losslessly.
    pub fn upsert_player(&self, draft_group: &str, player: &CandidatePlayer) -> Result<()> {
        let conn = self.conn();
        let positions_json = serde_json::to_string(&player.positions)
            .context("failed to serialize position tags")?;
        conn.execute(
            "INSERT OR REPLACE INTO players
                (id, draft_group, name, team, positions, salary, projection, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                player.id,
                draft_group,
                player.name,
                player.team,
                positions_json,
                player.salary,
                player.projection,
                player.status.to_string(),
            ],
        )
        .context("failed to upsert player")?;
        Ok(())
    }

    /// Import a provider salary CSV into the pool for `draft_group`,
    /// registering the slate alongside. Malformed rows are skipped with a
    /// warning rather than failing the whole import. Returns the number of
    /// players imported.
    pub fn import_pool_csv(
        &self,
        path: &Path,
        draft_group: &str,
        slate_date: NaiveDate,
        total_games: u32,
    ) -> Result<usize> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open pool CSV {}", path.display()))?;

        self.upsert_slate(draft_group, slate_date, total_games)?;

        let mut imported = 0usize;
        for (idx, row) in reader.deserialize::<RawPoolRow>().enumerate() {
            let row = match row {
                Ok(r) => r,
                Err(e) => {
                    warn!("skipping malformed pool row {}: {}", idx + 2, e);
                    continue;
                }
            };
            let player = match row.into_candidate() {
                Ok(p) => p,
                Err(reason) => {
                    warn!("skipping pool row {}: {}", idx + 2, reason);
                    continue;
                }
            };
            self.upsert_player(draft_group, &player)?;
            imported += 1;
        }

        Ok(imported)
    }
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private), provider salary export format
// ---------------------------------------------------------------------------

/// Provider salary CSV row. Extra columns (game info, roster position, etc.)
/// are silently absorbed via `#[serde(flatten)]`.
#[derive(Debug, Deserialize)]
#[allow(dead_code, non_snake_case)]
struct RawPoolRow {
    Name: String,
    ID: i64,
    Position: String,
    Salary: u32,
    TeamAbbrev: String,
    #[serde(default)]
    AvgPointsPerGame: Option<f64>,
    #[serde(default)]
    Status: String,
    #[serde(flatten)]
    _extra: HashMap<String, serde_json::Value>,
}

impl RawPoolRow {
    fn into_candidate(self) -> std::result::Result<CandidatePlayer, String> {
        let positions = CandidatePlayer::parse_positions(&self.Position);
        if positions.is_empty() {
            return Err(format!("player {} has no position tags", self.Name));
        }
        if self.TeamAbbrev.trim().is_empty() {
            return Err(format!("player {} has no team", self.Name));
        }
        Ok(CandidatePlayer {
            id: self.ID,
            name: self.Name,
            team: self.TeamAbbrev.trim().to_uppercase(),
            positions,
            salary: self.Salary,
            projection: self.AvgPointsPerGame,
            status: PlayerStatus::from_str_status(&self.Status),
        })
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn row_to_candidate(row: &rusqlite::Row<'_>) -> rusqlite::Result<CandidatePlayer> {
    let positions_json: String = row.get(4)?;
    let positions =
        serde_json::from_str::<Vec<String>>(&positions_json).unwrap_or_default();
    let status: String = row.get(7)?;
    Ok(CandidatePlayer {
        id: row.get(0)?,
        name: row.get(2)?,
        team: row.get(3)?,
        positions,
        salary: row.get(5)?,
        projection: row.get(6)?,
        status: PlayerStatus::from_str_status(&status),
    })
}

const PLAYER_COLUMNS: &str =
    "id, draft_group, name, team, positions, salary, projection, status";

// ---------------------------------------------------------------------------
// Collaborator trait implementations
// ---------------------------------------------------------------------------

impl PlayerPoolSource for Database {
    fn fetch_pool(&self, draft_group: &str) -> Result<Vec<CandidatePlayer>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {PLAYER_COLUMNS} FROM players WHERE draft_group = ?1 ORDER BY id"
            ))
            .context("failed to prepare pool query")?;
        let players = stmt
            .query_map(params![draft_group], row_to_candidate)
            .context("failed to query pool")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map pool rows")?;
        Ok(players)
    }

    fn fetch_pool_for_team(
        &self,
        draft_group: &str,
        team: &str,
        exclude_pitchers: bool,
    ) -> Result<Vec<CandidatePlayer>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {PLAYER_COLUMNS} FROM players
                 WHERE draft_group = ?1 AND team = ?2 ORDER BY id"
            ))
            .context("failed to prepare team pool query")?;
        let mut players = stmt
            .query_map(params![draft_group, team], row_to_candidate)
            .context("failed to query team pool")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map team pool rows")?;
        // Pitcher status is derived from position tags, so the filter lives
        // here rather than in SQL.
        if exclude_pitchers {
            players.retain(|p| !p.is_pitcher());
        }
        Ok(players)
    }

    fn fetch_by_id(&self, draft_group: &str, player_id: i64) -> Result<Option<CandidatePlayer>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {PLAYER_COLUMNS} FROM players
                 WHERE draft_group = ?1 AND id = ?2"
            ))
            .context("failed to prepare player lookup")?;
        let mut rows = stmt
            .query_map(params![draft_group, player_id], row_to_candidate)
            .context("failed to query player")?;
        match rows.next() {
            Some(row) => Ok(Some(row.context("failed to map player row")?)),
            None => Ok(None),
        }
    }
}

impl SlateMetadataSource for Database {
    fn total_games_for_slate(&self, draft_group: &str) -> Result<Option<u32>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT total_games FROM slates WHERE draft_group = ?1")
            .context("failed to prepare slate query")?;
        let mut rows = stmt
            .query_map(params![draft_group], |row| row.get::<_, u32>(0))
            .context("failed to query slate")?;
        match rows.next() {
            Some(row) => Ok(Some(row.context("failed to read slate row")?)),
            None => Ok(None),
        }
    }
}
