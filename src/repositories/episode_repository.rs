// src/repositories/episode_repository.rs
//
// Episode persistence
//
// All parse failures are explicit errors, never silent defaults.
// `save_batch` and `update_watch_states` each run in one transaction;
// the sync orchestrator composes a season batch per transaction.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::ConnectionPool;
use crate::domain::Episode;
use crate::error::SyncResult;
use crate::repositories::{parse_instant, parse_uuid};

/// Aggregate watch counters for one show, computed in SQL.
#[derive(Debug, Clone)]
pub struct WatchedStats {
    pub total: u32,
    pub watched: u32,
    pub last_watched_at: Option<DateTime<Utc>>,
}

pub trait EpisodeRepository: Send + Sync {
    fn save(&self, episode: &Episode) -> SyncResult<()>;

    /// Persist a batch of episodes atomically (one transaction).
    fn save_batch(&self, episodes: &[Episode]) -> SyncResult<()>;

    fn get_by_id(&self, id: Uuid) -> SyncResult<Option<Episode>>;

    /// Lookup by the natural key `(show_id, season, number)`.
    fn find_by_number(&self, show_id: Uuid, season: u32, number: u32)
        -> SyncResult<Option<Episode>>;

    fn list_by_show(&self, show_id: Uuid) -> SyncResult<Vec<Episode>>;

    /// Aired-but-unwatched episodes as of `now`, ordered `(season, number)`
    /// ascending. The up-next candidate set.
    fn list_unwatched_aired(&self, show_id: Uuid, now: DateTime<Utc>) -> SyncResult<Vec<Episode>>;

    /// Most-recently-watched episode by `(season, number)` descending.
    fn last_watched(&self, show_id: Uuid) -> SyncResult<Option<Episode>>;

    fn watched_stats(&self, show_id: Uuid) -> SyncResult<WatchedStats>;

    /// Set or clear watch instants for the given episode ids atomically
    /// (one transaction).
    fn update_watch_states(&self, changes: &[(Uuid, Option<DateTime<Utc>>)]) -> SyncResult<()>;

    fn count_by_show(&self, show_id: Uuid) -> SyncResult<u32>;
}

pub struct SqliteEpisodeRepository {
    pool: Arc<ConnectionPool>,
}

const EPISODE_COLUMNS: &str = "id, show_id, trakt_id, season, number, title,
                               overview, runtime, aired_at, watched_at";

impl SqliteEpisodeRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_episode(row: &Row) -> Result<Episode, rusqlite::Error> {
        let id_str: String = row.get("id")?;
        let show_id_str: String = row.get("show_id")?;
        let aired_at_str: Option<String> = row.get("aired_at")?;
        let watched_at_str: Option<String> = row.get("watched_at")?;

        Ok(Episode {
            id: parse_uuid(&id_str)?,
            show_id: parse_uuid(&show_id_str)?,
            trakt_id: row.get("trakt_id")?,
            season: row.get::<_, i64>("season")? as u32,
            number: row.get::<_, i64>("number")? as u32,
            title: row.get("title")?,
            overview: row.get("overview")?,
            runtime: row.get::<_, Option<i64>>("runtime")?.map(|r| r as u32),
            aired_at: aired_at_str.as_deref().map(parse_instant).transpose()?,
            watched_at: watched_at_str.as_deref().map(parse_instant).transpose()?,
        })
    }

    /// Upsert keyed on the local id. Conflicts on `trakt_id` or the natural
    /// key `(show_id, season, number)` are real violations and surface as
    /// errors instead of clobbering rows.
    fn upsert(conn: &Connection, episode: &Episode) -> SyncResult<()> {
        conn.execute(
            "INSERT INTO episodes (
                id, show_id, trakt_id, season, number, title,
                overview, runtime, aired_at, watched_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                show_id = excluded.show_id,
                trakt_id = excluded.trakt_id,
                season = excluded.season,
                number = excluded.number,
                title = excluded.title,
                overview = excluded.overview,
                runtime = excluded.runtime,
                aired_at = excluded.aired_at,
                watched_at = excluded.watched_at",
            params![
                episode.id.to_string(),
                episode.show_id.to_string(),
                episode.trakt_id,
                episode.season as i64,
                episode.number as i64,
                episode.title,
                episode.overview,
                episode.runtime.map(|r| r as i64),
                episode.aired_at.map(|dt| dt.to_rfc3339()),
                episode.watched_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }
}

impl EpisodeRepository for SqliteEpisodeRepository {
    fn save(&self, episode: &Episode) -> SyncResult<()> {
        let conn = self.pool.get()?;
        Self::upsert(&conn, episode)
    }

    fn save_batch(&self, episodes: &[Episode]) -> SyncResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        for episode in episodes {
            Self::upsert(&tx, episode)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> SyncResult<Option<Episode>> {
        let conn = self.pool.get()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM episodes WHERE id = ?1", EPISODE_COLUMNS))?;

        match stmt.query_row(params![id.to_string()], Self::row_to_episode) {
            Ok(episode) => Ok(Some(episode)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn find_by_number(
        &self,
        show_id: Uuid,
        season: u32,
        number: u32,
    ) -> SyncResult<Option<Episode>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM episodes WHERE show_id = ?1 AND season = ?2 AND number = ?3",
            EPISODE_COLUMNS
        ))?;

        match stmt.query_row(
            params![show_id.to_string(), season as i64, number as i64],
            Self::row_to_episode,
        ) {
            Ok(episode) => Ok(Some(episode)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_by_show(&self, show_id: Uuid) -> SyncResult<Vec<Episode>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM episodes WHERE show_id = ?1 ORDER BY season, number",
            EPISODE_COLUMNS
        ))?;

        let episodes = stmt
            .query_map(params![show_id.to_string()], Self::row_to_episode)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(episodes)
    }

    fn list_unwatched_aired(&self, show_id: Uuid, now: DateTime<Utc>) -> SyncResult<Vec<Episode>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM episodes
             WHERE show_id = ?1
               AND watched_at IS NULL
               AND aired_at IS NOT NULL
               AND aired_at <= ?2
             ORDER BY season, number",
            EPISODE_COLUMNS
        ))?;

        let episodes = stmt
            .query_map(
                params![show_id.to_string(), now.to_rfc3339()],
                Self::row_to_episode,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(episodes)
    }

    fn last_watched(&self, show_id: Uuid) -> SyncResult<Option<Episode>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM episodes
             WHERE show_id = ?1 AND watched_at IS NOT NULL
             ORDER BY season DESC, number DESC
             LIMIT 1",
            EPISODE_COLUMNS
        ))?;

        match stmt.query_row(params![show_id.to_string()], Self::row_to_episode) {
            Ok(episode) => Ok(Some(episode)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn watched_stats(&self, show_id: Uuid) -> SyncResult<WatchedStats> {
        let conn = self.pool.get()?;

        let (total, watched, last_watched_str): (i64, i64, Option<String>) = conn.query_row(
            "SELECT COUNT(*), COUNT(watched_at), MAX(watched_at)
             FROM episodes WHERE show_id = ?1",
            params![show_id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let last_watched_at = last_watched_str
            .as_deref()
            .map(parse_instant)
            .transpose()?;

        Ok(WatchedStats {
            total: total as u32,
            watched: watched as u32,
            last_watched_at,
        })
    }

    fn update_watch_states(&self, changes: &[(Uuid, Option<DateTime<Utc>>)]) -> SyncResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        for (episode_id, watched_at) in changes {
            tx.execute(
                "UPDATE episodes SET watched_at = ?1 WHERE id = ?2",
                params![watched_at.map(|dt| dt.to_rfc3339()), episode_id.to_string()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn count_by_show(&self, show_id: Uuid) -> SyncResult<u32> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM episodes WHERE show_id = ?1",
            params![show_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }
}
