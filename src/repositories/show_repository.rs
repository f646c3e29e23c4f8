// src/repositories/show_repository.rs
//
// Show persistence

use rusqlite::{params, Row};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::ConnectionPool;
use crate::domain::Show;
use crate::error::{SyncError, SyncResult};
use crate::repositories::{parse_instant, parse_uuid};

pub trait ShowRepository: Send + Sync {
    fn save(&self, show: &Show) -> SyncResult<()>;
    fn get_by_id(&self, id: Uuid) -> SyncResult<Option<Show>>;
    fn find_by_trakt_id(&self, trakt_id: i64) -> SyncResult<Option<Show>>;
    fn list_all(&self) -> SyncResult<Vec<Show>>;
    fn exists(&self, id: Uuid) -> SyncResult<bool>;
    fn delete(&self, id: Uuid) -> SyncResult<()>;
}

pub struct SqliteShowRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteShowRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Map database row to Show - returns rusqlite::Error for query_map
    /// compatibility
    fn row_to_show(row: &Row) -> Result<Show, rusqlite::Error> {
        let id_str: String = row.get("id")?;
        let updated_at_str: Option<String> = row.get("updated_at")?;
        let created_at_str: String = row.get("created_at")?;

        Ok(Show {
            id: parse_uuid(&id_str)?,
            trakt_id: row.get("trakt_id")?,
            tmdb_id: row.get("tmdb_id")?,
            title: row.get("title")?,
            year: row.get("year")?,
            overview: row.get("overview")?,
            runtime: row.get::<_, Option<i64>>("runtime")?.map(|r| r as u32),
            status: row.get("status")?,
            network: row.get("network")?,
            poster_url: row.get("poster_url")?,
            backdrop_url: row.get("backdrop_url")?,
            updated_at: updated_at_str.as_deref().map(parse_instant).transpose()?,
            created_at: parse_instant(&created_at_str)?,
        })
    }
}

const SHOW_COLUMNS: &str = "id, trakt_id, tmdb_id, title, year, overview, runtime,
                            status, network, poster_url, backdrop_url, updated_at, created_at";

impl ShowRepository for SqliteShowRepository {
    fn save(&self, show: &Show) -> SyncResult<()> {
        let conn = self.pool.get()?;

        // Upsert keyed on the local id. A conflicting trakt_id on a
        // different row is a real constraint violation and must surface.
        conn.execute(
            "INSERT INTO shows (
                id, trakt_id, tmdb_id, title, year, overview, runtime,
                status, network, poster_url, backdrop_url, updated_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(id) DO UPDATE SET
                trakt_id = excluded.trakt_id,
                tmdb_id = excluded.tmdb_id,
                title = excluded.title,
                year = excluded.year,
                overview = excluded.overview,
                runtime = excluded.runtime,
                status = excluded.status,
                network = excluded.network,
                poster_url = excluded.poster_url,
                backdrop_url = excluded.backdrop_url,
                updated_at = excluded.updated_at",
            params![
                show.id.to_string(),
                show.trakt_id,
                show.tmdb_id,
                show.title,
                show.year,
                show.overview,
                show.runtime.map(|r| r as i64),
                show.status,
                show.network,
                show.poster_url,
                show.backdrop_url,
                show.updated_at.map(|dt| dt.to_rfc3339()),
                show.created_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> SyncResult<Option<Show>> {
        let conn = self.pool.get()?;

        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM shows WHERE id = ?1", SHOW_COLUMNS))?;

        match stmt.query_row(params![id.to_string()], Self::row_to_show) {
            Ok(show) => Ok(Some(show)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn find_by_trakt_id(&self, trakt_id: i64) -> SyncResult<Option<Show>> {
        let conn = self.pool.get()?;

        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM shows WHERE trakt_id = ?1", SHOW_COLUMNS))?;

        match stmt.query_row(params![trakt_id], Self::row_to_show) {
            Ok(show) => Ok(Some(show)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_all(&self) -> SyncResult<Vec<Show>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM shows ORDER BY title COLLATE NOCASE",
            SHOW_COLUMNS
        ))?;

        let shows = stmt
            .query_map([], Self::row_to_show)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(shows)
    }

    fn exists(&self, id: Uuid) -> SyncResult<bool> {
        let conn = self.pool.get()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM shows WHERE id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    fn delete(&self, id: Uuid) -> SyncResult<()> {
        let conn = self.pool.get()?;

        let affected = conn.execute("DELETE FROM shows WHERE id = ?1", params![id.to_string()])?;
        if affected == 0 {
            return Err(SyncError::NotFound);
        }

        Ok(())
    }
}
