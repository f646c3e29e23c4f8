// src/repositories/movie_repository.rs
//
// Movie persistence

use rusqlite::{params, Connection, Row};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::ConnectionPool;
use crate::domain::Movie;
use crate::error::SyncResult;
use crate::repositories::{parse_instant, parse_uuid};

pub trait MovieRepository: Send + Sync {
    fn save(&self, movie: &Movie) -> SyncResult<()>;

    /// Persist a batch of movies atomically (one transaction).
    fn save_batch(&self, movies: &[Movie]) -> SyncResult<()>;

    fn get_by_id(&self, id: Uuid) -> SyncResult<Option<Movie>>;
    fn find_by_trakt_id(&self, trakt_id: i64) -> SyncResult<Option<Movie>>;
    fn list_all(&self) -> SyncResult<Vec<Movie>>;
}

pub struct SqliteMovieRepository {
    pool: Arc<ConnectionPool>,
}

const MOVIE_COLUMNS: &str = "id, trakt_id, tmdb_id, title, year, overview,
                             runtime, poster_url, backdrop_url, watched_at";

impl SqliteMovieRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_movie(row: &Row) -> Result<Movie, rusqlite::Error> {
        let id_str: String = row.get("id")?;
        let watched_at_str: Option<String> = row.get("watched_at")?;

        Ok(Movie {
            id: parse_uuid(&id_str)?,
            trakt_id: row.get("trakt_id")?,
            tmdb_id: row.get("tmdb_id")?,
            title: row.get("title")?,
            year: row.get("year")?,
            overview: row.get("overview")?,
            runtime: row.get::<_, Option<i64>>("runtime")?.map(|r| r as u32),
            poster_url: row.get("poster_url")?,
            backdrop_url: row.get("backdrop_url")?,
            watched_at: watched_at_str.as_deref().map(parse_instant).transpose()?,
        })
    }

    fn upsert(conn: &Connection, movie: &Movie) -> SyncResult<()> {
        conn.execute(
            "INSERT INTO movies (
                id, trakt_id, tmdb_id, title, year, overview,
                runtime, poster_url, backdrop_url, watched_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                trakt_id = excluded.trakt_id,
                tmdb_id = excluded.tmdb_id,
                title = excluded.title,
                year = excluded.year,
                overview = excluded.overview,
                runtime = excluded.runtime,
                poster_url = excluded.poster_url,
                backdrop_url = excluded.backdrop_url,
                watched_at = excluded.watched_at",
            params![
                movie.id.to_string(),
                movie.trakt_id,
                movie.tmdb_id,
                movie.title,
                movie.year,
                movie.overview,
                movie.runtime.map(|r| r as i64),
                movie.poster_url,
                movie.backdrop_url,
                movie.watched_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }
}

impl MovieRepository for SqliteMovieRepository {
    fn save(&self, movie: &Movie) -> SyncResult<()> {
        let conn = self.pool.get()?;
        Self::upsert(&conn, movie)
    }

    fn save_batch(&self, movies: &[Movie]) -> SyncResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        for movie in movies {
            Self::upsert(&tx, movie)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> SyncResult<Option<Movie>> {
        let conn = self.pool.get()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM movies WHERE id = ?1", MOVIE_COLUMNS))?;

        match stmt.query_row(params![id.to_string()], Self::row_to_movie) {
            Ok(movie) => Ok(Some(movie)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn find_by_trakt_id(&self, trakt_id: i64) -> SyncResult<Option<Movie>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM movies WHERE trakt_id = ?1",
            MOVIE_COLUMNS
        ))?;

        match stmt.query_row(params![trakt_id], Self::row_to_movie) {
            Ok(movie) => Ok(Some(movie)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_all(&self) -> SyncResult<Vec<Movie>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM movies ORDER BY title COLLATE NOCASE",
            MOVIE_COLUMNS
        ))?;

        let movies = stmt
            .query_map([], Self::row_to_movie)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(movies)
    }
}
