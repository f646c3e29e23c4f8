// src/services/sync_service_tests.rs
//
// Orchestrator tests: mocked remote client against a real SQLite store.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::{Movie, Show};
use crate::error::SyncError;
use crate::integrations::trakt::dto::{
    EpisodeDto, IdsDto, MovieDto, ProgressDto, ProgressEpisodeDto, ProgressSeasonDto, SeasonDto,
    ShowDto, WatchedMovieDto, WatchedShowDto,
};
use crate::integrations::MockRemoteClient;
use crate::repositories::testing::test_pool;
use crate::repositories::{
    EpisodeRepository, MovieRepository, ShowRepository, SqliteEpisodeRepository,
    SqliteMovieRepository, SqliteShowRepository,
};
use crate::services::{SyncOptions, SyncPhase, SyncProgress, SyncService};

struct TestStore {
    _dir: tempfile::TempDir,
    show_repo: Arc<dyn ShowRepository>,
    episode_repo: Arc<dyn EpisodeRepository>,
    movie_repo: Arc<dyn MovieRepository>,
}

fn test_store() -> TestStore {
    let (dir, pool) = test_pool();
    TestStore {
        _dir: dir,
        show_repo: Arc::new(SqliteShowRepository::new(Arc::clone(&pool))),
        episode_repo: Arc::new(SqliteEpisodeRepository::new(Arc::clone(&pool))),
        movie_repo: Arc::new(SqliteMovieRepository::new(pool)),
    }
}

fn service(store: &TestStore, client: MockRemoteClient) -> SyncService {
    SyncService::new(
        Arc::clone(&store.show_repo),
        Arc::clone(&store.episode_repo),
        Arc::clone(&store.movie_repo),
        Arc::new(client),
    )
}

fn options(max_concurrency: usize) -> SyncOptions {
    SyncOptions { max_concurrency }
}

fn instant(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn show_dto(trakt_id: i64, title: &str) -> ShowDto {
    ShowDto {
        title: title.to_string(),
        year: Some(2008),
        ids: IdsDto {
            trakt: trakt_id,
            ..Default::default()
        },
        overview: None,
        runtime: Some(45),
        status: Some("ended".to_string()),
        network: None,
        updated_at: None,
        images: None,
    }
}

fn season_dto(number: u32) -> SeasonDto {
    SeasonDto {
        number,
        ids: IdsDto::default(),
        episode_count: None,
        aired_episodes: None,
    }
}

fn episode_dto(trakt_id: i64, season: u32, number: u32) -> EpisodeDto {
    EpisodeDto {
        season,
        number,
        title: Some(format!("S{:02}E{:02}", season, number)),
        ids: IdsDto {
            trakt: trakt_id,
            ..Default::default()
        },
        overview: None,
        runtime: Some(45),
        first_aired: Some(Utc.with_ymd_and_hms(2020, 1, number, 20, 0, 0).unwrap()),
    }
}

fn empty_progress() -> ProgressDto {
    ProgressDto {
        aired: 0,
        completed: 0,
        last_watched_at: None,
        seasons: vec![],
    }
}

/// Wire up the full happy-path pipeline for one show: two regular
/// seasons (2 + 1 episodes), a specials season that must be skipped,
/// and S01E01 watched remotely.
fn mock_full_pipeline(client: &mut MockRemoteClient, trakt_id: i64) {
    client
        .expect_get_show()
        .withf(move |id| *id == trakt_id)
        .returning(move |_| Ok(show_dto(trakt_id, "Breaking Bad")));
    client
        .expect_get_seasons()
        .withf(move |id| *id == trakt_id)
        .returning(|_| Ok(vec![season_dto(0), season_dto(1), season_dto(2)]));
    client
        .expect_get_episodes()
        .withf(move |id, season| *id == trakt_id && *season > 0)
        .returning(|_, season| {
            Ok(match season {
                1 => vec![episode_dto(101, 1, 1), episode_dto(102, 1, 2)],
                _ => vec![episode_dto(201, 2, 1)],
            })
        });
    client
        .expect_get_watched_progress()
        .withf(move |id| *id == trakt_id)
        .returning(|_| {
            Ok(ProgressDto {
                aired: 3,
                completed: 1,
                last_watched_at: Some(instant("2021-06-10T05:05:41Z")),
                seasons: vec![ProgressSeasonDto {
                    number: 1,
                    episodes: vec![ProgressEpisodeDto {
                        number: 1,
                        completed: true,
                        last_watched_at: Some(instant("2021-06-10T05:05:41Z")),
                    }],
                }],
            })
        });
}

fn seed_show(store: &TestStore, trakt_id: i64, title: &str) -> Uuid {
    let show = Show::new(trakt_id, title.to_string());
    store.show_repo.save(&show).unwrap();
    show.id
}

#[tokio::test]
async fn test_sync_persists_episodes_and_progress() {
    let store = test_store();
    let show_id = seed_show(&store, 1388, "Breaking Bad");

    let mut client = MockRemoteClient::new();
    mock_full_pipeline(&mut client, 1388);
    let service = service(&store, client);

    let result = service
        .sync_shows(vec![show_id], options(1), None)
        .await
        .unwrap();

    assert_eq!(result.total_shows, 1);
    assert_eq!(result.success_count, 1);
    assert!(result.failed_shows.is_empty());
    assert_eq!(result.total_episodes_synced, 3);

    // Specials were filtered out before any fetch
    assert_eq!(store.episode_repo.count_by_show(show_id).unwrap(), 3);

    let watched = store
        .episode_repo
        .find_by_number(show_id, 1, 1)
        .unwrap()
        .unwrap();
    assert_eq!(watched.watched_at, Some(instant("2021-06-10T05:05:41Z")));

    let unwatched = store
        .episode_repo
        .find_by_number(show_id, 1, 2)
        .unwrap()
        .unwrap();
    assert!(unwatched.watched_at.is_none());
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let store = test_store();
    let show_id = seed_show(&store, 1388, "Breaking Bad");

    let mut client = MockRemoteClient::new();
    mock_full_pipeline(&mut client, 1388);
    let service = service(&store, client);

    service
        .sync_shows(vec![show_id], options(1), None)
        .await
        .unwrap();
    let first_run = store.episode_repo.list_by_show(show_id).unwrap();

    service
        .sync_shows(vec![show_id], options(1), None)
        .await
        .unwrap();
    let second_run = store.episode_repo.list_by_show(show_id).unwrap();

    // Same rows, same ids, same watch state
    assert_eq!(first_run.len(), second_run.len());
    for (a, b) in first_run.iter().zip(second_run.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.watched_at, b.watched_at);
    }
}

#[tokio::test]
async fn test_duplicate_ids_are_synced_once() {
    let store = test_store();
    let show_id = seed_show(&store, 1388, "Breaking Bad");

    let mut client = MockRemoteClient::new();
    client
        .expect_get_show()
        .times(1)
        .returning(|_| Ok(show_dto(1388, "Breaking Bad")));
    client
        .expect_get_seasons()
        .times(1)
        .returning(|_| Ok(vec![]));
    client
        .expect_get_watched_progress()
        .times(1)
        .returning(|_| Ok(empty_progress()));
    let service = service(&store, client);

    let result = service
        .sync_shows(vec![show_id, show_id, show_id], options(2), None)
        .await
        .unwrap();

    assert_eq!(result.total_shows, 1);
    assert_eq!(result.success_count, 1);
}

#[tokio::test]
async fn test_partial_failure_does_not_block_siblings() {
    let store = test_store();
    let good_id = seed_show(&store, 1388, "Breaking Bad");
    let bad_id = seed_show(&store, 60300, "Flaky Show");

    let mut client = MockRemoteClient::new();
    mock_full_pipeline(&mut client, 1388);
    client
        .expect_get_show()
        .withf(|id| *id == 60300)
        .returning(|_| Err(SyncError::Http(500)));
    let service = service(&store, client);

    let result = service
        .sync_shows(vec![good_id, bad_id], options(2), None)
        .await
        .unwrap();

    assert_eq!(result.success_count, 1);
    assert_eq!(result.failed_shows.len(), 1);
    assert_eq!(result.failed_shows[0].0, bad_id);
    assert!(matches!(result.failed_shows[0].1, SyncError::Http(500)));

    // The healthy show is fully persisted despite its sibling failing
    assert_eq!(store.episode_repo.count_by_show(good_id).unwrap(), 3);
}

#[tokio::test]
async fn test_unknown_show_id_fails_with_not_found() {
    let store = test_store();
    let service = service(&store, MockRemoteClient::new());

    let result = service
        .sync_shows(vec![Uuid::new_v4()], options(1), None)
        .await
        .unwrap();

    assert_eq!(result.success_count, 0);
    assert_eq!(result.failed_shows.len(), 1);
    assert!(matches!(result.failed_shows[0].1, SyncError::NotFound));
}

#[tokio::test]
async fn test_progress_callback_reports_completion() {
    let store = test_store();
    let show_id = seed_show(&store, 1388, "Breaking Bad");

    let mut client = MockRemoteClient::new();
    mock_full_pipeline(&mut client, 1388);
    let service = service(&store, client);

    let snapshots: Arc<Mutex<Vec<SyncProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&snapshots);
    let callback = Arc::new(move |progress: SyncProgress| {
        sink.lock().unwrap().push(progress);
    });

    service
        .sync_shows(vec![show_id], options(1), Some(callback))
        .await
        .unwrap();

    let snapshots = snapshots.lock().unwrap();
    assert!(snapshots
        .iter()
        .any(|p| matches!(p.phase, SyncPhase::SyncingEpisodes { season: 1 })));

    let last = snapshots.last().unwrap();
    assert_eq!(last.phase, SyncPhase::Completed);
    assert_eq!(last.completed, 1);
    assert_eq!(last.total, 1);
}

#[tokio::test]
async fn test_import_show_is_keyed_by_remote_id() {
    let store = test_store();

    let mut client = MockRemoteClient::new();
    client
        .expect_get_show()
        .returning(|_| Ok(show_dto(1388, "Breaking Bad")));
    let service = service(&store, client);

    let first = service.import_show(1388).await.unwrap();
    let second = service.import_show(1388).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.show_repo.list_all().unwrap().len(), 1);
}

#[tokio::test]
async fn test_sync_all_watched_imports_unknown_shows() {
    let store = test_store();

    let mut client = MockRemoteClient::new();
    client.expect_get_all_watched_shows().returning(|| {
        Ok(vec![WatchedShowDto {
            show: show_dto(1388, "Breaking Bad"),
            plays: Some(62),
            last_watched_at: Some(instant("2021-06-17T05:05:41Z")),
        }])
    });
    mock_full_pipeline(&mut client, 1388);
    let service = service(&store, client);

    let result = service
        .sync_all_watched(options(2), None)
        .await
        .unwrap();

    assert_eq!(result.success_count, 1);
    let show = store.show_repo.find_by_trakt_id(1388).unwrap().unwrap();
    assert_eq!(store.episode_repo.count_by_show(show.id).unwrap(), 3);
}

#[tokio::test]
async fn test_store_unavailable_aborts_whole_batch() {
    use r2d2_sqlite::SqliteConnectionManager;
    use std::time::Duration;

    let dir = tempfile::TempDir::new().unwrap();
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .connection_timeout(Duration::from_millis(100))
        .build(SqliteConnectionManager::file(dir.path().join("test.db")))
        .unwrap();
    let pool = Arc::new(pool);

    let show_id = {
        let conn = pool.get().unwrap();
        crate::db::initialize_database(&conn).unwrap();
        drop(conn);

        let show_repo = SqliteShowRepository::new(Arc::clone(&pool));
        let show = Show::new(1388, "Breaking Bad".to_string());
        show_repo.save(&show).unwrap();
        show.id
    };

    let service = SyncService::new(
        Arc::new(SqliteShowRepository::new(Arc::clone(&pool))),
        Arc::new(SqliteEpisodeRepository::new(Arc::clone(&pool))),
        Arc::new(SqliteMovieRepository::new(Arc::clone(&pool))),
        Arc::new(MockRemoteClient::new()),
    );

    // Hold the pool's only connection so every checkout times out
    let _held = pool.get().unwrap();

    let err = service
        .sync_shows(vec![show_id], options(1), None)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::StoreUnavailable(_)));
}

#[tokio::test]
async fn test_sync_watched_movies_preserves_local_instant() {
    let store = test_store();

    let mut local = Movie::new(12601, "Heat".to_string());
    local.watched_at = Some(instant("2019-08-01T21:00:00Z"));
    store.movie_repo.save(&local).unwrap();

    let mut client = MockRemoteClient::new();
    client.expect_get_watched_movies().returning(|| {
        Ok(vec![WatchedMovieDto {
            movie: MovieDto {
                title: "Heat".to_string(),
                year: Some(1995),
                ids: IdsDto {
                    trakt: 12601,
                    ..Default::default()
                },
                overview: None,
                runtime: Some(170),
                images: None,
            },
            plays: Some(1),
            // Remote list without a watch instant must not clear ours
            last_watched_at: None,
        }])
    });
    let service = service(&store, client);

    let count = service.sync_watched_movies().await.unwrap();
    assert_eq!(count, 1);

    let movie = store.movie_repo.find_by_trakt_id(12601).unwrap().unwrap();
    assert_eq!(movie.id, local.id);
    assert_eq!(movie.year, Some(1995));
    assert_eq!(movie.watched_at, Some(instant("2019-08-01T21:00:00Z")));
}
