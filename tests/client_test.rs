//! Spotify client and fetch stages against a mock Web API.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dancefloor::config::Config;
use dancefloor::pipeline::{MAX_IN_FLIGHT, fetch_audio_features, fetch_playlist_pages, rank_library};
use dancefloor::spotify::{FetchError, SpotifyClient};
use dancefloor::types::{FeatureEntry, Playlist};
use serde_json::{Value, json};
use wiremock::matchers::{bearer_token, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn client_for(server: &MockServer, max_attempts: u32) -> SpotifyClient {
    SpotifyClient::new(Arc::new(Config {
        client_id: "client".to_string(),
        api_url: server.uri(),
        token_url: format!("{}/api/token", server.uri()),
        max_attempts,
        retry_delay: Duration::from_millis(1),
        max_retry_after: Duration::from_secs(2),
        request_timeout: Duration::from_secs(5),
        ..Config::default()
    }))
}

fn playlist(id: &str, name: &str, item_count: u64) -> Playlist {
    Playlist {
        name: name.to_string(),
        id: id.to_string(),
        item_count,
        href: String::new(),
    }
}

fn items_page(prefix: &str, count: usize) -> Value {
    let items: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "track": {
                    "id": format!("{}{}", prefix, i),
                    "name": format!("{} song {}", prefix, i),
                    "album": { "name": "Album" },
                    "artists": [{ "name": "Artist" }]
                }
            })
        })
        .collect();
    json!({ "name": prefix, "items": items })
}

mod decoding {
    use super::*;

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server, 1).get_user("token").await;

        assert_eq!(
            result.unwrap_err(),
            FetchError::Status {
                status: 500,
                message: "boom".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_non_json_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let result = client_for(&server, 1).get_user("token").await;
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn test_null_body_is_empty_body_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        let result = client_for(&server, 3).get_user("token").await;
        assert_eq!(result.unwrap_err(), FetchError::EmptyBody);
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server, 3).get_user("token").await;
        assert!(matches!(result, Err(FetchError::Status { status: 401, .. })));
    }
}

mod retries {
    use super::*;

    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "dancer" })))
            .expect(1)
            .mount(&server)
            .await;

        let user = client_for(&server, 3).get_user("token").await.unwrap();
        assert_eq!(user.id, "dancer");
    }

    #[tokio::test]
    async fn test_server_error_is_retried_until_attempts_run_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let result = client_for(&server, 3).get_user("token").await;
        assert!(matches!(result, Err(FetchError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_request_timeout_is_applied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": "dancer" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = SpotifyClient::new(Arc::new(Config {
            client_id: "client".to_string(),
            api_url: server.uri(),
            max_attempts: 1,
            request_timeout: Duration::from_millis(200),
            ..Config::default()
        }));

        let started = Instant::now();
        let result = client.get_user("token").await;

        assert!(matches!(result, Err(FetchError::Network(_))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_excessive_retry_after_gives_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "3600"))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server, 3).get_user("token").await;
        assert_eq!(
            result.unwrap_err(),
            FetchError::RateLimited {
                retry_after_secs: 3600
            }
        );
    }
}

mod requests {
    use super::*;

    #[tokio::test]
    async fn test_playlist_items_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/playlists/p1/tracks"))
            .and(bearer_token("token"))
            .and(query_param("offset", "50"))
            .and(query_param("limit", "50"))
            .and(query_param(
                "fields",
                "name,items(track(id,name,album(name),artists(name)))",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(items_page("p1_", 2)))
            .expect(1)
            .mount(&server)
            .await;

        let page = client_for(&server, 1)
            .list_playlist_items("token", "p1", 50)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn test_audio_features_query_and_nulls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/audio-features"))
            .and(query_param("ids", "a,b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "audio_features": [{ "id": "a", "danceability": 0.7 }, null]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let features = client_for(&server, 1)
            .get_audio_features("token", &["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        assert_eq!(features.len(), 2);
        assert!(matches!(&features[0], FeatureEntry::Found(m) if m.danceability == Some(0.7)));
        assert_eq!(features[1], FeatureEntry::Missing);
    }

    #[tokio::test]
    async fn test_refresh_keeps_old_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "fresh",
                "expires_in": 3600,
                "scope": "playlist-read-private"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = client_for(&server, 1).refresh("old-refresh").await.unwrap();

        assert_eq!(token.access_token, "fresh");
        assert_eq!(token.refresh_token.as_deref(), Some("old-refresh"));
        assert!(!token.needs_refresh(dancefloor::utils::now_timestamp()));
    }

    #[test]
    fn test_authorize_url_carries_pkce_and_state() {
        let client = SpotifyClient::new(Arc::new(Config {
            client_id: "client".to_string(),
            ..Config::default()
        }));

        let url = client.authorize_url("xyz", "challenge").unwrap();

        assert!(url.starts_with("https://accounts.spotify.com/authorize?"));
        assert!(url.contains("client_id=client"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("code_challenge=challenge"));
        assert!(url.contains("state=xyz"));
    }
}

mod fetch_stages {
    use super::*;

    #[tokio::test]
    async fn test_pages_cover_every_offset_in_order() {
        let server = MockServer::start().await;
        for (offset, count) in [("0", 50), ("50", 50), ("100", 20)] {
            Mock::given(method("GET"))
                .and(path("/playlists/p1/tracks"))
                .and(query_param("offset", offset))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(items_page(&format!("o{}_", offset), count)),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = client_for(&server, 1);
        let fetch = fetch_playlist_pages(&client, "token", &[playlist("p1", "Party", 120)]).await;

        assert_eq!(fetch.requested, 3);
        assert_eq!(fetch.failed, 0);
        let offsets: Vec<u64> = fetch.pages.iter().map(|p| p.offset).collect();
        assert_eq!(offsets, vec![0, 50, 100]);
        assert_eq!(fetch.pages.iter().map(|p| p.items.len()).sum::<usize>(), 120);
    }

    #[tokio::test]
    async fn test_failed_page_becomes_empty_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/playlists/ok/tracks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(items_page("ok_", 3)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/playlists/broken/tracks"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server, 1);
        let fetch = fetch_playlist_pages(
            &client,
            "token",
            &[playlist("broken", "Broken", 10), playlist("ok", "Fine", 3)],
        )
        .await;

        assert_eq!(fetch.requested, 2);
        assert_eq!(fetch.failed, 1);
        assert_eq!(fetch.pages[0].playlist_name, "Broken");
        assert!(fetch.pages[0].items.is_empty());
        assert_eq!(fetch.pages[1].items.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_playlist_issues_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, 1);
        let fetch = fetch_playlist_pages(&client, "token", &[playlist("p", "Empty", 0)]).await;

        assert_eq!(fetch.requested, 0);
        assert!(fetch.pages.is_empty());
    }

    #[tokio::test]
    async fn test_features_are_batched_by_hundred() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/audio-features"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "audio_features": [] })))
            .expect(3)
            .mount(&server)
            .await;

        let ids: Vec<String> = (0..250).map(|i| format!("t{}", i)).collect();
        let fetch = fetch_audio_features(&client_for(&server, 1), "token", &ids).await;

        assert_eq!(fetch.batches, 3);
        assert_eq!(fetch.failed_batches, 0);
        assert_eq!(fetch.missing, 250);
        assert!(fetch.features.is_empty());
    }

    #[tokio::test]
    async fn test_failed_feature_batch_is_counted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/audio-features"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetch = fetch_audio_features(&client_for(&server, 1), "token", &["a".to_string()]).await;

        assert_eq!(fetch.batches, 1);
        assert_eq!(fetch.failed_batches, 1);
        assert_eq!(fetch.missing, 0);
    }

    #[tokio::test]
    async fn test_malformed_feature_entry_only_drops_itself() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/audio-features"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "audio_features": [
                    { "id": "a", "danceability": 0.9 },
                    { "danceability": 0.5 },
                    { "id": "c", "danceability": 0.1 }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ids = ["a".to_string(), "b".to_string(), "c".to_string()];
        let fetch = fetch_audio_features(&client_for(&server, 1), "token", &ids).await;

        assert_eq!(fetch.failed_batches, 0);
        assert_eq!(fetch.malformed, 1);
        assert_eq!(fetch.missing, 0);
        let found: Vec<&str> = fetch.features.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(found, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_rank_library_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/playlists"))
            .and(query_param("limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    { "id": "p1", "name": "Party", "href": "h1", "tracks": { "total": 3 } },
                    { "id": "p2", "name": "Gym", "href": "h2", "tracks": { "total": 1 } },
                    { "id": "p3", "name": "Broken" }
                ],
                "total": 3
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/playlists/p1/tracks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    { "track": { "id": "a", "name": "A", "album": { "name": "X" }, "artists": [{ "name": "Y" }] } },
                    { "track": { "id": "b", "name": "B", "album": { "name": "X" }, "artists": [{ "name": "Y" }] } },
                    { "track": { "id": "c", "name": "C", "album": { "name": "X" }, "artists": [{ "name": "Y" }] } }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/playlists/p2/tracks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    { "track": { "id": "a", "name": "A", "album": { "name": "X" }, "artists": [{ "name": "Y" }] } }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/audio-features"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "audio_features": [
                    { "id": "a", "danceability": 0.5 },
                    null,
                    { "id": "c", "danceability": 0.9 }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ranking = rank_library(&client_for(&server, 1), "token").await.unwrap();
        let ids: Vec<&str> = ranking
            .songs
            .songs()
            .iter()
            .map(|s| s.track_id.as_str())
            .collect();

        assert_eq!(ids, vec!["c", "a"]);
        assert_eq!(ranking.songs.songs()[1].playlist_name, "Party");
        assert_eq!(ranking.report.playlists, 2);
        assert_eq!(ranking.report.pages_requested, 2);
        assert_eq!(ranking.report.unique_tracks, 3);
        assert_eq!(ranking.report.features_missing, 1);
        assert_eq!(ranking.report.unrankable, 1);
        assert!(!ranking.report.is_partial());
        assert!(!ranking.cached);
    }
}

mod concurrency {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    /// Answers every request after [`DELAY`] and records when each one arrived.
    struct SlowRecorder {
        body: Value,
        arrivals: Arc<Mutex<Vec<(Instant, String)>>>,
        query_key: &'static str,
    }

    impl Respond for SlowRecorder {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let value = request
                .url
                .query_pairs()
                .find(|(k, _)| k == self.query_key)
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default();
            self.arrivals.lock().unwrap().push((Instant::now(), value));
            ResponseTemplate::new(200)
                .set_body_json(self.body.clone())
                .set_delay(DELAY)
        }
    }

    /// Most arrivals inside any window shorter than [`DELAY`]. None of them can
    /// have been answered yet, so they were all in flight together.
    fn peak_in_flight(arrivals: &[(Instant, String)]) -> usize {
        let window = DELAY.mul_f64(0.9);
        let mut times: Vec<Instant> = arrivals.iter().map(|(t, _)| *t).collect();
        times.sort();
        (0..times.len())
            .map(|i| {
                times[i..]
                    .iter()
                    .take_while(|t| t.duration_since(times[i]) < window)
                    .count()
            })
            .max()
            .unwrap_or(0)
    }

    fn assert_send<T: Send>(_: &T) {}

    #[tokio::test]
    async fn test_fan_out_futures_are_send() {
        let server = MockServer::start().await;
        let client = client_for(&server, 1);
        let playlists = vec![playlist("p1", "Party", 0)];
        let ids: Vec<String> = Vec::new();

        let pages = fetch_playlist_pages(&client, "token", &playlists);
        assert_send(&pages);
        let features = fetch_audio_features(&client, "token", &ids);
        assert_send(&features);
        let ranking = rank_library(&client, "token");
        assert_send(&ranking);

        assert_eq!(pages.await.requested, 0);
        assert_eq!(features.await.batches, 0);
        drop(ranking);

        // spawned tasks require Send
        let handle = tokio::spawn(async move {
            fetch_playlist_pages(&client, "token", &playlists).await.requested
        });
        assert_eq!(handle.await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_page_requests_stay_within_limit() {
        let server = MockServer::start().await;
        let arrivals = Arc::new(Mutex::new(Vec::new()));
        Mock::given(method("GET"))
            .and(path("/playlists/p1/tracks"))
            .respond_with(SlowRecorder {
                body: json!({ "items": [] }),
                arrivals: arrivals.clone(),
                query_key: "offset",
            })
            .mount(&server)
            .await;

        let client = client_for(&server, 1);
        let fetch = fetch_playlist_pages(&client, "token", &[playlist("p1", "Big", 1500)]).await;

        assert_eq!(fetch.requested, 30);
        assert_eq!(fetch.failed, 0);

        let arrivals = arrivals.lock().unwrap();
        let peak = peak_in_flight(&arrivals);
        assert!(peak <= MAX_IN_FLIGHT, "{} requests in flight", peak);
        assert!(peak > 1);

        let mut offsets: Vec<u64> = arrivals.iter().map(|(_, o)| o.parse().unwrap()).collect();
        offsets.sort();
        let expected: Vec<u64> = (0..30).map(|i| i * 50).collect();
        assert_eq!(offsets, expected);
    }

    #[tokio::test]
    async fn test_feature_batches_stay_within_limit() {
        let server = MockServer::start().await;
        let arrivals = Arc::new(Mutex::new(Vec::new()));
        Mock::given(method("GET"))
            .and(path("/audio-features"))
            .respond_with(SlowRecorder {
                body: json!({ "audio_features": [] }),
                arrivals: arrivals.clone(),
                query_key: "ids",
            })
            .mount(&server)
            .await;

        let ids: Vec<String> = (0..2500).map(|i| format!("t{}", i)).collect();
        let fetch = fetch_audio_features(&client_for(&server, 1), "token", &ids).await;

        assert_eq!(fetch.batches, 25);
        assert_eq!(fetch.failed_batches, 0);

        let arrivals = arrivals.lock().unwrap();
        assert_eq!(arrivals.len(), 25);
        let peak = peak_in_flight(&arrivals);
        assert!(peak <= MAX_IN_FLIGHT, "{} requests in flight", peak);

        let mut firsts: Vec<&str> = arrivals
            .iter()
            .filter_map(|(_, ids)| ids.split(',').next())
            .collect();
        firsts.sort();
        firsts.dedup();
        assert_eq!(firsts.len(), 25);
    }
}
