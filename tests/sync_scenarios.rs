// Scenario tests for the status sync engine and token refresher,
// exercised through the crate's public API against fake provider
// clients and the in-memory store. No network, no Postgres.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use spotify_status_sync::db::CredentialStore;
use spotify_status_sync::db::memory::MemoryStore;
use spotify_status_sync::db::models::ProviderCredential;
use spotify_status_sync::error::AppError;
use spotify_status_sync::slack::client::{SlackApi, SlackProfile};
use spotify_status_sync::spotify::client::{SpotifyApi, TokenGrant};
use spotify_status_sync::spotify::models::PlaybackSnapshot;
use spotify_status_sync::sync::engine::SyncEngine;
use spotify_status_sync::sync::refresh::TokenRefresher;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct ScriptedSpotify {
    playing_by_token: Mutex<HashMap<String, Option<PlaybackSnapshot>>>,
    grants_by_refresh: Mutex<HashMap<String, TokenGrant>>,
}

impl ScriptedSpotify {
    fn playing(&self, access_token: &str, snapshot: Option<PlaybackSnapshot>) {
        self.playing_by_token
            .lock()
            .unwrap()
            .insert(access_token.to_string(), snapshot);
    }

    fn grant(&self, refresh_token: &str, grant: TokenGrant) {
        self.grants_by_refresh
            .lock()
            .unwrap()
            .insert(refresh_token.to_string(), grant);
    }
}

#[async_trait]
impl SpotifyApi for ScriptedSpotify {
    async fn exchange_token(
        &self,
        code_or_refresh: &str,
        _is_refresh: bool,
    ) -> Result<TokenGrant, AppError> {
        self.grants_by_refresh
            .lock()
            .unwrap()
            .get(code_or_refresh)
            .cloned()
            .ok_or(AppError::SpotifyUnauthorized)
    }

    async fn currently_playing(
        &self,
        access_token: &str,
    ) -> Result<Option<PlaybackSnapshot>, AppError> {
        let playing = self.playing_by_token.lock().unwrap();
        match playing.get(access_token) {
            Some(snapshot) => Ok(snapshot.clone()),
            // Token the provider no longer recognizes.
            None => Err(AppError::SpotifyUnauthorized),
        }
    }
}

#[derive(Default)]
struct RecordingSlack {
    profiles: Mutex<HashMap<String, SlackProfile>>,
    writes: AtomicUsize,
}

#[async_trait]
impl SlackApi for RecordingSlack {
    async fn get_profile(&self, _token: &str, user_id: &str) -> Result<SlackProfile, AppError> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_profile(&self, token: &str, profile: &SlackProfile) -> Result<(), AppError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        // Tests hand each user their own id as the token.
        self.profiles
            .lock()
            .unwrap()
            .insert(token.to_string(), profile.clone());
        Ok(())
    }
}

async fn connect_user(store: &MemoryStore, user_id: &str, access_token: &str, refresh_token: &str) {
    store.insert_account(user_id, Some(user_id));
    store
        .upsert_credential(
            user_id,
            &ProviderCredential {
                spotify_id: format!("spotify-{}", user_id),
                access_token: access_token.to_string(),
                refresh_token: refresh_token.to_string(),
                expires_at: Utc::now() + Duration::minutes(10),
            },
        )
        .await
        .unwrap();
}

fn track(title: &str, artists: &[&str]) -> PlaybackSnapshot {
    PlaybackSnapshot::Track {
        title: title.to_string(),
        artists: artists.iter().map(|a| a.to_string()).collect(),
    }
}

#[tokio::test]
async fn full_listening_session_start_change_stop() {
    let store = Arc::new(MemoryStore::new());
    let spotify = Arc::new(ScriptedSpotify::default());
    let slack = Arc::new(RecordingSlack::default());
    connect_user(&store, "U1", "tok1", "refresh1").await;

    let engine = SyncEngine::new(store.clone(), spotify.clone(), slack.clone());

    // Start playing.
    spotify.playing("tok1", Some(track("Song", &["A", "B"])));
    engine.run_tick().await.unwrap();
    assert_eq!(
        slack.profiles.lock().unwrap().get("U1").unwrap().status_text,
        "Listening to \"Song\" by A, B on Spotify"
    );

    // Same song: two more ticks, still exactly one write total.
    engine.run_tick().await.unwrap();
    engine.run_tick().await.unwrap();
    assert_eq!(slack.writes.load(Ordering::SeqCst), 1);

    // Track change.
    spotify.playing("tok1", Some(track("Next Song", &["C"])));
    engine.run_tick().await.unwrap();
    assert_eq!(
        slack.profiles.lock().unwrap().get("U1").unwrap().status_text,
        "Listening to \"Next Song\" by C on Spotify"
    );

    // Stop playing: status and emoji cleared.
    spotify.playing("tok1", None);
    engine.run_tick().await.unwrap();
    let cleared = slack.profiles.lock().unwrap().get("U1").cloned().unwrap();
    assert_eq!(cleared.status_text, "");
    assert_eq!(cleared.status_emoji, "");
    assert_eq!(slack.writes.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn refresh_then_sync_picks_up_new_token_without_coordination() {
    let store = Arc::new(MemoryStore::new());
    let spotify = Arc::new(ScriptedSpotify::default());
    let slack = Arc::new(RecordingSlack::default());
    connect_user(&store, "U1", "stale_token", "refresh1").await;

    // The provider only recognizes the post-refresh access token.
    spotify.grant(
        "refresh1",
        TokenGrant {
            access_token: "fresh_token".to_string(),
            refresh_token: None,
            expires_in_seconds: 3600,
        },
    );
    spotify.playing("fresh_token", Some(track("Song", &["A"])));

    let refresher = TokenRefresher::new(store.clone(), spotify.clone(), Duration::minutes(20));
    let report = refresher.run_once().await.unwrap();
    assert_eq!(report.refreshed, 1);

    // The engine re-reads the store each tick, so the refreshed token is
    // picked up with no explicit hand-off.
    let engine = SyncEngine::new(store.clone(), spotify, slack.clone());
    let tick = engine.run_tick().await.unwrap();
    assert_eq!(tick.updated, 1);
    assert_eq!(tick.failures.len(), 0);
}

#[tokio::test]
async fn revoked_user_disappears_while_others_keep_syncing() {
    let store = Arc::new(MemoryStore::new());
    let spotify = Arc::new(ScriptedSpotify::default());
    let slack = Arc::new(RecordingSlack::default());
    connect_user(&store, "U_GONE", "revoked_tok", "r1").await;
    connect_user(&store, "U_OK", "tok_ok", "r2").await;

    // Only U_OK's token is known to the provider; U_GONE's reads as
    // unauthorized and must trigger teardown.
    spotify.playing("tok_ok", Some(track("Song", &["A"])));

    let engine = SyncEngine::new(store.clone(), spotify, slack.clone());
    let report = engine.run_tick().await.unwrap();

    assert_eq!(report.torn_down, 1);
    assert_eq!(report.updated, 1);
    assert!(!store.contains("U_GONE"));
    assert!(store.get_credential("U_GONE").await.unwrap().is_none());

    // Next tick: the torn-down user is no longer listed at all.
    let next = engine.run_tick().await.unwrap();
    assert_eq!(next.torn_down, 0);
    assert_eq!(next.unchanged, 1);
}

#[tokio::test]
async fn manual_status_is_never_clobbered() {
    let store = Arc::new(MemoryStore::new());
    let spotify = Arc::new(ScriptedSpotify::default());
    let slack = Arc::new(RecordingSlack::default());
    connect_user(&store, "U1", "tok1", "refresh1").await;

    slack.profiles.lock().unwrap().insert(
        "U1".to_string(),
        SlackProfile {
            status_text: "On vacation".to_string(),
            status_emoji: ":palm_tree:".to_string(),
            status_expiration: 0,
        },
    );
    spotify.playing("tok1", Some(track("Song", &["A"])));

    let engine = SyncEngine::new(store, spotify, slack.clone());
    let report = engine.run_tick().await.unwrap();

    assert_eq!(report.updated, 0);
    assert_eq!(report.unchanged, 1);
    assert_eq!(slack.writes.load(Ordering::SeqCst), 0);
    assert_eq!(
        slack.profiles.lock().unwrap().get("U1").unwrap().status_text,
        "On vacation"
    );
}
