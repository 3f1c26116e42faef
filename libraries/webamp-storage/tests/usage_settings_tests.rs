//! Usage statistics and settings integration tests


use test_helpers::TestStorage;
use webamp_core::{KeyBindings, PlaylistId, UsageRecorder};
use webamp_storage::{AppSettings, Theme, ViewMode};

// ===== Usage =====

#[tokio::test]
async fn test_recorder_accumulates_stats() {
    let db = TestStorage::new().await;
    let id = PlaylistId::new("mix");

    db.storage.record_play_started(&id).await;
    db.storage.record_play_started(&id).await;
    db.storage.record_listened_seconds(&id, 10).await;
    db.storage.record_listened_seconds(&id, 10).await;

    let stats = db.storage.usage_stats(&id).await.unwrap();
    assert_eq!(stats.play_count, 2);
    assert_eq!(stats.listen_time, 20);
    assert!(stats.last_played > 0);
}

#[tokio::test]
async fn test_unplayed_playlist_has_zero_stats() {
    let db = TestStorage::new().await;
    let stats = db.storage.usage_stats(&PlaylistId::new("never")).await.unwrap();

    assert_eq!(stats.play_count, 0);
    assert_eq!(stats.score(), 0.0);
}

#[tokio::test]
async fn test_top_playlists_ranked_by_score() {
    let db = TestStorage::new().await;
    db.storage.create_playlist("Quiet", None).await.unwrap();
    let popular = db.storage.create_playlist("Popular", None).await.unwrap();
    let long = db.storage.create_playlist("Long", None).await.unwrap();

    // 1 play = 10 points; 20 minutes = 20 points
    db.storage.record_play_started(&popular.id).await;
    db.storage.record_play_started(&popular.id).await;
    db.storage.record_play_started(&popular.id).await;
    db.storage.record_listened_seconds(&long.id, 1200).await;

    let top = db.storage.top_playlists(3).await.unwrap();
    let names: Vec<_> = top.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Popular", "Long", "Quiet"]);

    let top_one = db.storage.top_playlists(1).await.unwrap();
    assert_eq!(top_one[0].id, popular.id);
}

// ===== Settings =====

#[tokio::test]
async fn test_settings_defaults() {
    let db = TestStorage::new().await;

    assert_eq!(db.storage.settings().await.unwrap(), AppSettings::default());
    assert_eq!(db.storage.view_mode().await.unwrap(), ViewMode::Grid);
    assert_eq!(db.storage.shortcuts().await.unwrap(), KeyBindings::default());
    assert_eq!(db.storage.token().await.unwrap(), None);
}

#[tokio::test]
async fn test_token_round_trip() {
    let db = TestStorage::new().await;

    db.storage.set_token("secret").await.unwrap();
    assert_eq!(db.storage.token().await.unwrap().as_deref(), Some("secret"));

    db.storage.remove_token().await.unwrap();
    assert_eq!(db.storage.token().await.unwrap(), None);
}

#[tokio::test]
async fn test_update_merges_settings() {
    let db = TestStorage::new().await;
    db.storage.set_view_mode(ViewMode::List).await.unwrap();

    let merged = db
        .storage
        .update_settings(AppSettings {
            theme: Some(Theme::Dark),
            ..AppSettings::default()
        })
        .await
        .unwrap();

    assert_eq!(merged.theme, Some(Theme::Dark));
    assert_eq!(merged.view_mode, Some(ViewMode::List));
}

#[tokio::test]
async fn test_custom_shortcuts_and_clear() {
    let db = TestStorage::new().await;
    let bindings = KeyBindings {
        play_pause: "k".to_string(),
        ..KeyBindings::default()
    };

    db.storage.set_shortcuts(bindings.clone()).await.unwrap();
    assert_eq!(db.storage.shortcuts().await.unwrap(), bindings);

    db.storage.clear_settings().await.unwrap();
    assert_eq!(db.storage.shortcuts().await.unwrap(), KeyBindings::default());
}
