// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential store tests for the memory and file backends.

use fitcoach_client::models::StoredCredentials;
use fitcoach_client::{ApiError, CredentialPair, CredentialStore, FileSlots, UserProfile};

mod common;
use common::FailingSlots;

fn sample_profile() -> UserProfile {
    UserProfile {
        id: "42".to_string(),
        first_name: "Sam".to_string(),
        last_name: "Coach".to_string(),
        email: Some("sam@example.com".to_string()),
        profile_image: Some("profiles/42.jpg".to_string()),
    }
}

#[tokio::test]
async fn test_empty_store_loads_nothing() {
    let store = CredentialStore::in_memory();
    assert_eq!(store.load().await, StoredCredentials::default());
}

#[tokio::test]
async fn test_clear_is_idempotent() {
    let store = CredentialStore::in_memory();
    store
        .save(&CredentialPair::new("at-1", "rt-1"))
        .await
        .unwrap();
    store.save_profile(&sample_profile()).await.unwrap();

    store.clear().await.unwrap();
    let once = store.load().await;
    store.clear().await.unwrap();
    let twice = store.load().await;

    assert_eq!(once, StoredCredentials::default());
    assert_eq!(once, twice);
}

#[tokio::test]
async fn test_save_overwrites_previous_pair() {
    let store = CredentialStore::in_memory();
    store
        .save(&CredentialPair::new("at-1", "rt-1"))
        .await
        .unwrap();
    store
        .save(&CredentialPair::new("at-2", "rt-2"))
        .await
        .unwrap();

    assert_eq!(
        store.load().await.pair(),
        Some(CredentialPair::new("at-2", "rt-2"))
    );
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = CredentialStore::new(FileSlots::new(dir.path()));
        store
            .save(&CredentialPair::new("at-file", "rt-file"))
            .await
            .unwrap();
        store.save_profile(&sample_profile()).await.unwrap();
        assert_eq!(store.backend_name(), "file");
    }

    // A fresh instance over the same directory sees the same session.
    let reopened = CredentialStore::new(FileSlots::new(dir.path()));
    let loaded = reopened.load().await;
    assert_eq!(loaded.access_token.as_deref(), Some("at-file"));
    assert_eq!(loaded.refresh_token.as_deref(), Some("rt-file"));
    assert_eq!(loaded.cached_profile, Some(sample_profile()));

    reopened.clear().await.unwrap();
    reopened.clear().await.unwrap();
    assert_eq!(reopened.load().await, StoredCredentials::default());
}

#[tokio::test]
async fn test_file_store_clear_on_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = CredentialStore::new(FileSlots::new(dir.path().join("never-created")));
    store.clear().await.unwrap();
    assert_eq!(store.load().await, StoredCredentials::default());
}

#[tokio::test]
async fn test_unreadable_profile_does_not_hide_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let slots = FileSlots::new(dir.path());
    let store = CredentialStore::new(FileSlots::new(dir.path()));

    store
        .save(&CredentialPair::new("at-1", "rt-1"))
        .await
        .unwrap();
    // Valid slot encoding, but not a profile.
    fitcoach_client::SlotStorage::set(&slots, "cachedUserProfile", "{\"oops\": true}")
        .await
        .unwrap();

    let loaded = store.load().await;
    assert_eq!(loaded.access_token.as_deref(), Some("at-1"));
    assert!(loaded.cached_profile.is_none());
}

#[tokio::test]
async fn test_corrupt_token_slot_loads_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let store = CredentialStore::new(FileSlots::new(dir.path()));
    store
        .save(&CredentialPair::new("at-1", "rt-1"))
        .await
        .unwrap();

    std::fs::write(dir.path().join("accessToken.slot"), "*** garbage ***").unwrap();

    let loaded = store.load().await;
    assert!(loaded.access_token.is_none());
    assert_eq!(loaded.refresh_token.as_deref(), Some("rt-1"));
    assert!(loaded.pair().is_none());
}

#[tokio::test]
async fn test_save_stops_at_first_failed_write() {
    let slots = FailingSlots::new();
    let store = CredentialStore::new(slots.clone());
    store
        .save(&CredentialPair::new("at-1", "rt-1"))
        .await
        .unwrap();

    slots.fail_writes_to("accessToken");
    let err = store
        .save(&CredentialPair::new("at-2", "rt-2"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Storage(ref msg) if msg.contains("accessToken")));
    // The refresh token slot was never written.
    assert_eq!(
        store.load().await.pair(),
        Some(CredentialPair::new("at-1", "rt-1"))
    );
}

#[tokio::test]
async fn test_save_reports_partial_write() {
    let slots = FailingSlots::new();
    let store = CredentialStore::new(slots.clone());
    store
        .save(&CredentialPair::new("at-1", "rt-1"))
        .await
        .unwrap();

    slots.fail_writes_to("refreshToken");
    let err = store
        .save(&CredentialPair::new("at-2", "rt-2"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Storage(ref msg) if msg.contains("refreshToken")));
    let loaded = store.load().await;
    assert_eq!(loaded.access_token.as_deref(), Some("at-2"));
    assert_eq!(loaded.refresh_token.as_deref(), Some("rt-1"));
}

#[tokio::test]
async fn test_clear_attempts_every_slot_and_reports_first_error() {
    let slots = FailingSlots::new();
    let store = CredentialStore::new(slots.clone());
    store
        .save(&CredentialPair::new("at-1", "rt-1"))
        .await
        .unwrap();
    store.save_profile(&sample_profile()).await.unwrap();

    slots.fail_removes_of("accessToken");
    slots.fail_removes_of("cachedUserProfile");
    let err = store.clear().await.unwrap_err();

    assert!(matches!(err, ApiError::Storage(ref msg) if msg.contains("accessToken")));
    assert_eq!(
        slots.remove_calls(),
        vec!["accessToken", "refreshToken", "cachedUserProfile"]
    );

    let loaded = store.load().await;
    assert_eq!(loaded.access_token.as_deref(), Some("at-1"));
    assert!(loaded.refresh_token.is_none());
    assert_eq!(loaded.cached_profile, Some(sample_profile()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_on_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = CredentialStore::new(FileSlots::new(dir.path()));

    for round in 0..50 {
        let first = CredentialPair::new(format!("at-a{}", round), format!("rt-a{}", round));
        let second = CredentialPair::new(format!("at-b{}", round), format!("rt-b{}", round));

        let (a, b) = tokio::join!(
            tokio::spawn({
                let store = store.clone();
                let pair = first.clone();
                async move { store.save(&pair).await }
            }),
            tokio::spawn({
                let store = store.clone();
                let pair = second.clone();
                async move { store.save(&pair).await }
            })
        );
        a.unwrap().unwrap();
        b.unwrap().unwrap();

        // Whole pairs only; never one writer's access with the other's refresh.
        let loaded = store.load().await.pair().unwrap();
        assert!(loaded == first || loaded == second, "mixed pair in round {}", round);
    }

    let leftovers = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);
}
