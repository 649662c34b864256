use chrono::Duration;
use drill_core::time::fixed_now;
use storage::repository::{KeyValueStore, ResponseCache, Storage};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_kv_roundtrip_and_overwrite() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert_eq!(KeyValueStore::get(&repo, "pinyin_xp").await.unwrap(), None);

    repo.set("pinyin_xp", "15").await.unwrap();
    repo.set("pinyin_last_visit", "2023-11-14").await.unwrap();
    repo.set("pinyin_xp", "20").await.unwrap();

    assert_eq!(
        KeyValueStore::get(&repo, "pinyin_xp").await.unwrap(),
        Some("20".to_string())
    );
    assert_eq!(
        KeyValueStore::get(&repo, "pinyin_last_visit").await.unwrap(),
        Some("2023-11-14".to_string())
    );
}

#[tokio::test]
async fn sqlite_response_cache_replaces_entries() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_cache?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let first = fixed_now();
    let later = first + Duration::minutes(5);
    repo.put("/api/progress", "{\"items\":[]}", first)
        .await
        .unwrap();
    repo.put("/api/progress", "{\"items\":[1]}", later)
        .await
        .unwrap();

    let cached = ResponseCache::get(&repo, "/api/progress")
        .await
        .unwrap()
        .expect("cached entry");
    assert_eq!(cached.body, "{\"items\":[1]}");
    assert_eq!(cached.stored_at, later);
    assert!(
        ResponseCache::get(&repo, "/index.html")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.set("pinyin_streak", "4").await.unwrap();
    repo.migrate().await.expect("second migrate");

    assert_eq!(
        KeyValueStore::get(&repo, "pinyin_streak").await.unwrap(),
        Some("4".to_string())
    );
}

#[tokio::test]
async fn storage_sqlite_wires_both_stores() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");

    storage.kv.set("pinyin_xp", "5").await.unwrap();
    storage
        .responses
        .put("/api/mappings", "{}", fixed_now())
        .await
        .unwrap();

    assert_eq!(
        storage.kv.get("pinyin_xp").await.unwrap(),
        Some("5".to_string())
    );
    assert!(storage.responses.get("/api/mappings").await.unwrap().is_some());
}
