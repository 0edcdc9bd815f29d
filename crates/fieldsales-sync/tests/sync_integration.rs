//! End-to-end tests for a signed-in session driving the sync engine.
//!
//! The remote store is mocked with wiremock; device storage lives in a
//! temporary directory.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use fieldsales_api::client::StoreClient;
use fieldsales_api::models::{AddressRecord, ContactRecord, SaveState, SavedItem};
use fieldsales_api::remote::FULL_ADDRESS_FIELD;
use fieldsales_sync::{
    AuthSession, ErrorKind, FileStorage, NotificationGenerator, NotificationPrefs, OfflineCache,
    SyncEngine, UserSession,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
}

fn client_for(server: &MockServer) -> StoreClient {
    StoreClient::builder(server.uri(), "test-token")
        .max_retries(0)
        .initial_backoff(Duration::from_millis(1))
        .build()
        .unwrap()
}

fn cafe() -> SavedItem {
    SavedItem::manual("Cafe A", AddressRecord::new("1 Main St", "Town", "", "", ""))
}

async fn mount_user(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/users/u-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_save(server: &MockServer, status: u16) {
    Mock::given(method("PUT"))
        .and(path("/users/u-1"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sign_in_writes_offline_copy() {
    let server = MockServer::start().await;
    mount_user(
        &server,
        json!({
            "uid": "u-1",
            "contact": {"name": "Sam Rep"},
            "savedItems": [{"id": "i-1", "name": "Cafe A", "saveState": "saved"}]
        }),
    )
    .await;
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::with_dir(dir.path().to_path_buf());

    let mut session = UserSession::new(client_for(&server), storage.clone());
    session.sign_in("u-1").await.unwrap();

    assert!(session.is_authenticated());
    assert_eq!(session.contact().unwrap().name.as_deref(), Some("Sam Rep"));
    let cache = OfflineCache::load(&storage).unwrap().expect("offline copy");
    assert_eq!(cache.user.saved_items.len(), 1);
    assert!(cache.last_sync.is_some());

    // A fresh session can start from the offline copy alone.
    let mut offline = UserSession::new(client_for(&server), storage);
    assert!(offline.restore_offline("u-1").unwrap());
    assert_eq!(offline.saved_items().unwrap().len(), 1);
    assert!(!offline.restore_offline("someone-else").unwrap());
}

#[tokio::test]
async fn test_sign_in_new_user_starts_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/u-1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let mut session = UserSession::new(
        client_for(&server),
        FileStorage::with_dir(dir.path().to_path_buf()),
    );
    let user = session.sign_in("u-1").await.unwrap();

    assert_eq!(user.uid, "u-1");
    assert!(user.saved_items.is_empty());
}

#[tokio::test]
async fn test_add_then_star_persists_user_document() {
    let server = MockServer::start().await;
    mount_user(&server, json!({"uid": "u-1"})).await;
    Mock::given(method("PUT"))
        .and(path("/users/u-1"))
        .and(body_partial_json(json!({"savedItems": [{"name": "Cafe A"}]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::with_dir(dir.path().to_path_buf());
    let client = client_for(&server);

    let mut session = UserSession::new(client.clone(), storage.clone());
    session.sign_in("u-1").await.unwrap();
    let mut engine = SyncEngine::new(client).with_clock(today);

    let added = engine.add(&mut session, cafe()).await.unwrap();
    assert_eq!(added.message, "Saved \"Cafe A\"");
    let starred = engine.toggle_star(&mut session, &added.item).await.unwrap();
    assert_eq!(starred.item.save_state, SaveState::Starred);

    let cache = OfflineCache::load(&storage).unwrap().unwrap();
    assert_eq!(cache.user.saved_items[0].save_state, SaveState::Starred);
    assert_eq!(cache.user.saved_items[0].date_saved, Some(today()));
}

#[tokio::test]
async fn test_failed_save_rolls_back_and_keeps_offline_copy() {
    let server = MockServer::start().await;
    mount_user(&server, json!({"uid": "u-1"})).await;
    mount_save(&server, 500).await;
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::with_dir(dir.path().to_path_buf());
    let client = client_for(&server);

    let mut session = UserSession::new(client.clone(), storage.clone());
    session.sign_in("u-1").await.unwrap();
    let mut engine = SyncEngine::new(client).with_clock(today);

    let err = engine.add(&mut session, cafe()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteSyncFailure);
    assert!(err.to_string().starts_with("Could not sync your changes: HTTP error 500"));
    assert!(session.saved_items().unwrap().is_empty());
    let cache = OfflineCache::load(&storage).unwrap().unwrap();
    assert!(cache.user.saved_items.is_empty());
}

#[tokio::test]
async fn test_report_new_item_posts_and_flags() {
    let server = MockServer::start().await;
    mount_user(&server, json!({"uid": "u-1", "contact": {"name": "Sam Rep"}})).await;
    mount_save(&server, 204).await;
    Mock::given(method("GET"))
        .and(path("/reported"))
        .and(query_param("field", FULL_ADDRESS_FIELD))
        .and(query_param("value", "1 Main St, Town"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"documents": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/reported"))
        .and(body_partial_json(json!({
            "name": "Cafe A",
            "reportedBy": {"name": "Sam Rep"},
            "dateReported": "2026-03-14"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "r-9"})))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let client = client_for(&server);

    let mut session = UserSession::new(client.clone(), FileStorage::with_dir(dir.path().to_path_buf()));
    session.sign_in("u-1").await.unwrap();
    let mut engine = SyncEngine::new(client).with_clock(today);
    let added = engine.add(&mut session, cafe()).await.unwrap();

    let receipt = engine.report_item(&mut session, &added.item.id).await.unwrap();

    assert_eq!(receipt.message, "Reported \"Cafe A\"");
    assert!(session.saved_items().unwrap()[0].is_reported);
    assert_eq!(engine.reported().len(), 1);
    assert_eq!(engine.reported()[0].id, "r-9");
}

#[tokio::test]
async fn test_load_reported_then_refresh_flags() {
    let server = MockServer::start().await;
    mount_user(
        &server,
        json!({
            "uid": "u-1",
            "savedItems": [{
                "id": "i-1",
                "name": "Cafe A",
                "saveState": "saved",
                "address": {"street": "1 Main St", "city": "Town", "fullAddress": "1 Main St, Town"}
            }]
        }),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/users/u-1"))
        .and(body_partial_json(json!({"savedItems": [{"isReported": true}]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reported"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [{
                "id": "r-1",
                "name": "Cafe A",
                "address": {"fullAddress": "1 MAIN ST, TOWN"},
                "dateReported": "2026-01-02"
            }]
        })))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let client = client_for(&server);

    let mut session = UserSession::new(client.clone(), FileStorage::with_dir(dir.path().to_path_buf()));
    session.sign_in("u-1").await.unwrap();
    let mut engine = SyncEngine::new(client).with_clock(today);

    assert_eq!(engine.load_reported().await.unwrap(), 1);
    assert_eq!(engine.refresh_local_reported_flags(&mut session).await.unwrap(), 1);
    assert!(session.saved_items().unwrap()[0].is_reported);
}

#[tokio::test]
async fn test_delete_drops_reminders() {
    let server = MockServer::start().await;
    mount_user(&server, json!({"uid": "u-1"})).await;
    mount_save(&server, 204).await;
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::with_dir(dir.path().to_path_buf());
    let client = client_for(&server);
    let reminders = Arc::new(NotificationGenerator::new(storage.clone()));

    let mut session = UserSession::new(client.clone(), storage);
    session.sign_in("u-1").await.unwrap();
    session.set_contact(ContactRecord::named("Sam Rep"));
    let old = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
    let mut engine = SyncEngine::new(client)
        .with_clock(move || old)
        .with_deletion_hook(reminders.clone());

    let added = engine.add(&mut session, cafe()).await.unwrap();
    engine.toggle_star(&mut session, &added.item).await.unwrap();
    let created = reminders
        .generate(session.saved_items().unwrap(), today(), &NotificationPrefs::default())
        .unwrap();
    assert_eq!(created.len(), 1);

    let receipt = engine.delete(&mut session, &added.item).await.unwrap();

    assert_eq!(receipt.message, "Deleted \"Cafe A\"");
    assert!(reminders.pending().unwrap().is_empty());
}
