use afisha_events::domain::Event;
use afisha_events::local_store::LocalEventStore;
use afisha_events::server::create_server;
use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;
use uuid::Uuid;

fn event_payload(uuid: Uuid, title: &str, event_type: &str) -> Value {
    json!({
        "uuid": uuid,
        "title": title,
        "event_type": event_type,
        "price": 500.0,
        "date_preview": Utc::now() + ChronoDuration::days(3),
        "place": "Main Hall",
    })
}

async fn spawn_api() -> Result<(String, Arc<LocalEventStore>)> {
    let store = Arc::new(LocalEventStore::open(None).await);
    let app = create_server(store.clone());

    let listener = TcpListener::bind("127.0.0.1:0")?;
    listener.set_nonblocking(true)?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        hyper::Server::from_tcp(listener)
            .unwrap()
            .serve(app.into_make_service())
            .await
            .unwrap();
    });

    Ok((format!("http://{}", addr), store))
}

#[tokio::test]
async fn test_insert_get_update_delete_cycle() -> Result<()> {
    let (base, _store) = spawn_api().await?;
    let client = reqwest::Client::new();
    let uuid = Uuid::new_v4();

    let created = client
        .post(format!("{}/events", base))
        .json(&event_payload(uuid, "Injected", "concert"))
        .send()
        .await?;
    assert_eq!(created.status(), 201);
    let body: Value = created.json().await?;
    // created_at is backfilled server-side
    assert!(body["event"]["created_at"].is_string());

    let fetched: Value = client
        .get(format!("{}/events/uuid/{}", base, uuid))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(fetched["title"], "Injected");

    let updated = client
        .put(format!("{}/events/{}", base, uuid))
        .json(&json!({ "title": "Renamed", "price": 900.0 }))
        .send()
        .await?;
    assert_eq!(updated.status(), 200);
    let body: Value = updated.json().await?;
    assert_eq!(body["event"]["title"], "Renamed");
    assert_eq!(body["event"]["uuid"], json!(uuid));

    let deleted = client
        .delete(format!("{}/events/{}", base, uuid))
        .send()
        .await?;
    assert_eq!(deleted.status(), 200);

    let missing = client
        .get(format!("{}/events/uuid/{}", base, uuid))
        .send()
        .await?;
    assert_eq!(missing.status(), 404);

    Ok(())
}

#[tokio::test]
async fn test_malformed_uuid_lookup_is_a_plain_miss() -> Result<()> {
    let (base, _store) = spawn_api().await?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/events/uuid/not-a-uuid", base))
        .send()
        .await?;
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "Event not found");

    Ok(())
}

#[tokio::test]
async fn test_duplicate_insert_conflicts() -> Result<()> {
    let (base, _store) = spawn_api().await?;
    let client = reqwest::Client::new();
    let uuid = Uuid::new_v4();

    let first = client
        .post(format!("{}/events", base))
        .json(&event_payload(uuid, "Original", "concert"))
        .send()
        .await?;
    assert_eq!(first.status(), 201);

    let second = client
        .post(format!("{}/events", base))
        .json(&event_payload(uuid, "Duplicate", "concert"))
        .send()
        .await?;
    assert_eq!(second.status(), 409);

    Ok(())
}

#[tokio::test]
async fn test_batch_insert_reports_every_outcome() -> Result<()> {
    let (base, store) = spawn_api().await?;
    let client = reqwest::Client::new();

    let existing = Uuid::new_v4();
    store
        .insert(serde_json::from_value::<Event>(event_payload(
            existing, "Existing", "sport",
        ))?)
        .await?;

    let response = client
        .post(format!("{}/events/batch", base))
        .json(&json!({
            "events": [
                event_payload(Uuid::new_v4(), "Fresh", "concert"),
                event_payload(existing, "Duplicate", "sport"),
                { "title": "No uuid at all" },
            ]
        }))
        .send()
        .await?;
    assert_eq!(response.status(), 201);

    let report: Value = response.json().await?;
    assert_eq!(report["created"].as_array().unwrap().len(), 1);
    assert_eq!(report["skipped"].as_array().unwrap().len(), 1);
    assert_eq!(report["skipped"][0]["reason"], "already_exists");
    assert_eq!(report["failed"].as_array().unwrap().len(), 1);

    assert_eq!(store.count(), 2);

    Ok(())
}

#[tokio::test]
async fn test_listing_and_stats() -> Result<()> {
    let (base, store) = spawn_api().await?;
    let client = reqwest::Client::new();

    for (title, event_type) in [("A", "concert"), ("B", "concert"), ("C", "sport")] {
        store
            .insert(serde_json::from_value::<Event>(event_payload(
                Uuid::new_v4(),
                title,
                event_type,
            ))?)
            .await?;
    }

    let all: Vec<Value> = client
        .get(format!("{}/events", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(all.len(), 3);

    let concerts: Vec<Value> = client
        .get(format!("{}/events/concert", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(concerts.len(), 2);

    // Unknown categories match nothing instead of erroring.
    let unknown: Vec<Value> = client
        .get(format!("{}/events/rave", base))
        .send()
        .await?
        .json()
        .await?;
    assert!(unknown.is_empty());

    let stats: Value = client
        .get(format!("{}/stats", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["by_type"]["concert"], 2);

    Ok(())
}
