//! API integration tests
//!
//! Need a running server and database. Each test frees the docks it uses.

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Create a 3/4 record on a dock, returning the response body
async fn create_record(client: &Client, dock: i32, driver: &str) -> (u16, Value) {
    let response = client
        .post(format!("{}/loading-records", BASE_URL))
        .json(&json!({
            "dock": dock,
            "destinationCity": "Juazeiro - BA",
            "driver": driver,
            "vehicleType": "3/4",
            "plates": { "simplePlate": "ABC1D23" },
            "schedule": { "dockedAt": "", "loadingStartedAt": "", "loadingFinishedAt": "", "releasedAt": "" }
        }))
        .send()
        .await
        .expect("Failed to send request");

    let status = response.status().as_u16();
    let body: Value = response.json().await.expect("Failed to parse response");
    (status, body)
}

/// Cancel a record so its dock is free for the next run
async fn release_dock(client: &Client, id: &str) {
    client
        .put(format!("{}/loading-records/{}", BASE_URL, id))
        .json(&json!({ "lifecycleStatus": "cancelled" }))
        .send()
        .await
        .expect("Failed to send request");
}

fn record_id(body: &Value) -> String {
    body["data"]["id"].as_str().expect("No id in response").to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_pings_database() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_create_then_progress() {
    let client = Client::new();

    let (status, body) = create_record(&client, 5, "Maria").await;
    assert_eq!(status, 201);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["progress"]["percentage"], 0);
    assert_eq!(body["data"]["progress"]["status"], "queued");
    assert_eq!(body["data"]["lifecycleStatus"], "in_use");
    assert_eq!(body["data"]["progress"]["history"].as_array().map(Vec::len), Some(1));
    let id = record_id(&body);

    let response = client
        .put(format!("{}/loading-records/{}/progress", BASE_URL, id))
        .json(&json!({ "percentage": 50, "status": "loading" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/loading-records/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["progress"]["percentage"], 50);
    assert!(body["data"]["timestamps"]["loadingStartedAt"].is_string());
    assert_eq!(body["data"]["progress"]["history"].as_array().map(Vec::len), Some(2));

    let response = client
        .get(format!("{}/loading-records/{}/progress", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["dock"], 5);
    assert!(body["data"].get("plates").is_none());

    release_dock(&client, &id).await;
}

#[tokio::test]
#[ignore]
async fn test_progress_out_of_range() {
    let client = Client::new();
    let (_, body) = create_record(&client, 11, "Paulo").await;
    let id = record_id(&body);

    for percentage in [-1, 101] {
        let response = client
            .put(format!("{}/loading-records/{}/progress", BASE_URL, id))
            .json(&json!({ "percentage": percentage, "status": "loading" }))
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["error"], "ValidationError");
    }

    release_dock(&client, &id).await;
}

#[tokio::test]
#[ignore]
async fn test_dock_conflict_names_driver() {
    let client = Client::new();

    let (status, body) = create_record(&client, 6, "Maria").await;
    assert_eq!(status, 201);
    let first = record_id(&body);

    let (status, body) = create_record(&client, 6, "João").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "ConflictError");
    assert_eq!(body["occupiedBy"], "Maria");

    let (status, body) = create_record(&client, 7, "João").await;
    assert_eq!(status, 201);
    let second = record_id(&body);

    release_dock(&client, &first).await;
    release_dock(&client, &second).await;
}

#[tokio::test]
#[ignore]
async fn test_create_invalid_data() {
    let client = Client::new();

    let response = client
        .post(format!("{}/loading-records", BASE_URL))
        .json(&json!({
            "dock": 25,
            "destinationCity": "",
            "vehicleType": "BODYWORK"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(body["errors"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
#[ignore]
async fn test_unknown_record_is_404() {
    let client = Client::new();

    for id in ["00000000-0000-4000-8000-000000000000", "not-a-uuid"] {
        let response = client
            .get(format!("{}/loading-records/{}", BASE_URL, id))
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(response.status(), 404);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["error"], "NotFoundError");
    }
}

#[tokio::test]
#[ignore]
async fn test_finalize_requires_complete_schedule() {
    let client = Client::new();
    let (_, body) = create_record(&client, 8, "Ana").await;
    let id = record_id(&body);

    client
        .put(format!("{}/loading-records/{}", BASE_URL, id))
        .json(&json!({ "schedule": { "dockedAt": "08:00", "loadingFinishedAt": "09:00" } }))
        .send()
        .await
        .expect("Failed to send request");

    let response = client
        .post(format!("{}/loading-records/{}/finalize", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "PreconditionError");
    assert_eq!(body["missingFields"], json!(["loadingStartedAt", "releasedAt"]));

    // Filling the release mark frees the dock
    client
        .put(format!("{}/loading-records/{}", BASE_URL, id))
        .json(&json!({ "schedule": { "loadingStartedAt": "08:10", "releasedAt": "09:30" } }))
        .send()
        .await
        .expect("Failed to send request");

    let before = client
        .get(format!("{}/loading-records/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request")
        .json::<Value>()
        .await
        .expect("Failed to parse response");
    let history_len = before["data"]["progress"]["history"].as_array().map(Vec::len).unwrap_or(0);

    let response = client
        .post(format!("{}/loading-records/{}/finalize", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["progress"]["percentage"], 100);
    assert_eq!(body["data"]["progress"]["status"], "released");
    assert_eq!(body["data"]["lifecycleStatus"], "completed");
    assert_eq!(body["data"]["metadata"]["finalizedByButton"], true);
    assert_eq!(
        body["data"]["progress"]["history"].as_array().map(Vec::len),
        Some(history_len + 1)
    );
}

#[tokio::test]
#[ignore]
async fn test_complete_via_operation() {
    let client = Client::new();
    let (_, body) = create_record(&client, 9, "Carlos").await;
    let id = record_id(&body);

    let response = client
        .post(format!("{}/operation/complete", BASE_URL))
        .json(&json!({ "loadingRecordId": id }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["lifecycleStatus"], "completed");
    assert_eq!(body["data"]["progress"]["history"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"]["progress"]["history"][0]["status"], "queued");
}

#[tokio::test]
#[ignore]
async fn test_forecast_upsert_cycle() {
    let client = Client::new();

    // Start from a clean slate for shift B today
    client
        .delete(format!("{}/shift-forecast?shift=B", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    let response = client
        .post(format!("{}/shift-forecast", BASE_URL))
        .json(&json!({ "shift": "B", "vehicleCount": 20 }))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["operation"], "created");

    let response = client
        .post(format!("{}/operation/forecast", BASE_URL))
        .json(&json!({ "shift": "SBA04", "vehicleCount": 25 }))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["operation"], "updated");

    let response = client
        .get(format!("{}/shift-forecast?shift=B", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["exists"], true);
    assert_eq!(body["data"]["vehicleCount"], 25);

    let response = client
        .post(format!("{}/shift-forecast", BASE_URL))
        .json(&json!({ "shift": "B", "vehicleCount": 101 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_operation_progress_always_answers() {
    let client = Client::new();

    let response = client
        .get(format!("{}/operation/progress", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], true);
    assert!(body["data"]["totalForecast"].is_number());
    let percentage = body["data"]["percentage"].as_u64().expect("percentage");
    assert!(percentage <= 100);
}

#[tokio::test]
#[ignore]
async fn test_statistics_and_dashboard() {
    let client = Client::new();

    let response = client
        .get(format!("{}/operation/statistics", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    let total = body["data"]["statistics"]["total"].as_i64().expect("total");
    let grouped: i64 = body["data"]["cities"]
        .as_array()
        .expect("cities")
        .iter()
        .filter_map(|c| c["quantity"].as_i64())
        .sum();
    assert_eq!(grouped, total);

    let response = client
        .get(format!("{}/dashboard", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["data"]["stats"]["efficiency"].as_u64().expect("efficiency") <= 100);

    let response = client
        .get(format!("{}/dashboard?date=yesterday", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}
