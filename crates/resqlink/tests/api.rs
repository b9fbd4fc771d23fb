//! End-to-end tests driving the router in-process.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use resqlink::{router, AppState, Config, Storage};

fn app() -> Router {
    let storage = Storage::open_in_memory().unwrap();
    router(AppState::new(storage, Config::default()))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    call(app, Method::GET, uri, None, None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    call(app, Method::POST, uri, Some(body), None).await
}

async fn put(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    call(app, Method::PUT, uri, Some(body), None).await
}

async fn register_contributor(app: &Router) -> String {
    let (status, body) = post(
        app,
        "/api/contributor/register",
        json!({
            "name": "Lanka Relief",
            "email": "lanka@relief.org",
            "password": "secret",
            "phone": "0112223344",
            "contributorType": "ngo"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["contributorId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_check() {
    let (status, body) = get(&app(), "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn victim_registration_and_login() {
    let app = app();
    let victim = json!({
        "name": "Nimal Perera",
        "email": "nimal@example.com",
        "password": "flood2024",
        "phone": "0771234567",
        "district": "Matara"
    });

    let (status, body) = post(&app, "/api/auth/victim/register", victim.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Victim Account Created Successfully");
    assert_eq!(body["victimId"], "MAT001");

    let (status, body) = post(&app, "/api/auth/victim/register", victim).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"msg": "Email already used"}));

    let (status, body) = post(
        &app,
        "/api/auth/victim/login",
        json!({"email": "nimal@example.com", "password": "wrong"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "Wrong password");

    let (status, body) = post(
        &app,
        "/api/auth/victim/login",
        json!({"email": "nimal@example.com", "password": "flood2024"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["role"], "victim");
    assert!(body["user"].get("passwordHash").is_none());

    let (status, body) = get(&app, "/api/auth/victim/search?query=nimal").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["victims"][0]["victimId"], "MAT001");

    let (status, body) = get(&app, "/api/map/data").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["victims"][0]["needs"], "Help Needed");
    assert_eq!(body["victims"][0]["people"], 1);
}

#[tokio::test]
async fn ledger_flow() {
    let app = app();
    let contributor_id = register_contributor(&app).await;

    let (status, body) = post(
        &app,
        "/api/contributor/login",
        json!({"email": "lanka@relief.org", "password": "secret"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["contributorId"], contributor_id.as_str());

    let (status, body) = post(
        &app,
        "/api/contributor/collection",
        json!({
            "contributorId": contributor_id,
            "items": [{"category": "food", "itemName": "Rice", "quantity": 50, "unit": "kg"}]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["msg"], "Collection logged successfully");
    assert_eq!(body["collectionId"], "COLL0001");

    let distribute = |quantity: u32| {
        json!({
            "contributorId": contributor_id,
            "recipientType": "community",
            "familiesBenefited": 3,
            "items": [{"inventoryId": "INV0001", "quantityDistributed": quantity}]
        })
    };
    let (status, body) = post(&app, "/api/contributor/distribution", distribute(20)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["distribution"]["items"][0]["itemName"], "Rice");

    let (status, body) = post(&app, "/api/contributor/distribution", distribute(40)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["msg"],
        "Insufficient stock for Rice. Available: 30, Requested: 40"
    );

    let (status, body) = get(&app, &format!("/api/contributor/inventory/{contributor_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["inventory"][0]["currentQuantity"], 30.0);
    assert_eq!(body["summary"]["food"], 30.0);

    let (status, body) = get(&app, &format!("/api/contributor/stats/{contributor_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contributor"]["totalCollections"], 1);
    assert_eq!(body["contributor"]["totalDistributions"], 1);
    assert_eq!(body["stats"]["totalFamiliesBenefited"], 3);

    let (status, body) = get(
        &app,
        &format!("/api/contributor/distribution/{contributor_id}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn status_updates_and_missing_records() {
    let app = app();
    let contributor_id = register_contributor(&app).await;
    post(
        &app,
        "/api/contributor/collection",
        json!({
            "contributorId": contributor_id,
            "items": [{"category": "water", "itemName": "Water", "quantity": 12}]
        }),
    )
    .await;

    let (status, body) = put(
        &app,
        "/api/contributor/collection/COLL0001/status",
        json!({"status": "in-storage"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["collection"]["status"], "in-storage");

    let (status, body) = put(
        &app,
        "/api/contributor/collection/COLL0404/status",
        json!({"status": "in-storage"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], "Collection not found");

    let (status, body) = put(
        &app,
        "/api/contributor/collection/COLL0001/status",
        json!({"status": "teleported"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["msg"].is_string());

    let (status, _) = get(&app, "/api/contributor/profile/CON404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn needs_are_created_then_merged() {
    let app = app();

    let (status, body) = post(
        &app,
        "/api/needs",
        json!({"victimId": "MAT001", "items": {"water": true}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["msg"], "Needs created");
    assert_eq!(body["needs"]["urgency"], "high");

    let (status, body) = post(
        &app,
        "/api/needs",
        json!({"victimId": "MAT001", "specialConditions": {"isPregnant": true}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Needs updated");
    assert_eq!(body["needs"]["urgency"], "critical");
    assert_eq!(body["needs"]["items"]["water"], true);

    let (status, body) = get(&app, "/api/needs?urgency=critical").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = get(&app, "/api/needs/GAL001").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], "No needs found for this victim");

    let (status, body) = get(&app, "/api/general/dashboard-stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["urgentRequests"], 1);
}

#[tokio::test]
async fn verification_requires_admin_token() {
    let app = app();
    let contributor_id = register_contributor(&app).await;
    let uri = format!("/api/admin/contributors/{contributor_id}/verification");
    let decision = json!({"status": "verified"});

    let (status, body) = put(&app, &uri, decision.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Missing bearer token");

    let (_, login) = post(
        &app,
        "/api/contributor/login",
        json!({"email": "lanka@relief.org", "password": "secret"}),
    )
    .await;
    let contributor_token = login["token"].as_str().unwrap().to_string();
    let (status, _) = call(
        &app,
        Method::PUT,
        &uri,
        Some(decision.clone()),
        Some(&contributor_token),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post(
        &app,
        "/api/auth/admin/register",
        json!({"name": "Root", "email": "root@resq.lk", "password": "pw"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, login) = post(
        &app,
        "/api/auth/admin/login",
        json!({"email": "root@resq.lk", "password": "pw"}),
    )
    .await;
    let admin_token = login["token"].as_str().unwrap().to_string();

    let (status, body) = call(&app, Method::PUT, &uri, Some(decision), Some(&admin_token)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["contributor"]["verificationStatus"], "verified");

    let deputy = json!({"name": "Deputy", "email": "deputy@resq.lk", "password": "pw"});
    let (status, _) = post(&app, "/api/auth/admin/register", deputy.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/auth/admin/register",
        Some(deputy.clone()),
        Some(&contributor_token),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/admin/register",
        Some(deputy),
        Some(&admin_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["adminId"], "ADM002");
}

#[tokio::test]
async fn handover_notifies_collection_point() {
    let app = app();
    let contributor_id = register_contributor(&app).await;

    let (status, body) = post(
        &app,
        "/api/contributor/collection-point",
        json!({
            "name": "Town Hall",
            "managedByContributorId": contributor_id,
            "district": "Galle"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["collectionPointId"], "CP001");

    let (status, body) = post(
        &app,
        "/api/contributor/collection",
        json!({
            "contributorId": contributor_id,
            "items": [{"category": "clothing", "itemName": "Sarongs", "quantity": 40}],
            "handoverType": "collection-point",
            "handoverRef": "CP001"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = get(&app, "/api/contributor/notifications/collection-point/CP001").await;
    assert_eq!(status, StatusCode::OK);
    let notifications = body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    let id = notifications[0]["notificationId"].as_str().unwrap().to_string();

    let (status, body) = put(
        &app,
        &format!("/api/contributor/notifications/{id}/status"),
        json!({"status": "delivered"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["notification"]["status"], "delivered");

    let (_, body) = get(&app, "/api/contributor/collection-points?district=galle").await;
    assert_eq!(body["points"].as_array().map(Vec::len), Some(1));
}
