use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use checkin_api::router;
use checkin_api::scan::{QrDecoder, RgbaFrame};
use checkin_api::state::AppStateInner;
use checkin_db::Database;

const SECRET: &str = "test-secret";

/// Stands in for a real decoder: any non-black first pixel reads as one fixed id.
struct PixelDecoder;

impl QrDecoder for PixelDecoder {
    fn decode(&self, frame: &RgbaFrame) -> Option<String> {
        match frame.luma(0, 0) {
            None | Some(0) => None,
            _ => Some("scanned-guest".to_string()),
        }
    }
}

fn app() -> Router {
    let db = Arc::new(Database::open_in_memory().unwrap());
    router(AppStateInner::with_decoder(db, SECRET.into(), Arc::new(PixelDecoder)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn add(app: &Router, name: &str, as_checked_in: bool) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/guests",
        Some(json!({ "name": name, "email": format!("{}@example.com", name.to_lowercase()), "as_checked_in": as_checked_in })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["guest"].clone()
}

#[tokio::test]
async fn check_in_flow() {
    let app = app();
    let maria = add(&app, "Maria", false).await;
    let id = maria["id"].as_str().unwrap();
    assert!(maria["checked_in_at"].is_null());

    let (_, listing) = send(&app, Method::GET, "/guests/listing", None).await;
    assert_eq!(listing["pending"]["total"], 1);
    assert_eq!(listing["checked_in"]["total"], 0);

    let (status, first) = send(&app, Method::POST, &format!("/guests/{}/check-in", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "checked_in");
    assert_eq!(first["message"], "Maria checked in successfully.");

    let (status, second) = send(&app, Method::POST, &format!("/guests/{}/check-in", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(second["status"], "already_checked_in");
    assert_eq!(second["guest"]["checked_in_at"], first["guest"]["checked_in_at"]);

    let (_, listing) = send(&app, Method::GET, "/guests/listing", None).await;
    assert_eq!(listing["pending"]["total"], 0);
    assert_eq!(listing["checked_in"]["guests"][0]["id"], id);
}

#[tokio::test]
async fn unknown_guest_check_in() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/guests/nope/check-in", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No guest was found with the given ID.");
}

#[tokio::test]
async fn listing_filters_and_pages() {
    let app = app();
    for i in 0..11 {
        add(&app, &format!("Guest {:02}", i), false).await;
    }
    let (status, _) = send(
        &app,
        Method::POST,
        "/guests",
        Some(json!({ "name": "Tia Rosa", "category": "family" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, page2) = send(&app, Method::GET, "/guests/listing?pending_page=2", None).await;
    assert_eq!(page2["pending"]["total"], 12);
    assert_eq!(page2["pending"]["total_pages"], 2);
    assert_eq!(page2["pending"]["guests"].as_array().unwrap().len(), 2);

    let (_, page9) = send(&app, Method::GET, "/guests/listing?pending_page=9", None).await;
    assert!(page9["pending"]["guests"].as_array().unwrap().is_empty());

    let (_, family) = send(&app, Method::GET, "/guests/listing?category=family", None).await;
    assert_eq!(family["pending"]["total"], 1);
    assert_eq!(family["pending"]["guests"][0]["name"], "Tia Rosa");

    let (_, searched) = send(&app, Method::GET, "/guests/listing?search=GUEST%2001", None).await;
    assert_eq!(searched["pending"]["total"], 1);
}

#[tokio::test]
async fn manual_search_and_delete() {
    let app = app();
    let mariana = add(&app, "Mariana", false).await;
    add(&app, "Omar", true).await;
    add(&app, "Lucas", false).await;

    let (_, found) = send(&app, Method::GET, "/guests/search?q=MAR", None).await;
    let names: Vec<_> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Mariana", "Omar"]);

    let id = mariana["id"].as_str().unwrap();
    let (status, body) = send(&app, Method::DELETE, &format!("/guests/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Mariana was removed from the guest list.");

    let (status, _) = send(&app, Method::DELETE, &format!("/guests/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, &format!("/guests/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, all) = send(&app, Method::GET, "/guests", None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn update_is_full_record_upsert() {
    let app = app();
    let guest = add(&app, "Bia", true).await;
    let id = guest["id"].as_str().unwrap();

    let mut edited = guest.clone();
    edited["phone"] = json!("555-0101");
    edited["checked_in_at"] = Value::Null;

    let (status, body) = send(&app, Method::PUT, &format!("/guests/{}", id), Some(edited)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["guest"]["phone"], "555-0101");
    assert!(body["guest"]["checked_in_at"].is_null());
    assert_eq!(body["message"], "Bia's details were updated.");

    let mut wrong = guest.clone();
    wrong["id"] = json!("someone-else");
    let (status, _) = send(&app, Method::PUT, &format!("/guests/{}", id), Some(wrong)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scan_frames() {
    let app = app();
    let (status, _) = send(
        &app,
        Method::PUT,
        "/guests/scanned-guest",
        Some(json!({ "id": "scanned-guest", "name": "Eva" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let scan = |pixels: Vec<u8>, uri: &'static str| {
        let app = app.clone();
        async move {
            let req = Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .body(Body::from(pixels))
                .unwrap();
            app.oneshot(req).await.unwrap().status()
        }
    };

    assert_eq!(scan(vec![0; 7], "/scan?width=2&height=1").await, StatusCode::BAD_REQUEST);
    assert_eq!(
        scan(vec![0, 0, 0, 255], "/scan?width=1&height=1").await,
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(scan(vec![255; 4], "/scan?width=1&height=1").await, StatusCode::OK);
    assert_eq!(scan(vec![255; 4], "/scan?width=1&height=1").await, StatusCode::CONFLICT);
}

#[tokio::test]
async fn session_is_advisory() {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let app = app();
    let claims = checkin_api::session::SessionClaims {
        sub: "staff-1".into(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();

    for auth in [None, Some("Bearer garbage".to_string()), Some(format!("Bearer {}", token))] {
        let mut builder = Request::builder().uri("/categories");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let response = app.clone().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn category_table() {
    let app = app();
    let (status, table) = send(&app, Method::GET, "/categories", None).await;
    assert_eq!(status, StatusCode::OK);
    let table = table.as_array().unwrap();
    assert_eq!(table.len(), 7);
    assert_eq!(table[3]["category"], "family");
    assert_eq!(table[3]["color"], "red");
    assert_eq!(table[6]["category"], Value::Null);
    assert_eq!(table[6]["icon"], "user");
}
