//! HTTP API tests driving the router directly.

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use npi_lookup::http::build_client;
use npi_lookup::lookup::LookupService;
use npi_lookup::npi::RegistryClient;
use npi_lookup::server::{AppState, router};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NPI: &str = "1518908712";

fn app_with_registry(server: &MockServer) -> Router {
    let client = build_client(Duration::from_secs(5)).unwrap();
    let registry = RegistryClient::new(client, format!("{}/api/", server.uri()), "2.1", 0);
    router(AppState::new(LookupService::new(registry, None)))
}

async fn body_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_lookup(body: &str) -> Request<Body> {
    Request::post("/api/lookup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_ok() {
    let server = MockServer::start().await;
    let app = app_with_registry(&server);

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response.into_body()).await["status"], "ok");
}

#[tokio::test]
async fn invalid_npi_is_400() {
    let server = MockServer::start().await;
    let app = app_with_registry(&server);

    let response = app.oneshot(post_lookup(r#"{"npi":"12ab"}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response.into_body()).await,
        json!({"error": "Please enter a valid 10-digit NPI number."})
    );
}

#[tokio::test]
async fn missing_npi_is_400() {
    let server = MockServer::start().await;
    let app = app_with_registry(&server);

    let response = app.oneshot(post_lookup("{}")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_json_body_is_500() {
    let server = MockServer::start().await;
    let app = app_with_registry(&server);

    let response = app.oneshot(post_lookup("npi=1518908712")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response.into_body()).await["error"],
        "An unexpected error occurred. Please try again."
    );
}

#[tokio::test]
async fn unknown_npi_is_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;
    let app = app_with_registry(&server);

    let response = app
        .oneshot(post_lookup(&format!(r#"{{"npi":"{NPI}"}}"#)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response.into_body()).await["error"],
        "No provider found for this NPI number."
    );
}

#[tokio::test]
async fn registry_outage_is_500() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let app = app_with_registry(&server);

    let response = app
        .oneshot(post_lookup(&format!(r#"{{"npi":"{NPI}"}}"#)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn found_npi_returns_merged_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("number", NPI))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "number": NPI,
                "enumeration_type": "NPI-1",
                "basic": {"first_name": "ALEX", "last_name": "RIVERA", "status": "D"},
                "taxonomies": [],
                "addresses": []
            }]
        })))
        .mount(&server)
        .await;
    let app = app_with_registry(&server);

    let response = app
        .oneshot(Request::get(format!("/api/lookup/{NPI}")).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response.into_body()).await;
    assert!(json["profile"].is_null());
    assert_eq!(json["provider"]["npiNumber"], NPI);
    assert_eq!(json["provider"]["firstName"], "Alex");
    assert_eq!(json["provider"]["specialty"], "Unknown");
    assert_eq!(json["provider"]["status"], "Inactive");
    assert_eq!(json["provider"]["practiceAddress"]["zip"], "");
}
