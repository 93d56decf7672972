use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use farescope_api::{app, AppState};
use farescope_core::{
    CoreError, CoreResult, FlightProvider, FlightSearchRequest, FlightSearchResponse, Location,
    LocationQuery,
};
use serde_json::{json, Value};
use tower::ServiceExt;

enum Reply {
    Offers,
    Fail(fn() -> CoreError),
}

struct FakeProvider {
    reply: Reply,
    flight_calls: AtomicUsize,
    location_calls: AtomicUsize,
    last_request: std::sync::Mutex<Option<FlightSearchRequest>>,
}

impl FakeProvider {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            flight_calls: AtomicUsize::new(0),
            location_calls: AtomicUsize::new(0),
            last_request: std::sync::Mutex::new(None),
        })
    }
}

#[async_trait]
impl FlightProvider for FakeProvider {
    async fn search_flights(&self, request: &FlightSearchRequest) -> CoreResult<FlightSearchResponse> {
        self.flight_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        match &self.reply {
            Reply::Offers => Ok(serde_json::from_value(json!({
                "meta": { "count": 1 },
                "data": [{
                    "id": "1",
                    "source": "GDS",
                    "itineraries": [{
                        "duration": "PT7H",
                        "segments": [{
                            "departure": { "iataCode": "JFK", "at": "2025-06-01T18:00:00" },
                            "arrival": { "iataCode": "LHR", "at": "2025-06-02T06:00:00" },
                            "carrierCode": "BA",
                            "number": "112",
                            "numberOfStops": 0
                        }]
                    }],
                    "price": { "currency": "USD", "total": "412.30", "base": "300.00", "grandTotal": "412.30" }
                }]
            }))
            .unwrap()),
            Reply::Fail(err) => Err(err()),
        }
    }

    async fn search_locations(&self, query: &LocationQuery) -> CoreResult<Vec<Location>> {
        self.location_calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Offers => Ok(vec![serde_json::from_value(json!({
                "iataCode": "LHR",
                "name": "HEATHROW",
                "subType": "AIRPORT",
                "address": { "cityName": query.keyword().to_uppercase() }
            }))
            .unwrap()]),
            Reply::Fail(err) => Err(err()),
        }
    }
}

async fn send(provider: Arc<FakeProvider>, method: Method, uri: &str) -> (StatusCode, Value) {
    let app = app(AppState::new(provider));
    let req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

const SEARCH: &str = "/api/flights?originLocationCode=jfk&destinationLocationCode=LHR&departureDate=2025-06-01";

#[tokio::test]
async fn search_returns_offers_unchanged() {
    let provider = FakeProvider::new(Reply::Offers);
    let (status, body) = send(provider.clone(), Method::GET, SEARCH).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], "1");
    assert_eq!(body["data"][0]["source"], "GDS");
    assert_eq!(body["data"][0]["price"]["grandTotal"], "412.30");
    assert_eq!(body["meta"]["count"], 1);

    let request = provider.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(request.origin(), "JFK");
    assert_eq!(request.adults(), 1);
    assert_eq!(request.max_results(), 50);
    assert_eq!(request.currency(), "USD");
}

#[tokio::test]
async fn two_letter_origin_rejected_before_upstream() {
    let provider = FakeProvider::new(Reply::Offers);
    let uri = "/api/flights?originLocationCode=US&destinationLocationCode=LHR&departureDate=2025-06-01";
    let (status, body) = send(provider.clone(), Method::GET, uri).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid origin airport code");
    assert_eq!(provider.flight_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_departure_date_rejected() {
    let provider = FakeProvider::new(Reply::Offers);
    let uri = "/api/flights?originLocationCode=JFK&destinationLocationCode=LHR";
    let (status, body) = send(provider.clone(), Method::GET, uri).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("departureDate"));
    assert_eq!(provider.flight_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_parameter_rejected() {
    let provider = FakeProvider::new(Reply::Offers);
    let uri = format!("{}&seats=2", SEARCH);
    let (status, _) = send(provider.clone(), Method::GET, &uri).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(provider.flight_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_get_is_method_not_allowed() {
    let provider = FakeProvider::new(Reply::Offers);
    let (status, body) = send(provider.clone(), Method::POST, SEARCH).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Method not allowed");
    assert_eq!(provider.flight_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_search_surfaces_upstream_detail() {
    let provider = FakeProvider::new(Reply::Fail(|| {
        CoreError::InvalidSearchError("Date/Time is in the past".into())
    }));
    let (status, body) = send(provider, Method::GET, SEARCH).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to search flights");
    assert_eq!(body["message"], "Date/Time is in the past");
}

#[tokio::test]
async fn authentication_failure_is_server_error() {
    let provider = FakeProvider::new(Reply::Fail(|| {
        CoreError::AuthenticationError("upstream rejected credentials".into())
    }));
    let (status, body) = send(provider, Method::GET, SEARCH).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to search flights");
    assert!(body["message"].as_str().unwrap().starts_with("Authentication failed"));
}

#[tokio::test]
async fn locations_lookup() {
    let provider = FakeProvider::new(Reply::Offers);
    let (status, body) = send(provider.clone(), Method::GET, "/api/flights?action=locations&keyword=lon").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["iataCode"], "LHR");
    assert_eq!(body["data"][0]["address"]["cityName"], "LON");
    assert_eq!(provider.location_calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.flight_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn short_or_missing_keyword_rejected() {
    let provider = FakeProvider::new(Reply::Offers);

    let (status, body) = send(provider.clone(), Method::GET, "/api/flights?action=locations&keyword=l").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Keyword must be at least 2 characters");

    let (status, body) = send(provider.clone(), Method::GET, "/api/flights?action=locations").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Keyword is required");

    assert_eq!(provider.location_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn location_failure_is_server_error() {
    let provider = FakeProvider::new(Reply::Fail(|| {
        CoreError::AuthenticationError("upstream rejected credentials".into())
    }));
    let (status, body) = send(provider, Method::GET, "/api/flights?action=locations&keyword=par").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to search locations");
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let provider = FakeProvider::new(Reply::Offers);
    let app = app(AppState::new(provider));
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/flights")
        .header("origin", "https://example.org")
        .header("access-control-request-method", "GET")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
}
