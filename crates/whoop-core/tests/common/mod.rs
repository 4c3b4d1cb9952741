#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use whoop_core::{ClientSettings, Clock, Credentials, MemoryStore, TokenStore, WhoopClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const BEARER: &str = "test-access-token";
pub const USER_ID: i64 = 42;

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self { now: Mutex::new(now) })
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub fn credentials() -> Credentials {
    Credentials {
        username: "athlete@example.com".to_string(),
        password: "correct horse".to_string(),
    }
}

pub fn token_body(created_at: &str) -> Value {
    json!({
        "access_token": BEARER,
        "user": {"id": USER_ID, "profile": {"createdAt": created_at}}
    })
}

/// Mount a token endpoint that accepts any login.
pub async fn mount_token_endpoint(server: &MockServer, created_at: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(created_at)))
        .mount(server)
        .await;
}

pub fn client_with(
    server: &MockServer,
    store: impl TokenStore + 'static,
    clock: Arc<dyn Clock>,
) -> WhoopClient {
    WhoopClient::with_store(
        credentials(),
        ClientSettings::with_base_url(&server.uri()),
        Box::new(store),
        clock,
    )
    .unwrap()
}

pub fn client(server: &MockServer, clock: Arc<dyn Clock>) -> WhoopClient {
    client_with(server, MemoryStore::new(), clock)
}

/// Number of requests the server saw for a path.
pub async fn request_count(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}
