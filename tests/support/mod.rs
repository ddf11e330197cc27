#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use argocd_endpoint::clients::{ARGOCD_INITIAL_ADMIN_SECRET, BASIC_AUTH_PASSWORD_KEY};
use argocd_endpoint::clock::FixedClock;
use argocd_endpoint::controller::EndpointConnecter;
use argocd_endpoint::events::MemoryRecorder;
use argocd_endpoint::models::{ProviderConfig, Secret};
use argocd_endpoint::storage::{ClusterStore, MemoryStore};
use chrono::{TimeZone, Utc};
use serde_json::json;
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ADMIN_PASSWORD: &str = "s3cret";
pub const PROVIDER_CONFIG: &str = "argocd";

pub fn token_body(token: &str) -> String {
    json!({ "token": token }).to_string()
}

/// Answer admin logins with `session_token`.
pub async fn mount_login(server: &MockServer, session_token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v1/session"))
        .and(body_json(json!({ "username": "admin", "password": ADMIN_PASSWORD })))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(token_body(session_token), "application/json"),
        )
        .mount(server)
        .await;
}

/// Answer mints for `account` carrying `session_token` with `token`.
pub async fn mount_mint(server: &MockServer, account: &str, session_token: &str, token: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/api/v1/account/{account}/token")))
        .and(header("authorization", format!("Bearer {session_token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_raw(token_body(token), "application/json"))
        .mount(server)
        .await;
}

pub fn admin_secret() -> Secret {
    Secret::new("", ARGOCD_INITIAL_ADMIN_SECRET).with_entry(BASIC_AUTH_PASSWORD_KEY, ADMIN_PASSWORD)
}

/// A store holding a provider config pointing at `server_url` and the
/// bootstrap admin secret.
pub async fn seeded_store(server_url: &str) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .put_provider_config(ProviderConfig::new(PROVIDER_CONFIG, server_url))
        .await;
    store.put_secret(admin_secret()).await;
    store
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    ))
}

pub fn connecter(
    store: Arc<dyn ClusterStore>,
    recorder: Arc<MemoryRecorder>,
    clock: Arc<FixedClock>,
) -> EndpointConnecter {
    EndpointConnecter::new(store, recorder, clock)
}

/// Collects formatted log output so tests can assert on it.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    /// Route `tracing` output on this thread into the buffer until the
    /// returned guard is dropped.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_target(true)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
