#![allow(dead_code)]

pub mod pg;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use campus::app::auth::AccessTokens;
use campus::app::delivery::FeedView;
use campus::app::events::EventBus;
use campus::app::inbox::InboxSession;
use campus::domain::notification::{
    NewNotification, Notification, NotificationCategory, Recipient,
};
use campus::domain::profile::{Profile, Role, Viewer};
use campus::infra::memory::MemoryStore;
use campus::infra::store::{NotificationRecord, NotificationStore, ProfileStore};
use campus::AppState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

// Test-only token key, never used outside this harness.
pub const TEST_ACCESS_KEY: [u8; 32] = *b"0123456789abcdef0123456789abcdef";
const TEST_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// CountingStore — MemoryStore with call counters and failure switches
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    fetches: AtomicUsize,
    inserts: AtomicUsize,
    mark_reads: AtomicUsize,
    unavailable: AtomicBool,
    delay_ms: AtomicU64,
}

impl CountingStore {
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn mark_reads(&self) -> usize {
        self.mark_reads.load(Ordering::SeqCst)
    }

    /// Make every notification call fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Stall every notification call by this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    async fn gate(&self) -> Result<()> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(anyhow!("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for CountingStore {
    async fn recent_for(&self, viewer: &Viewer, limit: i64) -> Result<Vec<NotificationRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        self.inner.recent_for(viewer, limit).await
    }

    async fn count_unread_for(&self, viewer: &Viewer) -> Result<i64> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        self.inner.count_unread_for(viewer).await
    }

    async fn insert(&self, new: &NewNotification) -> Result<Notification> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        self.inner.insert(new).await
    }

    async fn mark_read(&self, notification_id: Uuid, viewer: &Viewer) -> Result<bool> {
        self.mark_reads.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        self.inner.mark_read(notification_id, viewer).await
    }

    async fn ping(&self) -> Result<()> {
        self.gate().await
    }
}

#[async_trait]
impl ProfileStore for CountingStore {
    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        self.inner.profile(user_id).await
    }

    async fn profiles_except(&self, user_id: Uuid) -> Result<Vec<Profile>> {
        self.inner.profiles_except(user_id).await
    }
}

// ---------------------------------------------------------------------------
// TestApp — one per test, each with its own store
// ---------------------------------------------------------------------------

pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub store: Arc<CountingStore>,
}

pub struct TestResponse {
    pub status: StatusCode,
    body_bytes: bytes::Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(Value::Null)
    }

    pub fn error_message(&self) -> String {
        self.json()["error"].as_str().unwrap_or("").to_string()
    }
}

pub struct TestUser {
    pub profile: Profile,
    pub access_token: String,
}

impl TestUser {
    pub fn id(&self) -> Uuid {
        self.profile.user_id
    }

    pub fn viewer(&self) -> Viewer {
        self.profile.viewer()
    }
}

pub fn app() -> TestApp {
    TestApp::with_store_timeout(DEFAULT_STORE_TIMEOUT)
}

impl TestApp {
    pub fn with_store_timeout(store_timeout: Duration) -> Self {
        let store = Arc::new(CountingStore::default());
        let state = AppState {
            notifications: store.clone(),
            profiles: store.clone(),
            events: EventBus::new(64),
            tokens: AccessTokens::new(TEST_ACCESS_KEY),
            store_timeout,
        };
        let router = campus::http::router(state.clone());

        TestApp {
            router,
            state,
            store,
        }
    }

    // ------------------------------------------------------------------
    // Low-level request helper
    // ------------------------------------------------------------------
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");

        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let request = if let Some(body) = body {
            builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse { status, body_bytes }
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, path, None, token).await
    }

    pub async fn post_json(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.request(Method::POST, path, Some(body), token).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::POST, path, None, token).await
    }

    // ------------------------------------------------------------------
    // Test data helpers
    // ------------------------------------------------------------------

    /// Register a profile and mint an access token for it.
    pub fn create_user(&self, full_name: &str, role: Role) -> TestUser {
        let profile = Profile {
            user_id: Uuid::new_v4(),
            full_name: full_name.to_string(),
            role,
        };
        self.store
            .inner
            .put_profile(profile.clone())
            .expect("put profile failed");
        let access_token = self
            .state
            .tokens
            .issue(profile.user_id, TEST_TOKEN_TTL)
            .expect("issue token failed");

        TestUser {
            profile,
            access_token,
        }
    }

    /// Insert a notification created `age` ago. Returns its id.
    pub fn seed(
        &self,
        recipient: Recipient,
        sender_id: Option<Uuid>,
        is_read: bool,
        age: time::Duration,
    ) -> Uuid {
        self.seed_with(recipient, sender_id, NotificationCategory::General, is_read, age)
    }

    pub fn seed_with(
        &self,
        recipient: Recipient,
        sender_id: Option<Uuid>,
        category: NotificationCategory,
        is_read: bool,
        age: time::Duration,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.store
            .inner
            .seed(Notification {
                id,
                sender_id,
                recipient,
                title: format!("Notice {}", id.simple()),
                message: "Details inside".into(),
                category,
                is_read,
                created_at: OffsetDateTime::now_utc() - age,
            })
            .expect("seed notification failed");
        id
    }

    pub fn stored(&self, id: Uuid) -> Notification {
        self.store
            .inner
            .get(id)
            .expect("read notification failed")
            .expect("notification missing")
    }

    pub fn session(&self, user: &TestUser, view: FeedView) -> InboxSession {
        InboxSession::open(
            self.state.resolver(),
            self.state.events.clone(),
            user.viewer(),
            view,
        )
    }
}
