use sqlx::PgPool;
use uuid::Uuid;

use campus::config::{AppConfig, StoreBackend};
use campus::domain::notification::{NewNotification, Notification, NotificationCategory, Recipient};
use campus::domain::profile::{Profile, Role};
use campus::infra::db::Db;
use campus::infra::pg_store::PgStore;
use campus::infra::store::NotificationStore;

use super::TEST_ACCESS_KEY;

// Serializes migrations when several tests connect at once.
const MIGRATION_LOCK: i64 = 0x6361_6d70_7573;

// ---------------------------------------------------------------------------
// PgHarness — a PgStore on a migrated database, when one is configured
// ---------------------------------------------------------------------------

pub struct PgHarness {
    pub store: PgStore,
    db: Db,
}

/// Connects to `DATABASE_URL` and applies `migrations/` in order. Returns
/// `None` when the variable is unset so the suite still runs without Postgres.
pub async fn pg() -> Option<PgHarness> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set; skipping Postgres store test");
            return None;
        }
    };

    let config = AppConfig {
        http_addr: "127.0.0.1:0".into(),
        store_backend: StoreBackend::Postgres,
        database_url: Some(database_url),
        db_max_connections: 5,
        db_connect_timeout_seconds: 30,
        db_idle_timeout_seconds: 300,
        db_max_lifetime_seconds: 1800,
        store_timeout_seconds: 10,
        event_bus_capacity: 16,
        access_token_key: TEST_ACCESS_KEY,
    };
    let db = Db::connect(&config).await.expect("Db::connect failed");
    migrate(db.pool()).await;

    Some(PgHarness {
        store: PgStore::new(db.clone()),
        db,
    })
}

async fn migrate(pool: &PgPool) {
    let mut migration_files: Vec<_> = std::fs::read_dir("migrations")
        .expect("cannot read migrations/")
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "sql"))
        .collect();
    migration_files.sort_by_key(|e| e.file_name());

    let mut conn = pool.acquire().await.expect("cannot acquire connection");
    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK)
        .execute(&mut *conn)
        .await
        .expect("cannot take migration lock");

    for entry in &migration_files {
        let sql = std::fs::read_to_string(entry.path())
            .unwrap_or_else(|_| panic!("cannot read {:?}", entry.path()));
        sqlx::raw_sql(&sql)
            .execute(&mut *conn)
            .await
            .unwrap_or_else(|e| panic!("migration {:?} failed: {}", entry.file_name(), e));
    }

    sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK)
        .execute(&mut *conn)
        .await
        .expect("cannot release migration lock");
}

impl PgHarness {
    pub fn pool(&self) -> &PgPool {
        self.db.pool()
    }

    /// Insert a profile row directly. Every call gets a fresh id, so tests
    /// sharing the database do not see each other's direct notifications.
    pub async fn create_profile(&self, full_name: &str, role: Role) -> Profile {
        let user_id = Uuid::new_v4();
        sqlx::query("INSERT INTO profiles (user_id, full_name, role) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(full_name)
            .bind(role.as_str())
            .execute(self.pool())
            .await
            .expect("insert test profile failed");

        Profile {
            user_id,
            full_name: full_name.into(),
            role,
        }
    }

    pub async fn send(&self, recipient: Recipient, sender_id: Option<Uuid>) -> Notification {
        self.store
            .insert(&NewNotification {
                sender_id,
                recipient,
                title: format!("Notice {}", Uuid::new_v4().simple()),
                message: "Details inside".into(),
                category: NotificationCategory::Attendance,
            })
            .await
            .expect("insert notification failed")
    }
}
