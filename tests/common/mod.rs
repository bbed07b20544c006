use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use vendhub_api::{
    config::AppConfig,
    db,
    entities::{
        inventory_record,
        product,
        store::{self, StoreStatus},
        user::{self, UserRole},
    },
    events::{self, EventSender},
    AppState,
};

/// Test harness backed by a file-based SQLite database in a temp directory.
/// Each instance gets its own database file, so tests can run in parallel.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _tmp: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir for test db");
        let db_path = tmp.path().join("vendhub_test.db");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let mut cfg = AppConfig::new(
            db_url,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(db_arc, cfg, event_sender);

        let router = Router::new()
            .nest("/api/v1", vendhub_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
            _tmp: tmp,
        }
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn response_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        serde_json::from_slice(&bytes).expect("response body is json")
    }

    pub async fn seed_user(&self, email: &str, role: UserRole) -> user::Model {
        let now = Utc::now();
        user::ActiveModel {
            email: Set(email.to_string()),
            first_name: Set("Test".to_string()),
            last_name: Set("User".to_string()),
            phone: Set(None),
            role: Set(role),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed user")
    }

    pub async fn seed_store(&self, owner_id: i64, status: StoreStatus) -> store::Model {
        let now = Utc::now();
        store::ActiveModel {
            owner_id: Set(owner_id),
            name: Set("Test Store".to_string()),
            description: Set(None),
            address: Set("1 Test Street".to_string()),
            phone: Set(None),
            operating_hours: Set("{}".to_string()),
            status: Set(status),
            is_verified: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed store")
    }

    pub async fn seed_product(
        &self,
        store_id: i64,
        name: &str,
        price: Decimal,
        is_available: bool,
    ) -> product::Model {
        let now = Utc::now();
        product::ActiveModel {
            store_id: Set(store_id),
            name: Set(name.to_string()),
            description: Set(None),
            price: Set(price),
            category: Set("snacks".to_string()),
            image_url: Set(None),
            is_available: Set(is_available),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed product")
    }

    /// Seed a ledger line. `rider_id = None` creates the store-held line.
    pub async fn seed_inventory_line(
        &self,
        store_id: i64,
        product_id: i64,
        rider_id: Option<i64>,
        stock: i32,
        allocated: i32,
    ) -> inventory_record::Model {
        let now = Utc::now();
        inventory_record::ActiveModel {
            product_id: Set(product_id),
            store_id: Set(store_id),
            rider_id: Set(rider_id),
            stock_quantity: Set(stock),
            allocated_quantity: Set(allocated),
            remaining_quantity: Set(stock - allocated),
            date: Set(now.date_naive()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed inventory line")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
