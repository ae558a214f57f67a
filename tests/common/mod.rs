use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

use firmhub::auth::TokenGenerator;
use firmhub::server::{AppState, create_router};
use firmhub::store::{SqliteStore, Store};
use firmhub::types::Token;

pub const WEBHOOK_SECRET: &str = "whsec_test";

pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub admin_token: String,
}

impl TestServer {
    /// Boots a server on an ephemeral port with a fresh database and a
    /// pre-minted admin token.
    pub async fn start() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let db_path = temp_dir.path().join("firmhub.db");

        let store = SqliteStore::new(&db_path).expect("open store");
        store.initialize().expect("initialize store");

        let generator = TokenGenerator::new();
        let (raw_token, lookup, hash) = generator.generate().expect("generate admin token");
        store
            .create_token(&Token {
                id: Uuid::new_v4().to_string(),
                token_hash: hash,
                token_lookup: lookup,
                is_admin: true,
                user_id: None,
                created_at: Utc::now(),
                expires_at: None,
                last_used_at: None,
            })
            .expect("store admin token");

        let state = Arc::new(AppState {
            store: Arc::new(store),
            webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        });

        let app = create_router(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            temp_dir,
            base_url: format!("http://{addr}"),
            admin_token: raw_token,
        }
    }
}
