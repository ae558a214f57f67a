//! # Firmhub
//!
//! A multi-tenant back office for firms and their subsidiaries: kanban
//! pipelines with dense ordering, two-tier access control, contacts, tags,
//! media, campaigns with public sites, invitations, an activity feed, and a
//! billing-webhook subscription projection. Usable both as a standalone
//! binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! firmhub = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use firmhub::server::{AppState, create_router};
//! use firmhub::store::SqliteStore;
//!
//! let store = SqliteStore::new(PathBuf::from("./data/firmhub.db")).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState {
//!     store: Arc::new(store),
//!     webhook_secret: None,
//! });
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the binary's CLI. Disable with
//!   `default-features = false`.

pub mod audit;
pub mod auth;
pub mod billing;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod server;
pub mod store;
pub mod types;
