//! # Bank Registry Backend
//!
//! Manages bank records through two parallel interfaces over one service:
//!
//! ```text
//! HTML pages (html, views, flash)     JSON API under /api (rest)
//!                 \                    /
//!                  BankService (domain)
//!                         |
//!                  DbConnection (db)
//! ```
//!
//! The storage handle is created once in [`initialize_backend`] and passed
//! down explicitly; handlers only see it through [`AppState`].

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod flash;
pub mod html;
pub mod rest;
pub mod views;

use anyhow::Result;
use axum::extract::FromRef;
use axum::Router;
use axum_extra::extract::cookie::Key;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::DbConnection;
use crate::domain::BankService;

/// Main application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub bank_service: BankService,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(db: DbConnection, secret_key: &str) -> Self {
        Self {
            bank_service: BankService::new(db),
            cookie_key: flash::signing_key(secret_key),
        }
    }
}

// Lets handlers extract a `SignedCookieJar` for flash messages
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Connect to storage and build the application state
pub async fn initialize_backend(config: &Config) -> Result<AppState> {
    info!("Setting up database at {}", config.database_url);
    let db = DbConnection::init(config).await?;

    if config.uses_default_secret() {
        warn!("SECRET_KEY is not set; flash cookies are signed with the development key");
    }

    Ok(AppState::new(db, &config.secret_key))
}

/// Create the router serving both the HTML pages and the JSON API
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .nest("/api", rest::router())
        .merge(html::router())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
