pub mod accounts;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod sessions;
pub mod store;
pub mod todos;
pub mod views;

use std::sync::Arc;

use axum::Router;
use chrono::Duration;
use tower_http::trace::TraceLayer;

use crate::{accounts::AccountService, sessions::Sessions, store::Store, todos::TodoService};

#[derive(Debug)]
pub struct AppState {
    pub todos: TodoService,
    pub accounts: AccountService,
    pub sessions: Sessions,
    /// Marks the session cookie `Secure`, set when serving over TLS.
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(store: Store, session_ttl: Duration, secure_cookies: bool) -> Self {
        let store = Arc::new(store);

        Self {
            todos: TodoService::new(store.clone()),
            accounts: AccountService::new(store),
            sessions: Sessions::new(session_ttl),
            secure_cookies,
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    handlers::router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
