use std::sync::Arc;

use axum::Router;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};

use crate::{
    auth::{Role, TokenService},
    config::{AppConfig, AuthConfig},
    routes::app,
    state::AppState,
};

pub const TEST_SECRET: &str = "test-secret-for-user-registry";

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: TEST_SECRET.to_string(),
        token_ttl_days: 30,
        admin_email: "admin@example.com".to_string(),
        admin_password: "adminpassword".to_string(),
        admin_full_name: "Administrator".to_string(),
    }
}

pub fn test_state(db: DatabaseConnection) -> Arc<AppState> {
    let auth = test_auth_config();
    let tokens = TokenService::from_config(&auth);
    let cfg = AppConfig {
        auth: Some(auth),
        ..AppConfig::default()
    };
    AppState::new(cfg, db, tokens)
}

/// Full app stack over `db`.
pub fn test_app(db: DatabaseConnection) -> Router {
    app(test_state(db))
}

/// Full app stack over a mock that has no queued results.
pub fn test_router() -> Router {
    test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
}

/// `Bearer <token>` header value signed with the test secret.
pub fn bearer(id: i32, email: &str, role: Role) -> String {
    let token = TokenService::new(TEST_SECRET.as_bytes(), 30)
        .sign(id, email, role)
        .expect("test token should encode");
    format!("Bearer {token}")
}
