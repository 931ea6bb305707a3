use serde::Serialize;

use crate::{
    auth::{Role, TokenError, TokenService, password::{PasswordError, verify_password}},
    config::AuthConfig,
    db::{
        dao::{
            DaoLayerError, NewUser, PaginatedResponse, ProvinceDao, ProvinceSummary, UserChanges,
            UserDao, UserQuery, UserSummary,
        },
        entities::user,
    },
};

pub const DEFAULT_PAGE_INDEX: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 10;

/// Why a login attempt was refused. Logged, never returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum LoginFailure {
    #[error("no user with that email")]
    UnknownEmail,
    #[error("password mismatch")]
    WrongPassword,
    #[error(transparent)]
    UnreadableHash(#[from] PasswordError),
    #[error("stored role `{0}` is not recognised")]
    UnknownRole(String),
}

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("registration failed: {0}")]
    Register(#[source] DaoLayerError),
    #[error("login refused: {0}")]
    InvalidCredentials(#[source] LoginFailure),
    #[error("update failed: {0}")]
    Update(#[source] DaoLayerError),
    #[error("delete failed: {0}")]
    Delete(#[source] DaoLayerError),
    #[error("lookup failed: {0}")]
    Lookup(#[source] DaoLayerError),
    #[error("token issue failed: {0}")]
    Token(#[from] TokenError),
}

impl UserError {
    /// Message safe to send to clients.
    pub fn public_message(&self) -> &'static str {
        match self {
            UserError::Register(_) => "Registration failed",
            UserError::InvalidCredentials(_) => "Invalid credentials",
            UserError::Update(_) => "Update failed",
            UserError::Delete(_) => "Delete failed",
            UserError::Lookup(_) => "Request failed",
            UserError::Token(_) => "Could not issue token",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub email: String,
}

/// Listing filter as received; missing paging values fall back to page 1 of 10.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub page_index: Option<u64>,
    pub per_page: Option<u64>,
    pub province_id: Option<i32>,
}

impl UserFilter {
    pub fn into_query(self) -> UserQuery {
        UserQuery {
            page_index: self.page_index.unwrap_or(DEFAULT_PAGE_INDEX),
            per_page: self.per_page.unwrap_or(DEFAULT_PER_PAGE),
            province_id: self.province_id,
        }
    }
}

#[derive(Clone)]
pub struct UserService {
    users: UserDao,
    provinces: ProvinceDao,
    tokens: TokenService,
}

impl UserService {
    pub fn new(users: UserDao, provinces: ProvinceDao, tokens: TokenService) -> Self {
        Self {
            users,
            provinces,
            tokens,
        }
    }

    pub async fn register(&self, input: NewUser, role: Role) -> Result<AuthPayload, UserError> {
        let user = self
            .users
            .register(input, role)
            .await
            .map_err(UserError::Register)?;
        tracing::info!(user_id = user.id, role = role.as_str(), "user registered");
        self.issue(&user, role)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, UserError> {
        let user = self
            .users
            .find_by_email(email)
            .await
            .map_err(UserError::Lookup)?
            .ok_or(UserError::InvalidCredentials(LoginFailure::UnknownEmail))?;

        let matches = verify_password(password, &user.password)
            .map_err(|err| UserError::InvalidCredentials(err.into()))?;
        if !matches {
            return Err(UserError::InvalidCredentials(LoginFailure::WrongPassword));
        }

        let role = Role::try_from(user.role.as_str()).map_err(|_| {
            UserError::InvalidCredentials(LoginFailure::UnknownRole(user.role.clone()))
        })?;
        self.issue(&user, role)
    }

    pub async fn update(&self, user_id: i32, changes: UserChanges) -> Result<(), UserError> {
        self.users
            .update_profile(user_id, changes)
            .await
            .map_err(UserError::Update)?;
        tracing::info!(user_id, "user profile updated");
        Ok(())
    }

    pub async fn delete(&self, user_id: i32) -> Result<(), UserError> {
        self.users
            .delete_by_id(user_id)
            .await
            .map_err(UserError::Delete)?;
        tracing::info!(user_id, "user deleted");
        Ok(())
    }

    pub async fn find(
        &self,
        filter: UserFilter,
    ) -> Result<PaginatedResponse<UserSummary>, UserError> {
        self.users
            .find_users(filter.into_query())
            .await
            .map_err(UserError::Lookup)
    }

    pub async fn list_provinces(&self) -> Result<Vec<ProvinceSummary>, UserError> {
        self.provinces.list().await.map_err(UserError::Lookup)
    }

    /// Creates the configured admin account unless a user with that email
    /// already exists.
    pub async fn seed_admin(&self, cfg: &AuthConfig) -> anyhow::Result<()> {
        if let Some(existing) = self.users.find_by_email(&cfg.admin_email).await? {
            tracing::info!("admin user already present: {}", existing.email);
            return Ok(());
        }

        let admin = self
            .users
            .register(
                NewUser {
                    email: cfg.admin_email.clone(),
                    password: cfg.admin_password.clone(),
                    full_name: cfg.admin_full_name.clone(),
                    province: None,
                },
                Role::Admin,
            )
            .await?;
        tracing::info!("seeded admin user {}", admin.email);
        Ok(())
    }

    fn issue(&self, user: &user::Model, role: Role) -> Result<AuthPayload, UserError> {
        let token = self.tokens.sign(user.id, &user.email, role)?;
        Ok(AuthPayload {
            token,
            email: user.email.clone(),
        })
    }
}
