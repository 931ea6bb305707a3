use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    auth::{Claims, Role},
    db::dao::{NewUser, PaginatedResponse, ProvinceRef, ProvinceSummary, UserChanges, UserSummary},
    response::{ApiResult, JsonApiResponse},
    services::{AuthPayload, ServiceContext, UserFilter},
    state::AppState,
};

use super::policy::{PolicyRoute, RoutePolicy, build_router};

const ADMIN_ONLY: &[Role] = &[Role::Admin];

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(length(min = 1))]
    pub full_name: String,
    #[validate(range(min = 1))]
    pub province_id: i32,
}

impl From<RegisterRequest> for NewUser {
    fn from(body: RegisterRequest) -> Self {
        Self {
            email: body.email,
            password: body.password,
            full_name: body.full_name,
            province: Some(ProvinceRef(body.province_id)),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Every field optional; only the supplied ones change.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub password: Option<String>,
    #[validate(length(min = 1))]
    pub full_name: Option<String>,
    #[validate(range(min = 1))]
    pub province_id: Option<i32>,
}

impl From<UpdateRequest> for UserChanges {
    fn from(body: UpdateRequest) -> Self {
        Self {
            email: body.email,
            password: body.password,
            full_name: body.full_name,
            province: body.province_id.map(ProvinceRef),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FindUsersQuery {
    #[validate(range(min = 1))]
    pub page_index: Option<u64>,
    #[validate(range(min = 1, max = 1000))]
    pub per_page: Option<u64>,
    pub province_id: Option<i32>,
}

impl From<FindUsersQuery> for UserFilter {
    fn from(query: FindUsersQuery) -> Self {
        Self {
            page_index: query.page_index,
            per_page: query.per_page,
            province_id: query.province_id,
        }
    }
}

pub fn routes() -> Vec<PolicyRoute> {
    vec![
        PolicyRoute::new("/register", RoutePolicy::PUBLIC, put(register)),
        PolicyRoute::new("/login", RoutePolicy::PUBLIC, post(login)),
        PolicyRoute::new("/update", RoutePolicy::AUTHENTICATED, post(update)),
        PolicyRoute::new("/delete", RoutePolicy::AUTHENTICATED, delete(delete_self)),
        PolicyRoute::new("/find", RoutePolicy::roles(ADMIN_ONLY), get(find)),
        PolicyRoute::new(
            "/register-admin",
            RoutePolicy::roles(ADMIN_ONLY),
            put(register_admin),
        ),
        PolicyRoute::new("/list-provinces", RoutePolicy::PUBLIC, get(list_provinces)),
    ]
}

pub fn router(state: Arc<AppState>) -> Router {
    build_router(routes(), state)
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<AuthPayload> {
    body.validate()?;
    let services = ServiceContext::from_state(state.as_ref());
    let payload = services.user().register(body.into(), Role::User).await?;
    JsonApiResponse::ok(payload)
}

async fn register_admin(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<AuthPayload> {
    body.validate()?;
    tracing::info!(by = claims.id, "admin registering a new admin");
    let services = ServiceContext::from_state(state.as_ref());
    let payload = services.user().register(body.into(), Role::Admin).await?;
    JsonApiResponse::ok(payload)
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<AuthPayload> {
    body.validate()?;
    let services = ServiceContext::from_state(state.as_ref());
    let payload = services.user().login(&body.email, &body.password).await?;
    JsonApiResponse::ok(payload)
}

async fn update(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Json(body): Json<UpdateRequest>,
) -> ApiResult<()> {
    body.validate()?;
    let services = ServiceContext::from_state(state.as_ref());
    services.user().update(claims.id, body.into()).await?;
    JsonApiResponse::ok(())
}

async fn delete_self(State(state): State<Arc<AppState>>, claims: Claims) -> ApiResult<()> {
    let services = ServiceContext::from_state(state.as_ref());
    services.user().delete(claims.id).await?;
    JsonApiResponse::ok(())
}

async fn find(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FindUsersQuery>,
) -> ApiResult<PaginatedResponse<UserSummary>> {
    query.validate()?;
    let services = ServiceContext::from_state(state.as_ref());
    let page = services.user().find(query.into()).await?;
    JsonApiResponse::ok(page)
}

async fn list_provinces(State(state): State<Arc<AppState>>) -> ApiResult<Vec<ProvinceSummary>> {
    let services = ServiceContext::from_state(state.as_ref());
    let provinces = services.user().list_provinces().await?;
    JsonApiResponse::ok(provinces)
}
