use std::{
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, Request as HttpRequest, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::{
    auth::{Claims, Role},
    error::AppError,
    state::AppState,
};

/// Token from an `Authorization: Bearer <token>` header, if there is one.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verifies the bearer token and attaches its claims to the request.
/// Missing, malformed and expired tokens all end the request with 401.
pub async fn jwt_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers()).ok_or_else(|| {
        tracing::debug!(path = %req.uri().path(), "rejected request without bearer token");
        AppError::unauthorized("Missing/invalid Authorization header")
    })?;

    let claims = state.tokens.verify(token).map_err(|err| {
        tracing::debug!(error = %err, "rejected bearer token");
        AppError::from(err)
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Lets a request through only if the claims attached by [`jwt_auth`]
/// carry one of the allowed roles.
#[derive(Clone, Copy)]
pub struct RequireRoleLayer {
    allowed: &'static [Role],
}

impl RequireRoleLayer {
    pub fn new(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }
}

#[derive(Clone)]
pub struct RequireRole<S> {
    inner: S,
    allowed: &'static [Role],
}

impl<S> Layer<S> for RequireRoleLayer {
    type Service = RequireRole<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireRole {
            inner,
            allowed: self.allowed,
        }
    }
}

impl<S> Service<HttpRequest<Body>> for RequireRole<S>
where
    S: Service<HttpRequest<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: HttpRequest<Body>) -> Self::Future {
        let allowed = self.allowed;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(role) = req.extensions().get::<Claims>().map(|claims| claims.role) else {
                return Ok(AppError::unauthorized("No JWT claims").into_response());
            };

            if !allowed.contains(&role) {
                tracing::debug!(role = role.as_str(), "role not allowed on route");
                return Ok(AppError::forbidden("Missing required role").into_response());
            }

            inner.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{HeaderMap, HeaderValue, Request, StatusCode, header},
        routing::get,
    };
    use tower::ServiceExt;

    use crate::auth::{Claims, Role};

    use super::{RequireRoleLayer, bearer_token};

    const ADMIN_ONLY: &[Role] = &[Role::Admin];

    fn claims(role: Role) -> Claims {
        Claims {
            id: 1,
            email: "a@b.com".to_string(),
            role,
            iat: 0,
            exp: usize::MAX,
        }
    }

    fn guarded() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .route_layer(RequireRoleLayer::new(ADMIN_ONLY))
    }

    #[test]
    fn bearer_token_requires_scheme_and_value() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[tokio::test]
    async fn guard_without_claims_is_unauthorized() {
        let response = guarded()
            .oneshot(Request::get("/").body(Body::empty()).expect("request"))
            .await
            .expect("router should respond");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn guard_rejects_role_outside_allow_list() {
        let mut req = Request::get("/").body(Body::empty()).expect("request");
        req.extensions_mut().insert(claims(Role::User));

        let response = guarded().oneshot(req).await.expect("router should respond");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn guard_admits_allowed_role() {
        let mut req = Request::get("/").body(Body::empty()).expect("request");
        req.extensions_mut().insert(claims(Role::Admin));

        let response = guarded().oneshot(req).await.expect("router should respond");

        assert_eq!(response.status(), StatusCode::OK);
    }
}
