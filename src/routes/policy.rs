use std::sync::Arc;

use axum::{Router, middleware::from_fn_with_state, routing::MethodRouter};

use crate::{
    auth::Role,
    middleware::{RequireRoleLayer, jwt_auth},
    state::AppState,
};

/// Access rule attached to a single route registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePolicy {
    pub authenticate: bool,
    pub roles: Option<&'static [Role]>,
}

impl RoutePolicy {
    pub const PUBLIC: Self = Self {
        authenticate: false,
        roles: None,
    };

    pub const AUTHENTICATED: Self = Self {
        authenticate: true,
        roles: None,
    };

    /// Authenticated, and the caller's role must be one of `roles`.
    pub const fn roles(roles: &'static [Role]) -> Self {
        Self {
            authenticate: true,
            roles: Some(roles),
        }
    }

    /// Wraps `route` so the token check runs first and the role check second.
    pub fn apply(
        self,
        route: MethodRouter<Arc<AppState>>,
        state: &Arc<AppState>,
    ) -> MethodRouter<Arc<AppState>> {
        let route = match self.roles {
            Some(roles) => route.route_layer(RequireRoleLayer::new(roles)),
            None => route,
        };

        if self.authenticate {
            route.route_layer(from_fn_with_state(state.clone(), jwt_auth))
        } else {
            route
        }
    }
}

pub struct PolicyRoute {
    pub path: &'static str,
    pub policy: RoutePolicy,
    pub handler: MethodRouter<Arc<AppState>>,
}

impl PolicyRoute {
    pub fn new(
        path: &'static str,
        policy: RoutePolicy,
        handler: MethodRouter<Arc<AppState>>,
    ) -> Self {
        Self {
            path,
            policy,
            handler,
        }
    }
}

/// Registers every route in `table` with its policy applied.
pub fn build_router(table: Vec<PolicyRoute>, state: Arc<AppState>) -> Router {
    table
        .into_iter()
        .fold(Router::new(), |router, entry| {
            tracing::debug!(
                path = entry.path,
                authenticate = entry.policy.authenticate,
                "registering route"
            );
            router.route(entry.path, entry.policy.apply(entry.handler, &state))
        })
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use crate::auth::Role;

    use super::RoutePolicy;

    #[test]
    fn role_policy_implies_authentication() {
        const ADMIN: &[Role] = &[Role::Admin];
        let policy = RoutePolicy::roles(ADMIN);

        assert!(policy.authenticate);
        assert_eq!(policy.roles, Some(ADMIN));
        assert!(!RoutePolicy::PUBLIC.authenticate);
        assert!(RoutePolicy::AUTHENTICATED.roles.is_none());
    }
}
