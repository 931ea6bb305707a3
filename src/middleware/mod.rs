mod auth;
mod json_error;
mod panic;

pub use auth::{RequireRoleLayer, bearer_token, jwt_auth};
pub use json_error::json_error_middleware;
pub use panic::catch_panic_layer;
