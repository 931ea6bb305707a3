pub mod context;
pub mod user_service;

pub use context::ServiceContext;
pub use user_service::{AuthPayload, UserError, UserFilter, UserService};
