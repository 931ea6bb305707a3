pub mod jwt;
pub mod password;
mod types;

pub use jwt::{TokenError, TokenService};
pub use types::{Claims, Role};
