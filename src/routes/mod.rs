mod entry;
pub mod policy;
pub mod user;

pub use entry::{USER_PREFIX, app, router};
pub use policy::{PolicyRoute, RoutePolicy};
