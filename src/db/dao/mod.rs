pub mod base;
pub mod base_traits;
mod context;
pub mod error;
pub mod province_dao;
pub mod user_dao;

pub use base::{ColumnFilter, DaoBase, PaginatedResponse, page_offset, total_pages};
pub use base_traits::{HasIdColumn, TimestampedActiveModel};
pub use context::DaoContext;
pub use error::{DaoLayerError, DaoResult};
pub use province_dao::{ProvinceDao, ProvinceRef, ProvinceSummary};
pub use user_dao::{NewUser, UserChanges, UserDao, UserQuery, UserSummary};
