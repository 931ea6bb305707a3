#[allow(unused_imports)]
pub mod prelude {
    pub use super::province::Entity as Province;
    pub use super::user::Entity as User;
}

pub mod province;
pub mod user;
