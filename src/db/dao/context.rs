use sea_orm::DatabaseConnection;

use super::{DaoBase, ProvinceDao, UserDao};

#[derive(Clone)]
pub struct DaoContext {
    db: DatabaseConnection,
}

impl DaoContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub fn user(&self) -> UserDao {
        UserDao::new(&self.db)
    }

    pub fn province(&self) -> ProvinceDao {
        ProvinceDao::new(&self.db)
    }
}
