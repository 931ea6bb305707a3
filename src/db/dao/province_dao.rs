use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use serde::Serialize;

use super::{DaoLayerError, DaoResult};
use crate::db::entities::{prelude::Province, province};

/// A province referenced by primary key. Resolved against the `provinces`
/// table whenever a user row is written with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvinceRef(pub i32);

/// Public projection of a province row. The entity itself is not
/// serializable because its relation fields reach into `users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvinceSummary {
    pub id: i32,
    pub name: String,
}

impl From<province::Model> for ProvinceSummary {
    fn from(model: province::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

#[derive(Clone)]
pub struct ProvinceDao {
    db: DatabaseConnection,
}

impl ProvinceDao {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub async fn list(&self) -> DaoResult<Vec<ProvinceSummary>> {
        let rows = Province::find()
            .order_by_asc(province::Column::Id)
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(rows.into_iter().map(ProvinceSummary::from).collect())
    }

    pub async fn resolve(&self, reference: ProvinceRef) -> DaoResult<i32> {
        let ProvinceRef(id) = reference;
        Province::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)?
            .map(|province| province.id)
            .ok_or(DaoLayerError::NotFound {
                entity: "province",
                id,
            })
    }
}
