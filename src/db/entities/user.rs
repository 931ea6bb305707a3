use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

// No serde derives: user rows leave the service only as `UserSummary`, which
// has no password field.
#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(unique)]
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: String,
    #[sea_orm(indexed)]
    pub province_id: Option<i32>,
    #[sea_orm(belongs_to, from = "province_id", to = "id", on_delete = "SetNull")]
    pub province: HasOne<super::province::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
