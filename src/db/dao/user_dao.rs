use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    prelude::DateTimeWithTimeZone,
};
use serde::Serialize;

use super::{
    ColumnFilter, DaoBase, DaoLayerError, DaoResult, PaginatedResponse, ProvinceDao, ProvinceRef,
};
use crate::{
    auth::{Role, password::hash_password},
    db::entities::{prelude::User, user},
};

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
}

impl DaoBase for UserDao {
    type Entity = User;
    const NAME: &'static str = "user";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Registration input. `password` is plaintext; it is hashed on the way in.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub province: Option<ProvinceRef>,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub province: Option<ProvinceRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserQuery {
    pub page_index: u64,
    pub per_page: u64,
    pub province_id: Option<i32>,
}

/// Public projection of a user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub province_id: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl From<user::Model> for UserSummary {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            full_name: model.full_name,
            role: model.role,
            province_id: model.province_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl UserDao {
    fn province_dao(&self) -> ProvinceDao {
        ProvinceDao::new(&self.db)
    }

    async fn resolve_province(&self, reference: Option<ProvinceRef>) -> DaoResult<Option<i32>> {
        match reference {
            Some(reference) => self.province_dao().resolve(reference).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn register(&self, new_user: NewUser, role: Role) -> DaoResult<user::Model> {
        let province_id = self.resolve_province(new_user.province).await?;
        let password = hash_password(&new_user.password)?;

        let model = user::ActiveModel {
            email: Set(new_user.email),
            password: Set(password),
            full_name: Set(new_user.full_name),
            role: Set(role.as_str().to_string()),
            province_id: Set(province_id),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn update_profile(&self, id: i32, changes: UserChanges) -> DaoResult<user::Model> {
        let province_id = self.resolve_province(changes.province).await?;
        let password = changes.password.as_deref().map(hash_password).transpose()?;
        let UserChanges {
            email, full_name, ..
        } = changes;

        self.update(id, move |active| {
            if let Some(email) = email {
                active.email = Set(email);
            }
            if let Some(password) = password {
                active.password = Set(password);
            }
            if let Some(full_name) = full_name {
                active.full_name = Set(full_name);
            }
            if let Some(province_id) = province_id {
                active.province_id = Set(Some(province_id));
            }
        })
        .await
    }

    pub async fn delete_by_id(&self, id: i32) -> DaoResult<()> {
        self.delete(id).await.map(|_| ())
    }

    pub async fn find_users(&self, query: UserQuery) -> DaoResult<PaginatedResponse<UserSummary>> {
        let filters: Vec<_> = query
            .province_id
            .map(|province_id| ColumnFilter::eq(user::Column::ProvinceId, province_id))
            .into_iter()
            .collect();

        self.find(query.page_index, query.per_page, &filters)
            .await
            .map(|page| page.map(UserSummary::from))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, Value};

    use crate::{
        auth::Role,
        db::{
            dao::{DaoBase, DaoLayerError, ProvinceRef},
            entities::{province, user},
        },
    };

    use super::{NewUser, UserChanges, UserDao, UserQuery};

    fn ts() -> chrono::DateTime<chrono::FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn user_model(id: i32, email: &str, province_id: Option<i32>) -> user::Model {
        let now = ts();
        user::Model {
            id,
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            password: "$argon2id$stored-hash".to_string(),
            full_name: "Test User".to_string(),
            role: "user".to_string(),
            province_id,
        }
    }

    fn province_model(id: i32) -> province::Model {
        province::Model {
            id,
            name: "Hà Nội".to_string(),
        }
    }

    fn count_row(total: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(total)))])
    }

    fn new_user(email: &str, province: Option<ProvinceRef>) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: "p".to_string(),
            full_name: "A".to_string(),
            province,
        }
    }

    #[tokio::test]
    async fn find_by_email_returns_match() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user_model(4, "alice@example.com", None)]])
            .into_connection();
        let dao = UserDao::new(&db);

        let result = dao
            .find_by_email("alice@example.com")
            .await
            .expect("query should succeed");
        assert_eq!(result.map(|u| u.id), Some(4));
    }

    #[tokio::test]
    async fn find_by_email_returns_none_when_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let dao = UserDao::new(&db);

        let result = dao
            .find_by_email("missing@example.com")
            .await
            .expect("query should succeed");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn register_resolves_province_then_inserts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[province_model(1)]])
            .append_query_results([[user_model(1, "a@b.com", Some(1))]])
            .into_connection();
        let dao = UserDao::new(&db);

        let created = dao
            .register(new_user("a@b.com", Some(ProvinceRef(1))), Role::User)
            .await
            .expect("register should succeed");

        assert_eq!(created.email, "a@b.com");
        assert_eq!(created.province_id, Some(1));
    }

    #[tokio::test]
    async fn register_stops_at_unknown_province() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<province::Model>::new()])
            .into_connection();
        let dao = UserDao::new(&db);

        let err = dao
            .register(new_user("a@b.com", Some(ProvinceRef(42))), Role::User)
            .await
            .expect_err("register should fail");

        assert!(matches!(
            err,
            DaoLayerError::NotFound { entity: "province", id: 42 }
        ));
    }

    #[tokio::test]
    async fn register_surfaces_generic_insert_failure() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset by peer".to_string())])
            .into_connection();
        let dao = UserDao::new(&db);

        let err = dao
            .register(new_user("a@b.com", None), Role::Admin)
            .await
            .expect_err("insert should fail");

        assert!(matches!(err, DaoLayerError::Db(_)));
    }

    #[tokio::test]
    async fn update_profile_propagates_missing_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let dao = UserDao::new(&db);

        let err = dao
            .update_profile(
                9,
                UserChanges {
                    full_name: Some("New Name".to_string()),
                    ..UserChanges::default()
                },
            )
            .await
            .expect_err("update should fail");

        assert!(matches!(
            err,
            DaoLayerError::NotFound { entity: "user", id: 9 }
        ));
    }

    #[tokio::test]
    async fn update_profile_rejects_unknown_province() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<province::Model>::new()])
            .into_connection();
        let dao = UserDao::new(&db);

        let err = dao
            .update_profile(
                1,
                UserChanges {
                    province: Some(ProvinceRef(5)),
                    ..UserChanges::default()
                },
            )
            .await
            .expect_err("update should fail");

        assert!(matches!(
            err,
            DaoLayerError::NotFound { entity: "province", id: 5 }
        ));
    }

    #[tokio::test]
    async fn update_profile_persists_merged_row() {
        let mut updated = user_model(1, "new@example.com", Some(2));
        updated.full_name = "New Name".to_string();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[province_model(2)]])
            .append_query_results([[user_model(1, "old@example.com", None)]])
            .append_query_results([[updated.clone()]])
            .into_connection();
        let dao = UserDao::new(&db);

        let result = dao
            .update_profile(
                1,
                UserChanges {
                    email: Some("new@example.com".to_string()),
                    full_name: Some("New Name".to_string()),
                    province: Some(ProvinceRef(2)),
                    ..UserChanges::default()
                },
            )
            .await
            .expect("update should succeed");

        assert_eq!(result, updated);
    }

    #[tokio::test]
    async fn delete_by_id_reports_missing_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let dao = UserDao::new(&db);

        let err = dao.delete_by_id(3).await.expect_err("delete should fail");

        assert!(matches!(
            err,
            DaoLayerError::NotFound { entity: "user", id: 3 }
        ));
    }

    #[tokio::test]
    async fn delete_by_id_succeeds_when_row_removed() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let dao = UserDao::new(&db);

        dao.delete_by_id(3).await.expect("delete should succeed");
    }

    #[tokio::test]
    async fn find_users_pages_and_strips_passwords() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(12)]])
            .append_query_results([vec![
                user_model(6, "f@example.com", Some(1)),
                user_model(7, "g@example.com", Some(1)),
                user_model(8, "h@example.com", Some(1)),
            ]])
            .into_connection();
        let dao = UserDao::new(&db);

        let page = dao
            .find_users(UserQuery {
                page_index: 2,
                per_page: 5,
                province_id: Some(1),
            })
            .await
            .expect("find should succeed");

        assert_eq!(page.total, 12);
        assert_eq!(page.total_page, 3);
        assert_eq!(page.page_index, 2);
        assert_eq!(page.items.len(), 3);
        assert!(page.items.iter().all(|u| u.province_id == Some(1)));

        let json = serde_json::to_value(&page).expect("page should serialize");
        assert!(json["items"][0].get("password").is_none());
        assert_eq!(json["totalPage"], 3);
    }

    #[tokio::test]
    async fn find_users_rejects_offset_beyond_signed_range() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let dao = UserDao::new(&db);

        let err = dao
            .find_users(UserQuery {
                page_index: 3,
                per_page: 1 << 62,
                province_id: None,
            })
            .await
            .expect_err("oversized page should be rejected");

        assert!(matches!(
            err,
            DaoLayerError::InvalidPagination { page: 3, .. }
        ));
    }

    #[tokio::test]
    async fn find_users_rejects_zero_page() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let dao = UserDao::new(&db);

        let err = dao
            .find_users(UserQuery {
                page_index: 0,
                per_page: 10,
                province_id: None,
            })
            .await
            .expect_err("page 0 should be rejected");

        assert!(matches!(
            err,
            DaoLayerError::InvalidPagination { page: 0, page_size: 10 }
        ));
    }
}
