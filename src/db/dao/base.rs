use chrono::Utc;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, IntoActiveModel, PaginatorTrait, PrimaryKeyTrait, QueryFilter, QueryOrder,
    QuerySelect, Value,
};

use super::base_traits::{HasIdColumn, TimestampedActiveModel};
use super::error::{DaoLayerError, DaoResult};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub page_index: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_page: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, page_index: u64, per_page: u64, total: u64) -> Self {
        Self {
            items,
            page_index,
            per_page,
            total,
            total_page: total_pages(total, per_page),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            items: self.items.into_iter().map(f).collect(),
            page_index: self.page_index,
            per_page: self.per_page,
            total: self.total,
            total_page: self.total_page,
        }
    }
}

/// `ceil(total / per_page)`; zero when there is nothing to page over.
pub fn total_pages(total: u64, per_page: u64) -> u64 {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

/// Row offset of a 1-based page. `None` when either argument is zero or when
/// the limit or offset would not fit the signed 64-bit range SQL binds them in.
pub fn page_offset(page: u64, page_size: u64) -> Option<u64> {
    const MAX_BOUND: u64 = i64::MAX as u64;

    if page == 0 || page_size == 0 || page_size > MAX_BOUND {
        return None;
    }
    (page - 1)
        .checked_mul(page_size)
        .filter(|offset| *offset <= MAX_BOUND)
}

/// Equality filter on a single column.
#[derive(Debug, Clone)]
pub struct ColumnFilter<C> {
    pub column: C,
    pub value: Value,
}

impl<C> ColumnFilter<C> {
    pub fn eq(column: C, value: impl Into<Value>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

/// Shared write/read path for timestamped entities with an integer key.
///
/// `created_at`/`updated_at` are stamped here rather than by ORM hooks, so
/// every write that goes through a DAO gets them.
#[async_trait::async_trait]
pub trait DaoBase: Clone + Send + Sync + Sized
where
    <Self::Entity as EntityTrait>::Model:
        FromQueryResult + IntoActiveModel<<Self::Entity as EntityTrait>::ActiveModel> + Send + Sync,
    <Self::Entity as EntityTrait>::ActiveModel: ActiveModelTrait<Entity = Self::Entity>
        + ActiveModelBehavior
        + TimestampedActiveModel
        + Send,
    <<Self::Entity as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType:
        From<i32> + Send + Sync,
    Self::Entity: HasIdColumn,
{
    type Entity: EntityTrait + Send + Sync;
    const NAME: &'static str;

    fn new(db: &DatabaseConnection) -> Self;

    fn db(&self) -> &DatabaseConnection;

    async fn create(
        &self,
        data: impl IntoActiveModel<<Self::Entity as EntityTrait>::ActiveModel> + Send,
    ) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        let now = Utc::now().fixed_offset();
        let mut active = data.into_active_model();
        active.set_created_at(now);
        active.set_updated_at(now);
        active
            .insert(self.db())
            .await
            .map_err(|err| DaoLayerError::from_db(Self::NAME, err))
    }

    async fn find_by_id(&self, id: i32) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        let model = Self::Entity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(DaoLayerError::Db)?;

        model.ok_or(DaoLayerError::NotFound {
            entity: Self::NAME,
            id,
        })
    }

    /// One page ordered by id ascending, plus the total row count. Both
    /// queries share the same filters and run concurrently.
    async fn find(
        &self,
        page: u64,
        page_size: u64,
        filters: &[ColumnFilter<<Self::Entity as EntityTrait>::Column>],
    ) -> DaoResult<PaginatedResponse<<Self::Entity as EntityTrait>::Model>> {
        let offset = page_offset(page, page_size)
            .ok_or(DaoLayerError::InvalidPagination { page, page_size })?;

        let filtered = filters
            .iter()
            .fold(Self::Entity::find(), |select, filter| {
                select.filter(filter.column.eq(filter.value.clone()))
            });
        let page_query = filtered
            .clone()
            .order_by_asc(Self::Entity::id_column())
            .limit(page_size)
            .offset(offset);

        let (total, items) =
            tokio::try_join!(filtered.count(self.db()), page_query.all(self.db()))
                .map_err(DaoLayerError::Db)?;

        Ok(PaginatedResponse::new(items, page, page_size, total))
    }

    async fn update<F>(&self, id: i32, apply: F) -> DaoResult<<Self::Entity as EntityTrait>::Model>
    where
        F: for<'a> FnOnce(&'a mut <Self::Entity as EntityTrait>::ActiveModel) + Send,
    {
        let model = self.find_by_id(id).await?;

        let mut active = model.into_active_model();
        apply(&mut active);
        active.set_updated_at(Utc::now().fixed_offset());

        active
            .update(self.db())
            .await
            .map_err(|err| DaoLayerError::from_db(Self::NAME, err))
    }

    async fn delete(&self, id: i32) -> DaoResult<i32> {
        let result = Self::Entity::delete_by_id(id)
            .exec(self.db())
            .await
            .map_err(DaoLayerError::Db)?;

        if result.rows_affected == 0 {
            return Err(DaoLayerError::NotFound {
                entity: Self::NAME,
                id,
            });
        }

        Ok(id)
    }
}
