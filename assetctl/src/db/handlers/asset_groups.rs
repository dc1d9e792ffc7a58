//! Database repository for asset groups.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::{
            NamedRef,
            asset_groups::{AssetGroupCreateDBRequest, AssetGroupDBResponse, AssetGroupUpdateDBRequest},
        },
    },
    types::{AssetGroupId, CompanyId},
};

/// Filter for listing asset groups. A `limit` of `None` returns every match.
#[derive(Debug, Clone, Default)]
pub struct AssetGroupFilter {
    pub skip: i64,
    pub limit: Option<i64>,
    pub search: Option<String>, // Case-insensitive substring search on the name
}

impl AssetGroupFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit: Some(limit),
            search: None,
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search;
        self
    }
}

const ASSET_GROUP_COLUMNS: &str = "id, company_id, user_id, asset_group_name, created_at, updated_at";

pub struct AssetGroups<'c> {
    db: &'c mut PgConnection,
    company_id: CompanyId,
}

impl<'c> AssetGroups<'c> {
    pub fn new(db: &'c mut PgConnection, company_id: CompanyId) -> Self {
        Self { db, company_id }
    }

    #[instrument(skip(self), fields(company_id = self.company_id), err)]
    pub async fn get_by_name(&mut self, name: &str) -> Result<Option<AssetGroupDBResponse>> {
        let query = format!("SELECT {ASSET_GROUP_COLUMNS} FROM asset_groups WHERE company_id = $1 AND asset_group_name = $2");
        let group = sqlx::query_as::<_, AssetGroupDBResponse>(&query)
            .bind(self.company_id)
            .bind(name)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(group)
    }

    /// Move every asset of group `from` into group `to`. Returns the number of assets moved.
    #[instrument(skip(self), fields(company_id = self.company_id), err)]
    pub async fn reassign_assets(&mut self, from: AssetGroupId, to: AssetGroupId) -> Result<u64> {
        let result = sqlx::query("UPDATE assets SET asset_group_id = $3, updated_at = NOW() WHERE company_id = $1 AND asset_group_id = $2")
            .bind(self.company_id)
            .bind(from)
            .bind(to)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(company_id = self.company_id), err)]
    pub async fn refs(&mut self) -> Result<Vec<NamedRef>> {
        let refs = sqlx::query_as::<_, NamedRef>("SELECT id, asset_group_name AS name FROM asset_groups WHERE company_id = $1 ORDER BY id")
            .bind(self.company_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(refs)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for AssetGroups<'c> {
    type CreateRequest = AssetGroupCreateDBRequest;
    type UpdateRequest = AssetGroupUpdateDBRequest;
    type Response = AssetGroupDBResponse;
    type Id = AssetGroupId;
    type Filter = AssetGroupFilter;

    #[instrument(skip(self, request), fields(company_id = self.company_id, name = %request.asset_group_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let query = format!(
            r#"
            INSERT INTO asset_groups (company_id, user_id, asset_group_name)
            VALUES ($1, $2, $3)
            RETURNING {ASSET_GROUP_COLUMNS}
            "#
        );
        let group = sqlx::query_as::<_, AssetGroupDBResponse>(&query)
            .bind(self.company_id)
            .bind(request.user_id)
            .bind(&request.asset_group_name)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(group)
    }

    #[instrument(skip(self), fields(company_id = self.company_id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {ASSET_GROUP_COLUMNS} FROM asset_groups WHERE company_id = $1 AND id = $2");
        let group = sqlx::query_as::<_, AssetGroupDBResponse>(&query)
            .bind(self.company_id)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(group)
    }

    #[instrument(skip(self, filter), fields(company_id = self.company_id), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = format!(
            r#"
            SELECT {ASSET_GROUP_COLUMNS} FROM asset_groups
            WHERE company_id = $1
              AND ($2::text IS NULL OR asset_group_name ILIKE '%' || $2 || '%')
            ORDER BY id ASC
            LIMIT $3 OFFSET $4
            "#
        );
        let groups = sqlx::query_as::<_, AssetGroupDBResponse>(&query)
            .bind(self.company_id)
            .bind(&filter.search)
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(groups)
    }

    #[instrument(skip(self, filter), fields(company_id = self.company_id), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM asset_groups
            WHERE company_id = $1
              AND ($2::text IS NULL OR asset_group_name ILIKE '%' || $2 || '%')
            "#,
        )
        .bind(self.company_id)
        .bind(&filter.search)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(count)
    }

    #[instrument(skip(self), fields(company_id = self.company_id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM asset_groups WHERE company_id = $1 AND id = $2")
            .bind(self.company_id)
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(company_id = self.company_id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let query = format!(
            r#"
            UPDATE asset_groups SET
                asset_group_name = COALESCE($3, asset_group_name),
                updated_at = NOW()
            WHERE company_id = $1 AND id = $2
            RETURNING {ASSET_GROUP_COLUMNS}
            "#
        );
        let group = sqlx::query_as::<_, AssetGroupDBResponse>(&query)
            .bind(self.company_id)
            .bind(id)
            .bind(&request.asset_group_name)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(group)
    }
}
