//! Database repository for assets.
//!
//! An asset row is always read together with its group, its status link and its optional vendor
//! link. Both link tables are keyed by `asset_id`, so the joins never multiply rows and `LIMIT`
//! pages over assets.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::{
            NamedRef, OwnedAssetRef,
            assets::{AssetCreateDBRequest, AssetDBResponse, AssetGroupSummary, AssetUpdateDBRequest, StatusSummary, VendorSummary},
        },
    },
    types::{AssetGroupId, AssetId, CompanyId, StatusId, UserId, VendorId},
};

/// Filter for listing assets. The owner filters narrow to one group, status or vendor.
#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub asset_group_id: Option<AssetGroupId>,
    pub status_id: Option<StatusId>,
    pub vendor_id: Option<VendorId>,
}

impl AssetFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search;
        self
    }

    pub fn in_group(mut self, id: AssetGroupId) -> Self {
        self.asset_group_id = Some(id);
        self
    }

    pub fn with_status(mut self, id: StatusId) -> Self {
        self.status_id = Some(id);
        self
    }

    pub fn from_vendor(mut self, id: VendorId) -> Self {
        self.vendor_id = Some(id);
        self
    }
}

/// What an asset can be listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetOwner {
    Group,
    Status,
    Vendor,
}

// Flat row of the asset joins
#[derive(Debug, FromRow)]
struct AssetRow {
    id: AssetId,
    company_id: CompanyId,
    user_id: Option<UserId>,
    asset_name: String,
    asset_group_id: AssetGroupId,
    serial_code: Option<String>,
    purchasing_cost: Option<f64>,
    current_value: Option<f64>,
    acquisition_date: Option<NaiveDate>,
    sale_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    asset_group_name: String,
    status_id: Option<StatusId>,
    status_name: Option<String>,
    vendor_id: Option<VendorId>,
    vendor_name: Option<String>,
    vendor_contact_person: Option<String>,
    vendor_email: Option<String>,
    vendor_notes: Option<String>,
}

impl From<AssetRow> for AssetDBResponse {
    fn from(row: AssetRow) -> Self {
        let status = match (row.status_id, row.status_name) {
            (Some(id), Some(status_name)) => Some(StatusSummary { id, status_name }),
            _ => None,
        };
        let vendor = match (row.vendor_id, row.vendor_name) {
            (Some(id), Some(vendor_name)) => Some(VendorSummary {
                id,
                vendor_name,
                contact_person: row.vendor_contact_person.unwrap_or_default(),
                email: row.vendor_email.unwrap_or_default(),
                notes: row.vendor_notes,
            }),
            _ => None,
        };

        Self {
            id: row.id,
            company_id: row.company_id,
            user_id: row.user_id,
            asset_name: row.asset_name,
            serial_code: row.serial_code,
            purchasing_cost: row.purchasing_cost,
            current_value: row.current_value,
            acquisition_date: row.acquisition_date,
            sale_date: row.sale_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
            asset_group: AssetGroupSummary {
                id: row.asset_group_id,
                asset_group_name: row.asset_group_name,
            },
            status,
            vendor,
        }
    }
}

const ASSET_SELECT: &str = r#"
    SELECT
        a.id, a.company_id, a.user_id, a.asset_name, a.asset_group_id, a.serial_code,
        a.purchasing_cost, a.current_value, a.acquisition_date, a.sale_date,
        a.created_at, a.updated_at,
        g.asset_group_name,
        s.id AS status_id, s.status_name,
        v.id AS vendor_id, v.vendor_name,
        v.contact_person AS vendor_contact_person, v.email AS vendor_email, v.notes AS vendor_notes
    FROM assets a
    JOIN asset_groups g ON g.id = a.asset_group_id
    LEFT JOIN assets_statuses ast ON ast.asset_id = a.id
    LEFT JOIN statuses s ON s.id = ast.status_id
    LEFT JOIN assets_vendors av ON av.asset_id = a.id
    LEFT JOIN vendors v ON v.id = av.vendor_id
"#;

const ASSET_FILTER: &str = r#"
    WHERE a.company_id = $1
      AND ($2::text IS NULL OR a.asset_name ILIKE '%' || $2 || '%')
      AND ($3::int IS NULL OR a.asset_group_id = $3)
      AND ($4::int IS NULL OR ast.status_id = $4)
      AND ($5::int IS NULL OR av.vendor_id = $5)
"#;

pub struct Assets<'c> {
    db: &'c mut PgConnection,
    company_id: CompanyId,
}

impl<'c> Assets<'c> {
    pub fn new(db: &'c mut PgConnection, company_id: CompanyId) -> Self {
        Self { db, company_id }
    }

    /// Whether another asset of the company already carries `serial_code`.
    #[instrument(skip(self), fields(company_id = self.company_id), err)]
    pub async fn serial_code_taken(&mut self, serial_code: &str, except: Option<AssetId>) -> Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM assets
                WHERE company_id = $1 AND serial_code = $2 AND ($3::int IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(self.company_id)
        .bind(serial_code)
        .bind(except)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(taken)
    }

    #[instrument(skip(self), fields(company_id = self.company_id), err)]
    pub async fn refs(&mut self) -> Result<Vec<NamedRef>> {
        let refs = sqlx::query_as::<_, NamedRef>("SELECT id, asset_name AS name FROM assets WHERE company_id = $1 ORDER BY id")
            .bind(self.company_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(refs)
    }

    /// Id and name of every asset in the company, tagged with its group, status or vendor.
    #[instrument(skip(self), fields(company_id = self.company_id), err)]
    pub async fn owned_refs(&mut self, owner: AssetOwner) -> Result<Vec<OwnedAssetRef>> {
        let query = match owner {
            AssetOwner::Group => "SELECT asset_group_id AS owner_id, id, asset_name FROM assets WHERE company_id = $1 ORDER BY id",
            AssetOwner::Status => {
                r#"
                SELECT l.status_id AS owner_id, a.id, a.asset_name
                FROM assets a JOIN assets_statuses l ON l.asset_id = a.id
                WHERE a.company_id = $1
                ORDER BY a.id
                "#
            }
            AssetOwner::Vendor => {
                r#"
                SELECT l.vendor_id AS owner_id, a.id, a.asset_name
                FROM assets a JOIN assets_vendors l ON l.asset_id = a.id
                WHERE a.company_id = $1
                ORDER BY a.id
                "#
            }
        };
        let refs = sqlx::query_as::<_, OwnedAssetRef>(query)
            .bind(self.company_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(refs)
    }

    async fn link_status(&mut self, asset_id: AssetId, status_id: StatusId) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO assets_statuses (asset_id, status_id, company_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (asset_id) DO UPDATE SET status_id = EXCLUDED.status_id
            "#,
        )
        .bind(asset_id)
        .bind(status_id)
        .bind(self.company_id)
        .execute(&mut *self.db)
        .await?;

        Ok(())
    }

    async fn link_vendor(&mut self, asset_id: AssetId, vendor_id: Option<VendorId>) -> Result<()> {
        match vendor_id {
            Some(vendor_id) => {
                sqlx::query(
                    r#"
                    INSERT INTO assets_vendors (asset_id, vendor_id, company_id)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (asset_id) DO UPDATE SET vendor_id = EXCLUDED.vendor_id
                    "#,
                )
                .bind(asset_id)
                .bind(vendor_id)
                .bind(self.company_id)
                .execute(&mut *self.db)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM assets_vendors WHERE asset_id = $1 AND company_id = $2")
                    .bind(asset_id)
                    .bind(self.company_id)
                    .execute(&mut *self.db)
                    .await?;
            }
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Assets<'c> {
    type CreateRequest = AssetCreateDBRequest;
    type UpdateRequest = AssetUpdateDBRequest;
    type Response = AssetDBResponse;
    type Id = AssetId;
    type Filter = AssetFilter;

    /// Insert the asset and its links. Run this inside a transaction so a failed link leaves
    /// nothing behind.
    #[instrument(skip(self, request), fields(company_id = self.company_id, name = %request.asset_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let asset_id = sqlx::query_scalar::<_, AssetId>(
            r#"
            INSERT INTO assets (
                company_id, user_id, asset_name, asset_group_id, serial_code,
                purchasing_cost, current_value, acquisition_date, sale_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(self.company_id)
        .bind(request.user_id)
        .bind(&request.asset_name)
        .bind(request.asset_group_id)
        .bind(&request.serial_code)
        .bind(request.purchasing_cost)
        .bind(request.current_value)
        .bind(request.acquisition_date)
        .bind(request.sale_date)
        .fetch_one(&mut *self.db)
        .await?;

        self.link_status(asset_id, request.status_id).await?;
        if request.vendor_id.is_some() {
            self.link_vendor(asset_id, request.vendor_id).await?;
        }

        self.get_by_id(asset_id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(company_id = self.company_id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("{ASSET_SELECT} WHERE a.company_id = $1 AND a.id = $2");
        let row = sqlx::query_as::<_, AssetRow>(&query)
            .bind(self.company_id)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(row.map(AssetDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(company_id = self.company_id, skip = filter.skip, limit = filter.limit), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = format!("{ASSET_SELECT} {ASSET_FILTER} ORDER BY a.id ASC LIMIT $6 OFFSET $7");
        let rows = sqlx::query_as::<_, AssetRow>(&query)
            .bind(self.company_id)
            .bind(&filter.search)
            .bind(filter.asset_group_id)
            .bind(filter.status_id)
            .bind(filter.vendor_id)
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(rows.into_iter().map(AssetDBResponse::from).collect())
    }

    #[instrument(skip(self, filter), fields(company_id = self.company_id), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let query = format!(
            r#"
            SELECT COUNT(*) FROM assets a
            LEFT JOIN assets_statuses ast ON ast.asset_id = a.id
            LEFT JOIN assets_vendors av ON av.asset_id = a.id
            {ASSET_FILTER}
            "#
        );
        let count = sqlx::query_scalar::<_, i64>(&query)
            .bind(self.company_id)
            .bind(&filter.search)
            .bind(filter.asset_group_id)
            .bind(filter.status_id)
            .bind(filter.vendor_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    #[instrument(skip(self), fields(company_id = self.company_id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM assets WHERE company_id = $1 AND id = $2")
            .bind(self.company_id)
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Apply the fields that are set and rewrite the links. Run inside a transaction.
    #[instrument(skip(self, request), fields(company_id = self.company_id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let updated = sqlx::query_scalar::<_, AssetId>(
            r#"
            UPDATE assets SET
                asset_name = COALESCE($3, asset_name),
                asset_group_id = COALESCE($4, asset_group_id),
                serial_code = COALESCE($5, serial_code),
                purchasing_cost = COALESCE($6, purchasing_cost),
                current_value = COALESCE($7, current_value),
                acquisition_date = COALESCE($8, acquisition_date),
                sale_date = COALESCE($9, sale_date),
                updated_at = NOW()
            WHERE company_id = $1 AND id = $2
            RETURNING id
            "#,
        )
        .bind(self.company_id)
        .bind(id)
        .bind(&request.asset_name)
        .bind(request.asset_group_id)
        .bind(&request.serial_code)
        .bind(request.purchasing_cost)
        .bind(request.current_value)
        .bind(request.acquisition_date)
        .bind(request.sale_date)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        if let Some(status_id) = request.status_id {
            self.link_status(updated, status_id).await?;
        }
        if let Some(vendor_id) = request.vendor_id {
            self.link_vendor(updated, vendor_id).await?;
        }

        self.get_by_id(updated).await?.ok_or(DbError::NotFound)
    }
}
