//! Database repository for vendors.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::{
            NamedRef,
            vendors::{VendorCreateDBRequest, VendorDBResponse, VendorUpdateDBRequest},
        },
    },
    types::{CompanyId, VendorId},
};

/// Filter for listing vendors. A `limit` of `None` returns every match.
#[derive(Debug, Clone, Default)]
pub struct VendorFilter {
    pub skip: i64,
    pub limit: Option<i64>,
    pub search: Option<String>, // Case-insensitive substring search on the name
}

impl VendorFilter {
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

const VENDOR_COLUMNS: &str = "id, company_id, user_id, vendor_name, contact_person, email, notes, created_at, updated_at";

pub struct Vendors<'c> {
    db: &'c mut PgConnection,
    company_id: CompanyId,
}

impl<'c> Vendors<'c> {
    pub fn new(db: &'c mut PgConnection, company_id: CompanyId) -> Self {
        Self { db, company_id }
    }

    #[instrument(skip(self), fields(company_id = self.company_id), err)]
    pub async fn get_by_name(&mut self, name: &str) -> Result<Option<VendorDBResponse>> {
        let query = format!("SELECT {VENDOR_COLUMNS} FROM vendors WHERE company_id = $1 AND vendor_name = $2");
        let vendor = sqlx::query_as::<_, VendorDBResponse>(&query)
            .bind(self.company_id)
            .bind(name)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(vendor)
    }

    #[instrument(skip(self), fields(company_id = self.company_id), err)]
    pub async fn refs(&mut self) -> Result<Vec<NamedRef>> {
        let refs = sqlx::query_as::<_, NamedRef>("SELECT id, vendor_name AS name FROM vendors WHERE company_id = $1 ORDER BY id")
            .bind(self.company_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(refs)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Vendors<'c> {
    type CreateRequest = VendorCreateDBRequest;
    type UpdateRequest = VendorUpdateDBRequest;
    type Response = VendorDBResponse;
    type Id = VendorId;
    type Filter = VendorFilter;

    #[instrument(skip(self, request), fields(company_id = self.company_id, name = %request.vendor_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let query = format!(
            r#"
            INSERT INTO vendors (company_id, user_id, vendor_name, contact_person, email, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {VENDOR_COLUMNS}
            "#
        );
        let vendor = sqlx::query_as::<_, VendorDBResponse>(&query)
            .bind(self.company_id)
            .bind(request.user_id)
            .bind(&request.vendor_name)
            .bind(&request.contact_person)
            .bind(&request.email)
            .bind(&request.notes)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(vendor)
    }

    #[instrument(skip(self), fields(company_id = self.company_id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {VENDOR_COLUMNS} FROM vendors WHERE company_id = $1 AND id = $2");
        let vendor = sqlx::query_as::<_, VendorDBResponse>(&query)
            .bind(self.company_id)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(vendor)
    }

    #[instrument(skip(self, filter), fields(company_id = self.company_id), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = format!(
            r#"
            SELECT {VENDOR_COLUMNS} FROM vendors
            WHERE company_id = $1
              AND ($2::text IS NULL OR vendor_name ILIKE '%' || $2 || '%')
            ORDER BY id ASC
            LIMIT $3 OFFSET $4
            "#
        );
        let vendors = sqlx::query_as::<_, VendorDBResponse>(&query)
            .bind(self.company_id)
            .bind(&filter.search)
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(vendors)
    }

    #[instrument(skip(self, filter), fields(company_id = self.company_id), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM vendors
            WHERE company_id = $1
              AND ($2::text IS NULL OR vendor_name ILIKE '%' || $2 || '%')
            "#,
        )
        .bind(self.company_id)
        .bind(&filter.search)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(count)
    }

    /// Delete a vendor. Its asset links go with it; the assets stay.
    #[instrument(skip(self), fields(company_id = self.company_id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM vendors WHERE company_id = $1 AND id = $2")
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
            UPDATE vendors SET
                vendor_name = COALESCE($3, vendor_name),
                contact_person = COALESCE($4, contact_person),
                email = COALESCE($5, email),
                notes = COALESCE($6, notes),
                updated_at = NOW()
            WHERE company_id = $1 AND id = $2
            RETURNING {VENDOR_COLUMNS}
            "#
        );
        let vendor = sqlx::query_as::<_, VendorDBResponse>(&query)
            .bind(self.company_id)
            .bind(id)
            .bind(&request.vendor_name)
            .bind(&request.contact_person)
            .bind(&request.email)
            .bind(&request.notes)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(vendor)
    }
}
