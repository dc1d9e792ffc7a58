//! Database repository for asset statuses.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        models::statuses::{StatusCreateDBRequest, StatusDBResponse},
    },
    types::{CompanyId, StatusId},
};

const STATUS_COLUMNS: &str = "id, company_id, user_id, status_name, created_at, updated_at";

pub struct Statuses<'c> {
    db: &'c mut PgConnection,
    company_id: CompanyId,
}

impl<'c> Statuses<'c> {
    pub fn new(db: &'c mut PgConnection, company_id: CompanyId) -> Self {
        Self { db, company_id }
    }

    #[instrument(skip(self, request), fields(company_id = self.company_id, name = %request.status_name), err)]
    pub async fn create(&mut self, request: &StatusCreateDBRequest) -> Result<StatusDBResponse> {
        let query = format!(
            r#"
            INSERT INTO statuses (company_id, user_id, status_name)
            VALUES ($1, $2, $3)
            RETURNING {STATUS_COLUMNS}
            "#
        );
        let status = sqlx::query_as::<_, StatusDBResponse>(&query)
            .bind(self.company_id)
            .bind(request.user_id)
            .bind(&request.status_name)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(status)
    }

    #[instrument(skip(self), fields(company_id = self.company_id), err)]
    pub async fn get_by_id(&mut self, id: StatusId) -> Result<Option<StatusDBResponse>> {
        let query = format!("SELECT {STATUS_COLUMNS} FROM statuses WHERE company_id = $1 AND id = $2");
        let status = sqlx::query_as::<_, StatusDBResponse>(&query)
            .bind(self.company_id)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(status)
    }

    #[instrument(skip(self), fields(company_id = self.company_id), err)]
    pub async fn get_by_name(&mut self, name: &str) -> Result<Option<StatusDBResponse>> {
        let query = format!("SELECT {STATUS_COLUMNS} FROM statuses WHERE company_id = $1 AND status_name = $2");
        let status = sqlx::query_as::<_, StatusDBResponse>(&query)
            .bind(self.company_id)
            .bind(name)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(status)
    }

    /// Every status of the company, by id.
    #[instrument(skip(self), fields(company_id = self.company_id), err)]
    pub async fn list(&mut self) -> Result<Vec<StatusDBResponse>> {
        let query = format!("SELECT {STATUS_COLUMNS} FROM statuses WHERE company_id = $1 ORDER BY id ASC");
        let statuses = sqlx::query_as::<_, StatusDBResponse>(&query)
            .bind(self.company_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(statuses)
    }
}
