//! Database repository for companies.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::{DbError, Result},
        models::companies::{CompanyCreateDBRequest, CompanyDBResponse, CompanyUpdateDBRequest},
    },
    types::CompanyId,
};

pub struct Companies<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Companies<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(company_name = %request.company_name), err)]
    pub async fn create(&mut self, request: &CompanyCreateDBRequest) -> Result<CompanyDBResponse> {
        let company = sqlx::query_as::<_, CompanyDBResponse>(
            r#"
            INSERT INTO companies (company_name)
            VALUES ($1)
            RETURNING id, company_name, created_at, updated_at
            "#,
        )
        .bind(&request.company_name)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(company)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: CompanyId) -> Result<Option<CompanyDBResponse>> {
        let company = sqlx::query_as::<_, CompanyDBResponse>("SELECT id, company_name, created_at, updated_at FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(company)
    }

    #[instrument(skip(self, request), err)]
    pub async fn update(&mut self, id: CompanyId, request: &CompanyUpdateDBRequest) -> Result<CompanyDBResponse> {
        let company = sqlx::query_as::<_, CompanyDBResponse>(
            r#"
            UPDATE companies SET
                company_name = COALESCE($2, company_name),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, company_name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&request.company_name)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(company)
    }

    /// Delete a company. Every owned row goes with it through `ON DELETE CASCADE`.
    #[instrument(skip(self), err)]
    pub async fn delete(&mut self, id: CompanyId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_company_crud(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Companies::new(&mut conn);

        let created = repo
            .create(&CompanyCreateDBRequest {
                company_name: "Acme".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(created.company_name, "Acme");

        let untouched = repo
            .update(created.id, &CompanyUpdateDBRequest { company_name: None })
            .await
            .unwrap();
        assert_eq!(untouched.company_name, "Acme");

        let renamed = repo
            .update(
                created.id,
                &CompanyUpdateDBRequest {
                    company_name: Some("Acme Ltd".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.company_name, "Acme Ltd");

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
        assert!(!repo.delete(created.id).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_missing_company(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let result = Companies::new(&mut conn)
            .update(999, &CompanyUpdateDBRequest { company_name: None })
            .await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }
}
