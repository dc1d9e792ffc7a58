//! Database repository for the admin relation.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::errors::Result,
    types::{CompanyId, UserId},
};

pub struct Admins<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Admins<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn create(&mut self, user_id: UserId, company_id: CompanyId) -> Result<()> {
        sqlx::query("INSERT INTO admins (user_id, company_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(company_id)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn is_admin(&mut self, user_id: UserId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM admins WHERE user_id = $1)")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(exists)
    }

    /// Whether `user_id` is the system admin of `company_id` specifically.
    #[instrument(skip(self), err)]
    pub async fn is_admin_of(&mut self, user_id: UserId, company_id: CompanyId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM admins WHERE user_id = $1 AND company_id = $2)")
            .bind(user_id)
            .bind(company_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(exists)
    }
}
