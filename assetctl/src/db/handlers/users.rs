//! Database repository for users.
//!
//! Users are not bound to a company at construction: sign-in looks them up by e-mail and the
//! identity resolver by id, before any company is known. Company-facing reads take the company id
//! explicitly.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::{DbError, Result},
        models::{
            NamedRef,
            users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
        },
    },
    types::{CompanyId, UserId},
};

/// Filter for listing the users of a company
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>, // Case-insensitive substring search on username
    pub include_inactive: bool,
}

impl UserFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            search: None,
            include_inactive: false,
        }
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search;
        self
    }

    pub fn include_inactive(mut self, include: bool) -> Self {
        self.include_inactive = include;
        self
    }
}

// `is_admin` is never a column; every read derives it from the admin relation.
const USER_COLUMNS: &str = r#"
    u.id, u.company_id, u.username, u.email, u.full_name, u.password_hash, u.inactive,
    EXISTS (SELECT 1 FROM admins a WHERE a.user_id = u.id) AS is_admin,
    u.created_at, u.updated_at
"#;

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(username = %request.username, company_id = request.company_id), err)]
    pub async fn create(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let query = format!(
            r#"
            WITH u AS (
                INSERT INTO users (company_id, username, email, full_name, password_hash)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT {USER_COLUMNS} FROM u
            "#
        );
        let user = sqlx::query_as::<_, UserDBResponse>(&query)
            .bind(request.company_id)
            .bind(&request.username)
            .bind(&request.email)
            .bind(&request.full_name)
            .bind(&request.password_hash)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(user)
    }

    /// Look a user up by id across all companies.
    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: UserId) -> Result<Option<UserDBResponse>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1");
        let user = sqlx::query_as::<_, UserDBResponse>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self), err)]
    pub async fn get_in_company(&mut self, company_id: CompanyId, id: UserId) -> Result<Option<UserDBResponse>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.company_id = $1 AND u.id = $2");
        let user = sqlx::query_as::<_, UserDBResponse>(&query)
            .bind(company_id)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, email), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.email = $1");
        let user = sqlx::query_as::<_, UserDBResponse>(&query)
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    /// Whether another user already holds `email`. E-mails are unique across all companies.
    #[instrument(skip(self, email), err)]
    pub async fn email_taken(&mut self, email: &str, except: Option<UserId>) -> Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(taken)
    }

    /// Whether another user of the company already holds `username`.
    #[instrument(skip(self), err)]
    pub async fn username_taken(&mut self, company_id: CompanyId, username: &str, except: Option<UserId>) -> Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE company_id = $1 AND username = $2 AND ($3::int IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(company_id)
        .bind(username)
        .bind(except)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(taken)
    }

    /// Users of a company, active ones first, then by id.
    #[instrument(skip(self, filter), fields(skip = filter.skip, limit = filter.limit), err)]
    pub async fn list(&mut self, company_id: CompanyId, filter: &UserFilter) -> Result<Vec<UserDBResponse>> {
        let query = format!(
            r#"
            SELECT {USER_COLUMNS} FROM users u
            WHERE u.company_id = $1
              AND ($2::text IS NULL OR u.username ILIKE '%' || $2 || '%')
              AND ($3 OR NOT u.inactive)
            ORDER BY u.inactive ASC, u.id ASC
            LIMIT $4 OFFSET $5
            "#
        );
        let users = sqlx::query_as::<_, UserDBResponse>(&query)
            .bind(company_id)
            .bind(&filter.search)
            .bind(filter.include_inactive)
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(users)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, company_id: CompanyId, filter: &UserFilter) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM users u
            WHERE u.company_id = $1
              AND ($2::text IS NULL OR u.username ILIKE '%' || $2 || '%')
              AND ($3 OR NOT u.inactive)
            "#,
        )
        .bind(company_id)
        .bind(&filter.search)
        .bind(filter.include_inactive)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(count)
    }

    /// Id and username of every user in a company.
    #[instrument(skip(self), err)]
    pub async fn refs(&mut self, company_id: CompanyId) -> Result<Vec<NamedRef>> {
        let refs = sqlx::query_as::<_, NamedRef>("SELECT id, username AS name FROM users WHERE company_id = $1 ORDER BY id")
            .bind(company_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(refs)
    }

    #[instrument(skip(self, request), err)]
    pub async fn update(&mut self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse> {
        // A missing `full_name` keeps the column; `Some(None)` clears it
        let (set_full_name, full_name) = match &request.full_name {
            None => (false, None),
            Some(value) => (true, value.clone()),
        };
        let query = format!(
            r#"
            WITH u AS (
                UPDATE users SET
                    username = COALESCE($2, username),
                    email = COALESCE($3, email),
                    full_name = CASE WHEN $4 THEN $5 ELSE full_name END,
                    password_hash = COALESCE($6, password_hash),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {USER_COLUMNS} FROM u
            "#
        );
        let user = sqlx::query_as::<_, UserDBResponse>(&query)
            .bind(id)
            .bind(&request.username)
            .bind(&request.email)
            .bind(set_full_name)
            .bind(full_name)
            .bind(&request.password_hash)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(user)
    }

    /// Flip the soft-delete flag.
    #[instrument(skip(self), err)]
    pub async fn set_inactive(&mut self, id: UserId, inactive: bool) -> Result<UserDBResponse> {
        let query = format!(
            r#"
            WITH u AS (
                UPDATE users SET inactive = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {USER_COLUMNS} FROM u
            "#
        );
        let user = sqlx::query_as::<_, UserDBResponse>(&query)
            .bind(id)
            .bind(inactive)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(user)
    }
}
