//! Database layer for data persistence and access.
//!
//! SQLx over PostgreSQL, organised as one repository per table:
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries, always scoped to a company)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations
//! - [`models`]: Database record structures
//! - [`errors`]: Database-specific error types
//! - [`seeds`]: Rows every new company starts with
//!
//! # Tenancy
//!
//! Inventory repositories are constructed for a single company and add `company_id = $1` to every
//! statement, so a row belonging to another tenant is indistinguishable from a missing one:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let mut assets = Assets::new(&mut tx, company_id);
//! let asset = assets.get_by_id(asset_id).await?; // None for other companies' assets
//! tx.commit().await?;
//! ```
//!
//! # Migrations
//!
//! Migrations live in `migrations/` and are applied through [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
pub mod seeds;
