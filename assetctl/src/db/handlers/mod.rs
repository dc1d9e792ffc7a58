//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection or transaction and owns the queries for one table.
//! Inventory repositories ([`AssetGroups`], [`Assets`], [`Statuses`], [`Vendors`]) are created for
//! a single company and scope every statement to it; [`Users`], [`Companies`] and [`Admins`] take
//! ids explicitly because they are also used before a company is known.
//!
//! # Available Repositories
//!
//! - [`Companies`]: Tenants
//! - [`Users`]: User accounts, duplicate checks and soft deletion
//! - [`Admins`]: The admin relation behind `isAdmin`
//! - [`AssetGroups`]: Asset groups and reassignment into the default group
//! - [`Assets`]: Assets with their status and vendor links
//! - [`Vendors`]: Vendors
//! - [`Statuses`]: Asset statuses
//!
//! # Common Pattern
//!
//! ```ignore
//! use assetctl::db::handlers::{Assets, Repository};
//!
//! let mut tx = pool.begin().await?;
//! let asset = Assets::new(&mut tx, company_id).create(&request).await?;
//! tx.commit().await?;
//! ```

pub mod admins;
pub mod asset_groups;
pub mod assets;
pub mod companies;
pub mod repository;
pub mod statuses;
pub mod users;
pub mod vendors;

pub use admins::Admins;
pub use asset_groups::AssetGroups;
pub use assets::Assets;
pub use companies::Companies;
pub use repository::Repository;
pub use statuses::Statuses;
pub use users::Users;
pub use vendors::Vendors;
