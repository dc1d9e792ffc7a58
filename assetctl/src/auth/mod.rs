//! Authentication and authorization.
//!
//! - [`session`]: signing and verifying bearer tokens
//! - [`password`]: Argon2 password hashing
//! - [`identity`]: per-request identity resolution and the [`identity::Caller`] extractor
//! - [`policies`]: composable route guards
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use assetctl::auth::{identity::Caller, policies::{self, PathScope}};
//!
//! async fn handler(Path(company_id): Path<String>, caller: Caller) -> Result<Json<Thing>> {
//!     let identity = caller.authorize(policies::company_admin(), &PathScope::company(&company_id))?;
//!     // ...
//! }
//! ```

pub mod identity;
pub mod password;
pub mod policies;
pub mod session;
