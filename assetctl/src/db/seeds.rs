//! Rows every company starts with.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::{AssetGroups, Repository, Statuses},
        models::{asset_groups::AssetGroupCreateDBRequest, statuses::StatusCreateDBRequest},
    },
    types::{CompanyId, UserId},
};

/// Catch-all asset group. It cannot be renamed or deleted, and deleting any other group moves its
/// assets here.
pub const DEFAULT_ASSET_GROUP: &str = "miscellaneous";

pub const DEFAULT_STATUSES: [&str; 5] = ["Disposed", "Expired", "In Repair", "In Store", "In Use"];

/// Create the default asset group and statuses for a new company, attributed to its founder.
#[instrument(skip(conn), err)]
pub async fn seed_company(conn: &mut PgConnection, company_id: CompanyId, founder: UserId) -> Result<()> {
    AssetGroups::new(&mut *conn, company_id)
        .create(&AssetGroupCreateDBRequest {
            user_id: Some(founder),
            asset_group_name: DEFAULT_ASSET_GROUP.to_string(),
        })
        .await?;

    let mut statuses = Statuses::new(&mut *conn, company_id);
    for name in DEFAULT_STATUSES {
        statuses
            .create(&StatusCreateDBRequest {
                user_id: Some(founder),
                status_name: name.to_string(),
            })
            .await?;
    }

    Ok(())
}
