use anyhow::Result;
use tracing::*;

use crate::config::load_config;

pub(crate) async fn command(cli: &crate::Cli) -> Result<()> {
    let config = load_config(&cli.config, true)?;
    info!(
        staff_roles = ?config.store.policy.staff_roles,
        grant_role = %config.store.upgrade.grant_role,
        "No problems found"
    );
    Ok(())
}
