use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use helpdesk_common::{Secret, UserRole};
use helpdesk_core::users::create_user;
use helpdesk_core::Services;
use tracing::*;

use super::common::assert_interactive_terminal;
use crate::config::load_config;

pub(crate) async fn command(
    cli: &crate::Cli,
    email: &str,
    name: &str,
    role: UserRole,
) -> Result<()> {
    assert_interactive_terminal();

    let config = load_config(&cli.config, true)?;
    let services = Services::new(config).await?;

    let password = dialoguer::Password::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Password for {email}"))
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;

    let db = services.db.lock().await;
    let user = create_user(&db, name, email, &Secret::new(password), role).await?;

    info!("{} can now log in as {}", user.name, user.email);
    Ok(())
}
