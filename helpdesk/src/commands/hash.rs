use std::io::stdin;

use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use helpdesk_common::helpers::hash::hash_password;
use helpdesk_common::Secret;

pub(crate) async fn command() -> Result<()> {
    let mut input = String::new();

    if console::user_attended() {
        input = dialoguer::Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Password to be hashed")
            .interact()?;
    } else {
        stdin().read_line(&mut input)?;
    }

    let hash = hash_password(&Secret::new(input.trim_end_matches(['\r', '\n']).to_owned()))?;
    println!("{hash}");
    Ok(())
}
