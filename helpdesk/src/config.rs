use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use helpdesk_common::helpers::fs::secure_file;
use helpdesk_common::{HelpdeskConfig, HelpdeskConfigStore};
use tracing::*;

pub fn load_config(path: &Path, secure: bool) -> Result<HelpdeskConfig> {
    if secure {
        secure_file(path).context("Could not secure config")?;
    }

    let store: HelpdeskConfigStore = Config::builder()
        .add_source(File::from(path))
        .add_source(
            Environment::with_prefix("HELPDESK")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .context("Could not load config")?
        .try_deserialize()
        .context("Could not parse config")?;

    let config = HelpdeskConfig {
        store,
        paths_relative_to: path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };

    config.validate()?;

    info!(
        "Using config: {path:?} (listen: {}, categories: {})",
        config.store.http.listen,
        config.store.categories.len(),
    );
    Ok(config)
}
