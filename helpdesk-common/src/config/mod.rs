mod defaults;

use std::path::PathBuf;
use std::time::Duration;

use defaults::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{ListenEndpoint, Secret, UserRole};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "_default_http_listen")]
    pub listen: ListenEndpoint,

    #[serde(default = "_default_session_max_age", with = "humantime_serde")]
    pub session_max_age: Duration,

    #[serde(default = "_default_cookie_name")]
    pub cookie_name: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            listen: _default_http_listen(),
            session_max_age: _default_session_max_age(),
            cookie_name: _default_cookie_name(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PolicyConfig {
    /// Roles treated as support staff, in addition to ADMIN.
    #[serde(default = "_default_staff_roles")]
    pub staff_roles: Vec<UserRole>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            staff_roles: _default_staff_roles(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UpgradeConfig {
    /// Role assigned to a user when their upgrade request is approved.
    #[serde(default = "_default_grant_role")]
    pub grant_role: UserRole,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            grant_role: _default_grant_role(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[serde(rename = "text")]
    #[default]
    Text,
    #[serde(rename = "json")]
    Json,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HelpdeskConfigStore {
    #[serde(default = "_default_database_url")]
    pub database_url: Secret<String>,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub upgrade: UpgradeConfig,

    /// Ticket categories created on startup if missing.
    #[serde(default = "_default_categories")]
    pub categories: Vec<String>,

    #[serde(default)]
    pub log: LogConfig,
}

impl Default for HelpdeskConfigStore {
    fn default() -> Self {
        Self {
            database_url: _default_database_url(),
            http: <_>::default(),
            policy: <_>::default(),
            upgrade: <_>::default(),
            categories: _default_categories(),
            log: <_>::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HelpdeskConfig {
    pub store: HelpdeskConfigStore,
    pub paths_relative_to: PathBuf,
}

impl HelpdeskConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let grant_role = self.store.upgrade.grant_role;
        if grant_role == UserRole::User {
            anyhow::bail!("`upgrade.grant_role` must be a staff role, not USER");
        }
        if grant_role != UserRole::Admin && !self.store.policy.staff_roles.contains(&grant_role) {
            warn!(
                %grant_role,
                "`upgrade.grant_role` is not listed in `policy.staff_roles` - approved users will not get staff privileges"
            );
        }
        if self.store.policy.staff_roles.contains(&UserRole::User) {
            warn!("`policy.staff_roles` contains USER - it will be ignored");
        }
        for name in &self.store.categories {
            if name.trim().chars().count() < 2 {
                anyhow::bail!("category name {name:?} is too short");
            }
        }
        Ok(())
    }
}
