pub mod auth;
mod config;
pub mod domain;
mod error;
pub mod helpers;
mod types;
pub mod validation;
pub mod version;

pub use auth::{AccessPolicy, Action, Identity};
pub use config::*;
pub use domain::*;
pub use error::*;
pub use types::*;
