pub mod categories;
pub mod comments;
pub mod consts;
pub mod db;
pub mod lifecycle;
pub mod pagination;
mod services;
pub use services::*;
pub mod tickets;
pub mod upgrades;
pub mod users;
pub mod votes;

#[cfg(test)]
mod testing;
