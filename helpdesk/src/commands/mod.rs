pub mod check;
mod common;
pub mod create_user;
pub mod hash;
pub mod run;
