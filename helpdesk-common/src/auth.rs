mod identity;
mod policy;

pub use identity::Identity;
pub use policy::{AccessPolicy, Action};
