pub mod fs;
pub mod hash;
