pub mod hash;
pub mod logger;
