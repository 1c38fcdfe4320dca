pub mod mandate;
pub mod manifest;
