pub mod filename;
pub mod jwt;
pub mod urls;
