pub mod entity;
pub mod error;
pub mod model;
pub mod password;
pub mod policy;
pub mod quota;
pub mod share;
pub mod storage;
pub mod store;
pub mod token;

pub use error::StoreError;
pub use model::{CopyUrlMode, FileEntry, Identity};
