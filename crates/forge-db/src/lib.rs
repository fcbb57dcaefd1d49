pub mod error;
pub mod local_storage;
mod migration;
pub mod store;

pub use error::{Error, Result};
pub use local_storage::LocalStorage;
pub use store::Store;
