// Data layer for the campus Q&A app.
// A gateway to the backend plus a reactive store the UI renders from.

pub mod api;
pub mod config;
pub mod error;
pub mod storage;
pub mod store;

#[cfg(test)]
mod testing;

pub use api::{Gateway, HttpTransport, ReqwestTransport};
pub use config::Config;
pub use error::{ApiError, Result};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{Store, StoreState};
