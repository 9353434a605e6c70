//! Firestore REST v1 backend for the document store.

pub mod config;
pub mod error;
pub mod models;
pub mod store;

pub use config::FirestoreConfig;
pub use error::{FirestoreApiError, FirestoreResult};
pub use store::FirestoreDocumentStore;
