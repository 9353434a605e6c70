//! Data-access layer: the store-neutral document model, timestamp
//! resolution, typed paths, and the backend implementations.

pub mod document;
pub mod document_store;
pub mod models;
pub mod paths;
pub mod storage;
pub mod timestamp;
