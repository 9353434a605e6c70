//! Persistence facade for AI-generated game assessments and the per-user
//! scores recorded against them, backed by a hierarchical document store.
//!
//! The crate is deliberately thin: two accessor services
//! ([`services::AssessmentService`], [`services::ScoreService`]) validate
//! arguments, build document paths, and translate store failures into
//! operation-named errors; the [`dao::document_store::DocumentStore`] trait
//! hides the backend (Firestore over REST, or an in-memory store for tests
//! and hermetic embedders); and [`dao::timestamp`] resolves the one field
//! with real branching logic, the heterogeneous "generated at" timestamp.

pub mod config;
pub mod dao;
pub mod error;
pub mod services;
