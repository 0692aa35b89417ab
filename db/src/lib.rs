//! Storage layer for the clinic backend: a relational store for structured
//! records and a document store for free-form clinical notes, each with a
//! PostgreSQL and an in-memory backend.

pub mod config;
pub mod document;
pub mod error;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod postgres;
pub mod relational;
pub mod repository;
pub mod scope;
pub mod stores;

pub use config::DbConfig;
pub use document::DocumentStore;
pub use error::{StoreError, StoreResult};
pub use relational::RelationalStore;
pub use repository::Documents;
pub use scope::PatientScope;
pub use stores::Stores;
