//! docvault_core — domain core for the document repository.
//!
//! Pure value types, port traits, and the service layer. No sqlx, no axum:
//! the Postgres adapters live in `docvault_postgres` and the HTTP surface in
//! `docvault_server`, both depending on this crate through the port traits.

pub mod auth;
pub mod error;
pub mod ports;
pub mod principal;
pub mod proto;
pub mod service;
pub mod types;
