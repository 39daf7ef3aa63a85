//! # CourseGate Shared Library
//!
//! Domain types and logic behind the CourseGate API: who may do what inside
//! which tenant, and which content a tenant's users can see.
//!
//! ## Module Organization
//!
//! - `models`: Database rows and their queries
//! - `access`: Permission catalog, effective-permission resolver, checks
//! - `content`: Tenant content visibility filter
//! - `store`: Persistence traits with Postgres and in-memory backends
//! - `auth`: JWT validation, request authentication, permission gates
//! - `db`: Connection pool and migrations

pub mod access;
pub mod auth;
pub mod content;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the CourseGate shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
