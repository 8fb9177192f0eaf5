//! # WorkTasks Shared Library
//!
//! Models, access policy, identity and storage shared by the WorkTasks API server.
//!
//! ## Module Organization
//!
//! - `models`: users, tasks and pagination types
//! - `auth`: actors, the access policy, passwords, session tokens and middleware
//! - `store`: task and user stores over a Postgres or in-memory repository
//! - `db`: connection pool, migrations and first-start seeding

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the WorkTasks shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
