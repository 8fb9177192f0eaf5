/// Database plumbing
///
/// - `pool`: PostgreSQL connection pool with health check
/// - `migrations`: embedded schema migrations
/// - `seed`: first-start admin account
///
/// Queries themselves live in [`crate::store::postgres`].

pub mod migrations;
pub mod pool;
pub mod seed;
