/// API route handlers, one module per resource
///
/// - `health`: liveness and database connectivity
/// - `auth`: login and token issuance
/// - `tasks`: task listing and CRUD
/// - `users`: user administration

pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;
