/// Middleware for the API server
///
/// Authentication lives in `worktasks_shared::auth::middleware`; this module holds
/// the HTTP-only concerns.

pub mod security;
