/// Authentication and authorization
///
/// # Modules
///
/// - [`actor`]: the per-request authenticated identity
/// - [`policy`]: pure access decisions over actors, tasks and users
/// - [`identity`]: email/password verification
/// - [`password`]: Argon2id hashing
/// - [`jwt`]: HS256 session tokens carrying the actor's role
/// - [`middleware`]: Axum middleware that turns a bearer token into an [`actor::Actor`]

pub mod actor;
pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;
