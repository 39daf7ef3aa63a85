/// Authentication and authorization
///
/// # Modules
///
/// - [`jwt`]: HS256 token validation (and creation, for tooling and tests)
/// - [`middleware`]: Bearer-token extraction into an [`middleware::AuthContext`]
/// - [`authorization`]: Permission gates backed by the resolver

pub mod authorization;
pub mod jwt;
pub mod middleware;
