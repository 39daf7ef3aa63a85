/// API route handlers
///
/// - `health`: Health check endpoint
/// - `permissions`: Effective permissions, checks and the catalog
/// - `roles`: Role assignment
/// - `content`: Tenant-filtered content listings

pub mod content;
pub mod health;
pub mod permissions;
pub mod roles;
