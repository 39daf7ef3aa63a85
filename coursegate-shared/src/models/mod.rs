/// Database models for CourseGate
///
/// Each model carries its row type plus the Postgres queries that load or
/// write it. Higher layers go through [`crate::store`] rather than calling
/// these directly.
///
/// # Models
///
/// - `tenant`: Organizations, subscription tier and role slots
/// - `user`: Users synced from the identity provider
/// - `permission`: Global permission catalog and tenant roles
/// - `user_role`: Role assignments and the joined read model
/// - `content`: Courses, quizzes, rewards and flashcards

pub mod content;
pub mod permission;
pub mod tenant;
pub mod user;
pub mod user_role;
