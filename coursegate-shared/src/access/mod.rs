/// Permission aggregation
///
/// # Modules
///
/// - [`catalog`]: Static permission names, labels and categories
/// - [`resolver`]: Folds role assignments into effective permission sets
/// - [`check`]: Evaluates "has any/all of these permissions" requests
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use coursegate_shared::access::check::{evaluate, CheckRequest};
/// use coursegate_shared::access::resolver::PermissionResolver;
/// use coursegate_shared::store::memory::InMemoryStore;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = PermissionResolver::new(Arc::new(InMemoryStore::new()));
/// let effective = resolver.effective_permissions(Uuid::new_v4(), None).await?;
///
/// let outcome = evaluate(&effective, &CheckRequest {
///     permissions: vec!["quizzes.read".to_string()],
///     tenant_id: None,
///     require_all: false,
/// });
/// assert!(!outcome.granted);
/// # Ok(())
/// # }
/// ```

pub mod catalog;
pub mod check;
pub mod resolver;
