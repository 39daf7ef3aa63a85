/// Tenant-scoped content visibility
///
/// - [`filter`]: predicate builder selecting records owned by a tenant or
///   marked global

pub mod filter;
