//! Domain-scoped schema migrations.
//!
//! Each domain (`workflow`, `citations`, ...) owns an ordered list of
//! [`Migration`]s, tracked independently in the shared `_migrations`
//! table so one domain's schema churn never touches another's.

/// A single forward migration within a domain.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}
