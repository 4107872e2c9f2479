//! Schema introspection and table bindings.
//!
//! At startup the resolver reflects the available tables once and binds
//! handles to the four tables the API serves from. Missing tables are
//! recorded as `Unbound` rather than failing startup; dependent handlers
//! short-circuit with a table-not-found outcome. Bindings are immutable after
//! startup and shared read-only by all handlers.

use std::collections::HashSet;

use sqlx::PgPool;
use tracing::{info, warn};

// The four tables the indexer is expected to populate.
pub const POOL_MATRIX_TABLE: &str = "pool_matrix";
pub const RECENT_SWAPS_TABLE: &str = "recent_swaps";
pub const TOKEN_HOLDERS_TABLE: &str = "token_holders";
pub const PRICE_TICKS_TABLE: &str = "price_ticks";

// Columns the handlers filter and order on.
pub const CONTRACT_ADDRESS_COLUMN: &str = "contract_address";
pub const TOTAL_LIQUIDITY_COLUMN: &str = "total_liquidity";
pub const DENOM_COLUMN: &str = "denom";
pub const DISPLAY_AMOUNT_COLUMN: &str = "display_amount";

/// A verified reference to a reflected table. Only ever constructed from the
/// fixed table-name constants above, so the name is safe to splice into SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    name: &'static str,
}

impl TableRef {
    fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// An optional handle to a reflected table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TableBinding {
    Bound(TableRef),
    #[default]
    Unbound,
}

impl TableBinding {
    /// The bound table, if any.
    pub fn as_ref(&self) -> Option<&TableRef> {
        match self {
            Self::Bound(table) => Some(table),
            Self::Unbound => None,
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Bound(_))
    }
}

/// The four independent table bindings, resolved once at startup.
#[derive(Debug, Clone, Default)]
pub struct TableBindings {
    pub pools: TableBinding,
    pub swaps: TableBinding,
    pub holders: TableBinding,
    pub ticks: TableBinding,
}

impl TableBindings {
    /// Bind each expected table that appears in the reflected name set.
    pub fn from_table_names(names: &HashSet<String>) -> Self {
        let bind = |name: &'static str| {
            if names.contains(name) {
                TableBinding::Bound(TableRef::new(name))
            } else {
                warn!(table = name, "Expected table not present in schema");
                TableBinding::Unbound
            }
        };

        Self {
            pools: bind(POOL_MATRIX_TABLE),
            swaps: bind(RECENT_SWAPS_TABLE),
            holders: bind(TOKEN_HOLDERS_TABLE),
            ticks: bind(PRICE_TICKS_TABLE),
        }
    }
}

/// Startup schema resolver.
pub struct SchemaResolver;

impl SchemaResolver {
    /// Reflect the schema and bind the expected tables.
    ///
    /// Introspection failure is logged and yields all-unbound bindings; the
    /// process still starts and serves table-not-found responses.
    pub async fn resolve(pool: &PgPool) -> TableBindings {
        match Self::list_tables(pool).await {
            Ok(names) => {
                let bindings = TableBindings::from_table_names(&names);
                info!(
                    reflected = names.len(),
                    pools = bindings.pools.is_bound(),
                    swaps = bindings.swaps.is_bound(),
                    holders = bindings.holders.is_bound(),
                    ticks = bindings.ticks.is_bound(),
                    "Resolved table bindings"
                );
                bindings
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Schema introspection failed; starting with no table bindings"
                );
                TableBindings::default()
            }
        }
    }

    async fn list_tables(pool: &PgPool) -> Result<HashSet<String>, sqlx::Error> {
        let names: Vec<String> = sqlx::query_scalar(queries::LIST_TABLES)
            .fetch_all(pool)
            .await?;
        Ok(names.into_iter().collect())
    }
}

mod queries {
    pub const LIST_TABLES: &str = r#"
        SELECT table_name
        FROM information_schema.tables
        WHERE table_schema = current_schema()
        AND table_type = 'BASE TABLE'
        ORDER BY table_name
        "#;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tables: &[&str]) -> HashSet<String> {
        tables.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_all_tables_present() {
        let bindings = TableBindings::from_table_names(&names(&[
            POOL_MATRIX_TABLE,
            RECENT_SWAPS_TABLE,
            TOKEN_HOLDERS_TABLE,
            PRICE_TICKS_TABLE,
            "unrelated_table",
        ]));
        assert!(bindings.pools.is_bound());
        assert!(bindings.swaps.is_bound());
        assert!(bindings.holders.is_bound());
        assert!(bindings.ticks.is_bound());
        assert_eq!(bindings.pools.as_ref().unwrap().name(), POOL_MATRIX_TABLE);
    }

    #[test]
    fn test_missing_tables_stay_unbound() {
        let bindings = TableBindings::from_table_names(&names(&[POOL_MATRIX_TABLE]));
        assert!(bindings.pools.is_bound());
        assert!(!bindings.swaps.is_bound());
        assert!(!bindings.holders.is_bound());
        assert!(!bindings.ticks.is_bound());
    }

    #[test]
    fn test_default_bindings_are_unbound() {
        let bindings = TableBindings::default();
        assert!(!bindings.pools.is_bound());
        assert!(bindings.pools.as_ref().is_none());
    }
}
