//! Database access layer.
//!
//! - `pool`: PostgreSQL connection pool construction
//! - `schema`: startup schema introspection and table bindings
//! - `executor`: resilient query execution with bounded retry
//! - `rows`: row-to-JSON conversion

pub mod executor;
pub mod pool;
pub mod rows;
pub mod schema;

pub use executor::{QueryExecutor, RetryPolicy};
pub use schema::{SchemaResolver, TableBinding, TableBindings, TableRef};
