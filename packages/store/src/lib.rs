//! Named-query execution for sensorapi
//!
//! This crate owns everything between a repository and the database:
//!
//! - [`NamedQuery`] - the fixed set of statements and their parameter order
//! - [`QueryExecutor`] - the store client seam (PostgreSQL or in-memory)
//! - [`QueryExecutorExt`] - typed select/modify helpers with zero-value
//!   materialization
//! - [`RequestContext`] - cancellation and deadline threaded through calls
//! - [`PgQueryExecutor`] - the sqlx-backed implementation

mod context;
mod error;
mod executor;
mod postgres;
mod query;

pub use context::RequestContext;
pub use error::{QueryError, QueryErrorKind, QueryResult};
pub use executor::{QueryExecutor, QueryExecutorExt, Record};
pub use postgres::PgQueryExecutor;
pub use query::{NamedQuery, QueryKind, QueryParam};

// Re-exported so callers can build contexts from their own tokens
pub use tokio_util::sync::CancellationToken;
