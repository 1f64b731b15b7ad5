//! Query executor contract and result materialization
//!
//! A [`QueryExecutor`] runs a named statement and hands back raw rows.
//! [`QueryExecutorExt`] is what repositories call. It checks the parameter
//! count and that the statement reads or writes as the helper expects, then
//! applies the request context and materializes rows into a scalar, a single
//! struct, or a collection.
//!
//! Materialization never turns an empty result into an error. Scalar and
//! single-struct destinations fall back to `T::default()` (zero id, empty
//! string), and collections come back empty. Callers that need "not found"
//! must test for the zero value themselves.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::{DeserializeOwned, Error as _};
use serde_json::Value;
use tracing::debug;

use crate::context::RequestContext;
use crate::error::{QueryError, QueryErrorKind, QueryResult};
use crate::query::{NamedQuery, QueryKind, QueryParam};

/// One materialized row, keyed by column name
pub type Record = serde_json::Map<String, Value>;

/// Store client able to run named queries
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a read statement and return every row
    async fn fetch(
        &self,
        query: NamedQuery,
        params: &[QueryParam],
    ) -> Result<Vec<Record>, QueryErrorKind>;

    /// Run a write statement and return the number of rows affected
    async fn execute(&self, query: NamedQuery, params: &[QueryParam])
        -> Result<u64, QueryErrorKind>;
}

#[async_trait]
impl<E: QueryExecutor + ?Sized> QueryExecutor for Arc<E> {
    async fn fetch(
        &self,
        query: NamedQuery,
        params: &[QueryParam],
    ) -> Result<Vec<Record>, QueryErrorKind> {
        (**self).fetch(query, params).await
    }

    async fn execute(
        &self,
        query: NamedQuery,
        params: &[QueryParam],
    ) -> Result<u64, QueryErrorKind> {
        (**self).execute(query, params).await
    }
}

fn check_call(
    query: NamedQuery,
    expected: QueryKind,
    params: &[QueryParam],
) -> Result<(), QueryErrorKind> {
    if params.len() != query.arity() {
        return Err(QueryErrorKind::ArityMismatch {
            expected: query.arity(),
            actual: params.len(),
        });
    }
    if query.kind() != expected {
        return Err(QueryErrorKind::KindMismatch {
            expected,
            actual: query.kind(),
        });
    }
    Ok(())
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, QueryErrorKind> {
    serde_json::from_value(value).map_err(QueryErrorKind::Decode)
}

/// Typed select/modify helpers available on every executor
#[async_trait]
pub trait QueryExecutorExt: QueryExecutor {
    /// Fetch raw rows under the request context
    async fn select_records(
        &self,
        ctx: &RequestContext,
        query: NamedQuery,
        params: &[QueryParam],
    ) -> QueryResult<Vec<Record>> {
        debug!(operation = %query, params = params.len(), "executing select");
        let result = async {
            check_call(query, QueryKind::Select, params)?;
            ctx.run(self.fetch(query, params)).await
        }
        .await;

        result.map_err(|kind| {
            debug!(operation = %query, error = %kind, "select failed");
            QueryError::new(query, kind)
        })
    }

    /// First column of the first row; `T::default()` when nothing matches
    async fn select_scalar<T>(
        &self,
        ctx: &RequestContext,
        query: NamedQuery,
        params: &[QueryParam],
    ) -> QueryResult<T>
    where
        T: DeserializeOwned + Default + Send,
    {
        let records = self.select_records(ctx, query, params).await?;
        let Some(record) = records.into_iter().next() else {
            return Ok(T::default());
        };

        if record.len() != 1 {
            let err = serde_json::Error::custom(format!(
                "scalar destination expects one column, row has {}",
                record.len()
            ));
            return Err(QueryError::new(query, QueryErrorKind::Decode(err)));
        }

        match record.into_iter().next() {
            Some((_, Value::Null)) | None => Ok(T::default()),
            Some((_, value)) => decode(value).map_err(|kind| QueryError::new(query, kind)),
        }
    }

    /// First row as a struct; `T::default()` when nothing matches
    async fn select_one<T>(
        &self,
        ctx: &RequestContext,
        query: NamedQuery,
        params: &[QueryParam],
    ) -> QueryResult<T>
    where
        T: DeserializeOwned + Default + Send,
    {
        let records = self.select_records(ctx, query, params).await?;
        match records.into_iter().next() {
            Some(record) => {
                decode(Value::Object(record)).map_err(|kind| QueryError::new(query, kind))
            }
            None => Ok(T::default()),
        }
    }

    /// Every row as a struct; empty when nothing matches
    async fn select_all<T>(
        &self,
        ctx: &RequestContext,
        query: NamedQuery,
        params: &[QueryParam],
    ) -> QueryResult<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        let records = self.select_records(ctx, query, params).await?;
        records
            .into_iter()
            .map(|record| decode(Value::Object(record)))
            .collect::<Result<Vec<T>, _>>()
            .map_err(|kind| QueryError::new(query, kind))
    }

    /// Run a write statement; zero affected rows is not an error
    async fn modify(
        &self,
        ctx: &RequestContext,
        query: NamedQuery,
        params: &[QueryParam],
    ) -> QueryResult<u64> {
        debug!(operation = %query, params = params.len(), "executing modify");
        let result = async {
            check_call(query, QueryKind::Modify, params)?;
            ctx.run(self.execute(query, params)).await
        }
        .await;

        result.map_err(|kind| {
            debug!(operation = %query, error = %kind, "modify failed");
            QueryError::new(query, kind)
        })
    }
}

impl<E: QueryExecutor + ?Sized> QueryExecutorExt for E {}
