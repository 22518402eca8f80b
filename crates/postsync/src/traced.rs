//! Statement logging.
//!
//! Every statement postsync sends goes through [`TracedClient`], which opens a
//! `debug` span per statement. During [`SchemaSync::apply`](crate::SchemaSync::apply)
//! those spans nest inside a `schema.change` span naming the table and change.

use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Error, Row};
use tracing::Instrument;

/// A client that logs each statement via tracing.
///
/// ```ignore
/// use postsync::ClientExt;
///
/// let rows = client.traced().query("SELECT 1", &[]).await?;
/// ```
#[derive(Clone, Copy)]
pub struct TracedClient<'a> {
    client: &'a Client,
}

impl<'a> TracedClient<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Execute a statement, returning the number of rows affected.
    pub async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64, Error> {
        let span = tracing::debug_span!(
            "db.execute",
            sql = %sql,
            affected = tracing::field::Empty,
        );
        let affected = self
            .client
            .execute(sql, params)
            .instrument(span.clone())
            .await?;
        span.record("affected", affected);
        Ok(affected)
    }

    /// Run a query, returning all rows.
    pub async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Error> {
        let span = tracing::debug_span!("db.query", rows = tracing::field::Empty);
        let rows = self
            .client
            .query(sql, params)
            .instrument(span.clone())
            .await?;
        span.record("rows", rows.len());
        Ok(rows)
    }
}

/// `client.traced()`
pub trait ClientExt {
    fn traced(&self) -> TracedClient<'_>;
}

impl ClientExt for Client {
    fn traced(&self) -> TracedClient<'_> {
        TracedClient::new(self)
    }
}
