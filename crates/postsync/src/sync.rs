//! Additive schema synchronization.
//!
//! [`SchemaSync`] brings a database in line with a desired [`Schema`]: missing
//! tables are created, missing columns and indices are added. Nothing that
//! already exists is dropped, renamed or altered; such differences are
//! reported and skipped.
//!
//! ```ignore
//! let config = postsync::Config::from_env()?;
//! let report = postsync::run(&config, postsync::Schema::collect()).await?;
//! println!("{} statements applied", report.applied.len());
//! ```

use crate::config::Config;
use crate::diff::{Change, SchemaDiff, SchemaDiffExt};
use crate::introspect::introspect_tables;
use crate::traced::ClientExt;
use crate::{Error, Result};
use postsync_schema::Schema;
use tokio_postgres::{Client, NoTls};
use tracing::{Instrument, error, info, info_span, warn};

/// What a synchronization run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Statements executed, in order.
    pub applied: Vec<String>,
    /// Differences that were left alone because applying them is not additive.
    pub skipped: Vec<SkippedChange>,
}

impl SyncReport {
    /// True when the database already matched and nothing was skipped.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty() && self.skipped.is_empty()
    }
}

/// A difference the synchronizer refused to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedChange {
    pub table: String,
    pub change: Change,
}

/// Synchronizes a database with a desired schema.
pub struct SchemaSync {
    desired: Schema,
}

impl SchemaSync {
    /// Create a synchronizer for the given desired schema.
    pub fn new(desired: Schema) -> Self {
        Self { desired }
    }

    /// The desired schema.
    pub fn desired(&self) -> &Schema {
        &self.desired
    }

    /// Compare the desired schema with the database, without changing anything.
    ///
    /// Only tables named in the desired schema are read, so tables managed by
    /// something else never show up as drops.
    pub async fn plan(&self, client: &Client) -> Result<SchemaDiff> {
        let names: Vec<&str> = self.desired.tables.keys().map(String::as_str).collect();
        let current = introspect_tables(client, &names).await?;
        Ok(self.desired.diff(&current))
    }

    /// Apply every additive change, in order, and skip the rest.
    ///
    /// Stops at the first rejected statement; statements already executed
    /// stay applied.
    pub async fn apply(&self, client: &Client) -> Result<SyncReport> {
        let diff = self.plan(client).await?;
        let mut report = SyncReport::default();

        if diff.is_empty() {
            info!(
                tables = self.desired.tables.len(),
                "schema is already up to date"
            );
            return Ok(report);
        }

        info!(changes = diff.change_count(), "schema differs from entities");

        let traced = client.traced();
        for (table, change) in diff.changes() {
            if !change.is_additive() {
                warn!(%table, %change, "skipping non-additive change");
                report.skipped.push(SkippedChange {
                    table: table.to_string(),
                    change: change.clone(),
                });
                continue;
            }

            let span = info_span!("schema.change", %table, %change);
            info!(parent: &span, "applying");
            for sql in change.statements(table) {
                traced
                    .execute(&sql, &[])
                    .instrument(span.clone())
                    .await
                    .map_err(|source| Error::Ddl {
                        sql: sql.clone(),
                        source,
                    })?;
                report.applied.push(sql);
            }
        }

        info!(
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "schema synchronized"
        );

        Ok(report)
    }
}

/// Open a database connection.
///
/// The connection driver runs on a spawned task for as long as the returned
/// client is alive.
pub async fn connect(config: &Config) -> Result<Client> {
    let (client, connection) = config
        .pg_config()
        .connect(NoTls)
        .await
        .map_err(Error::Connect)?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!(error = %e, "database connection error");
        }
    });

    Ok(client)
}

/// Connect, then synchronize `desired` additively.
pub async fn run(config: &Config, desired: Schema) -> Result<SyncReport> {
    let client = connect(config).await?;
    SchemaSync::new(desired).apply(&client).await
}
