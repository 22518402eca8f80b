//! Read the current schema back out of Postgres.
//!
//! Only base tables in the `public` schema are considered. Columns come from
//! `information_schema.columns`; primary keys and secondary indices come from
//! `pg_index`. Expression indices (no plain column references) are ignored.
//! Columns of types [`PgType`] doesn't model are kept as [`PgType::Other`].

use crate::traced::ClientExt;
use crate::{Error, Result};
use postsync_schema::{Column, Index, PgType, Schema, Table};
use tokio_postgres::Client;
use tracing::debug;

const COLUMNS_SQL: &str = r#"
SELECT
    c.table_name::text AS table_name,
    c.column_name::text AS column_name,
    c.data_type::text AS data_type,
    c.is_nullable::text = 'YES' AS nullable,
    c.column_default::text AS column_default,
    c.is_identity::text = 'YES' AS identity
FROM information_schema.columns c
JOIN information_schema.tables t
    ON t.table_schema = c.table_schema
    AND t.table_name = c.table_name
WHERE c.table_schema = 'public'
    AND t.table_type = 'BASE TABLE'
    AND ($1::text[] IS NULL OR c.table_name::text = ANY($1::text[]))
ORDER BY c.table_name, c.ordinal_position
"#;

const INDICES_SQL: &str = r#"
SELECT
    t.relname::text AS table_name,
    i.relname::text AS index_name,
    ix.indisprimary AS is_primary,
    ix.indisunique AS is_unique,
    array_agg(a.attname::text ORDER BY k.ord) AS column_names
FROM pg_index ix
JOIN pg_class t ON t.oid = ix.indrelid
JOIN pg_class i ON i.oid = ix.indexrelid
JOIN pg_namespace n ON n.oid = t.relnamespace
CROSS JOIN LATERAL unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
WHERE n.nspname = 'public'
    AND t.relkind = 'r'
    AND ($1::text[] IS NULL OR t.relname::text = ANY($1::text[]))
GROUP BY t.relname, i.relname, ix.indisprimary, ix.indisunique
ORDER BY t.relname, i.relname
"#;

/// Read every table in the `public` schema.
pub async fn introspect(client: &Client) -> Result<Schema> {
    read_schema(client, None).await
}

/// Read only the named tables; names that don't exist are simply absent
/// from the result.
pub async fn introspect_tables(client: &Client, tables: &[&str]) -> Result<Schema> {
    let names = tables.iter().map(|t| t.to_string()).collect();
    read_schema(client, Some(names)).await
}

async fn read_schema(client: &Client, filter: Option<Vec<String>>) -> Result<Schema> {
    let conn = client.traced();
    let mut schema = Schema::new();

    let rows = conn
        .query(COLUMNS_SQL, &[&filter])
        .await
        .map_err(Error::Introspect)?;

    for row in rows {
        let table_name: String = row.try_get("table_name").map_err(Error::Introspect)?;
        let column_name: String = row.try_get("column_name").map_err(Error::Introspect)?;
        let data_type: String = row.try_get("data_type").map_err(Error::Introspect)?;
        let nullable: bool = row.try_get("nullable").map_err(Error::Introspect)?;
        let default: Option<String> = row.try_get("column_default").map_err(Error::Introspect)?;
        let identity: bool = row.try_get("identity").map_err(Error::Introspect)?;

        let pg_type = PgType::from_information_schema(&data_type);

        let table = schema
            .tables
            .entry(table_name.clone())
            .or_insert_with(|| Table {
                name: table_name,
                columns: Vec::new(),
                indices: Vec::new(),
            });

        table.columns.push(Column {
            name: column_name,
            pg_type,
            nullable,
            default: default.as_deref().map(normalize_default),
            primary_key: false,
            identity,
        });
    }

    let rows = conn
        .query(INDICES_SQL, &[&filter])
        .await
        .map_err(Error::Introspect)?;

    for row in rows {
        let table_name: String = row.try_get("table_name").map_err(Error::Introspect)?;
        let index_name: String = row.try_get("index_name").map_err(Error::Introspect)?;
        let is_primary: bool = row.try_get("is_primary").map_err(Error::Introspect)?;
        let unique: bool = row.try_get("is_unique").map_err(Error::Introspect)?;
        let columns: Vec<String> = row.try_get("column_names").map_err(Error::Introspect)?;

        let Some(table) = schema.tables.get_mut(&table_name) else {
            continue;
        };

        if is_primary {
            for col in table.columns.iter_mut() {
                if columns.contains(&col.name) {
                    col.primary_key = true;
                }
            }
        } else {
            table.indices.push(Index {
                name: index_name,
                columns,
                unique,
            });
        }
    }

    debug!(tables = schema.tables.len(), "introspected database schema");

    Ok(schema)
}

/// Normalize a default expression as reported by Postgres.
///
/// Postgres stores literal defaults with an explicit cast (`''::text`,
/// `'draft'::character varying`); the cast is dropped so the expression
/// compares equal to what was declared. Anything that isn't a bare quoted
/// literal followed by casts is returned as-is.
pub fn normalize_default(expr: &str) -> String {
    let expr = expr.trim();

    if let Some(end) = quoted_literal_end(expr) {
        let (literal, rest) = expr.split_at(end);
        if rest.starts_with("::") {
            return literal.to_string();
        }
    }

    expr.to_string()
}

/// If `expr` starts with a single-quoted literal, return the byte offset just
/// past its closing quote.
fn quoted_literal_end(expr: &str) -> Option<usize> {
    let bytes = expr.as_bytes();
    if bytes.first() != Some(&b'\'') {
        return None;
    }

    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            // '' is an escaped quote inside the literal
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i + 1);
        }
        i += 1;
    }

    None
}
