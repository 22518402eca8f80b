//! Schema definition and SQL generation.
//!
//! Entities describe their table by implementing [`Entity`]:
//!
//! ```ignore
//! use postsync::schema::{Column, Entity, Index, PgType, Table};
//!
//! impl Entity for Post {
//!     const TABLE: &'static str = "posts";
//!
//!     fn table() -> Table {
//!         Table {
//!             name: Self::TABLE.to_string(),
//!             columns: vec![
//!                 Column::identity_pk("id", PgType::BigInt),
//!                 Column::new("title", PgType::Text).default("''"),
//!             ],
//!             indices: vec![],
//!         }
//!     }
//! }
//!
//! postsync::inventory::submit!(postsync::TableDef::new::<Post>());
//! ```

pub use postsync_schema::{
    Column, Entity, Index, PgType, Schema, Table, TableDef, index_name, quote_ident,
};

/// Extension trait for Schema to add SQL generation.
pub trait SchemaCodegen {
    /// Generate SQL to create all tables and indices.
    fn to_sql(&self) -> String;
}

impl SchemaCodegen for Schema {
    fn to_sql(&self) -> String {
        schema_to_sql(self)
    }
}

/// Generate SQL to create all tables, then all indices.
pub fn schema_to_sql(schema: &Schema) -> String {
    let mut sql = String::new();

    for table in schema.tables.values() {
        sql.push_str(&create_table_sql(table));
        sql.push_str("\n\n");
    }

    for table in schema.tables.values() {
        for idx in &table.indices {
            sql.push_str(&create_index_sql(&table.name, idx));
            sql.push('\n');
        }
    }

    sql.trim_end().to_string()
}

/// Render a single column definition, as used in `CREATE TABLE` and `ADD COLUMN`.
///
/// `inline_pk` adds `PRIMARY KEY` to primary key columns; it must be false
/// when the table has a composite key.
pub fn column_sql(col: &Column, inline_pk: bool) -> String {
    let mut def = format!("{} {}", quote_ident(&col.name), col.pg_type);

    if col.identity {
        def.push_str(" GENERATED BY DEFAULT AS IDENTITY");
    }

    let inline_pk = inline_pk && col.primary_key;
    if inline_pk {
        def.push_str(" PRIMARY KEY");
    }

    // PRIMARY KEY already implies NOT NULL
    if !col.nullable && !inline_pk {
        def.push_str(" NOT NULL");
    }

    if let Some(default) = &col.default {
        def.push_str(&format!(" DEFAULT {}", default));
    }

    def
}

/// Generate CREATE TABLE SQL statement.
///
/// Does not include secondary indices; see [`create_index_sql`].
pub fn create_table_sql(table: &Table) -> String {
    let mut sql = format!("CREATE TABLE {} (\n", quote_ident(&table.name));

    let pk_columns = table.primary_key();

    // If there's more than one PK column, we need a table constraint
    let use_table_pk_constraint = pk_columns.len() > 1;

    let mut parts: Vec<String> = table
        .columns
        .iter()
        .map(|col| format!("    {}", column_sql(col, !use_table_pk_constraint)))
        .collect();

    if use_table_pk_constraint {
        let quoted_pk_cols: Vec<_> = pk_columns.iter().map(|c| quote_ident(c)).collect();
        parts.push(format!("    PRIMARY KEY ({})", quoted_pk_cols.join(", ")));
    }

    sql.push_str(&parts.join(",\n"));
    sql.push_str("\n);");

    sql
}

/// Generate CREATE INDEX SQL statement for a given index.
pub fn create_index_sql(table_name: &str, idx: &Index) -> String {
    let unique = if idx.unique { "UNIQUE " } else { "" };
    let quoted_cols: Vec<_> = idx.columns.iter().map(|c| quote_ident(c)).collect();
    format!(
        "CREATE {}INDEX {} ON {} ({});",
        unique,
        quote_ident(&idx.name),
        quote_ident(table_name),
        quoted_cols.join(", ")
    )
}

/// Generate ALTER TABLE ... ADD COLUMN SQL statement.
pub fn add_column_sql(table_name: &str, col: &Column) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {};",
        quote_ident(table_name),
        column_sql(col, true)
    )
}
