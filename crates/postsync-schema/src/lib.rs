//! Database schema types for postsync.
//!
//! This crate contains the plain schema types shared between entity
//! definitions (the desired shape) and database introspection (the current
//! shape). Both sides produce a [`Schema`], which `postsync` then diffs.

use indexmap::IndexMap;
use std::fmt;

/// Postgres column types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PgType {
    /// SMALLINT (2 bytes)
    SmallInt,
    /// INTEGER (4 bytes)
    Integer,
    /// BIGINT (8 bytes)
    BigInt,
    /// REAL (4 bytes floating point)
    Real,
    /// DOUBLE PRECISION (8 bytes floating point)
    DoublePrecision,
    /// NUMERIC (arbitrary precision)
    Numeric,
    /// BOOLEAN
    Boolean,
    /// TEXT
    Text,
    /// BYTEA (binary)
    Bytea,
    /// TIMESTAMPTZ
    Timestamptz,
    /// TIMESTAMP (without time zone)
    Timestamp,
    /// DATE
    Date,
    /// TIME
    Time,
    /// UUID
    Uuid,
    /// JSONB
    Jsonb,
    /// Any other type, as reported by `information_schema.columns.data_type`
    /// (`ARRAY`, `USER-DEFINED`, `inet`, ...). Only ever read from a database.
    Other(String),
}

impl PgType {
    /// Map a `data_type` value from `information_schema.columns`.
    ///
    /// Types this crate does not model come back as [`PgType::Other`].
    pub fn from_information_schema(data_type: &str) -> Self {
        match data_type {
            "smallint" => PgType::SmallInt,
            "integer" => PgType::Integer,
            "bigint" => PgType::BigInt,
            "real" => PgType::Real,
            "double precision" => PgType::DoublePrecision,
            "numeric" => PgType::Numeric,
            "boolean" => PgType::Boolean,
            "text" | "character varying" => PgType::Text,
            "bytea" => PgType::Bytea,
            "timestamp with time zone" => PgType::Timestamptz,
            "timestamp without time zone" => PgType::Timestamp,
            "date" => PgType::Date,
            "time without time zone" => PgType::Time,
            "uuid" => PgType::Uuid,
            "jsonb" => PgType::Jsonb,
            other => PgType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PgType::SmallInt => write!(f, "SMALLINT"),
            PgType::Integer => write!(f, "INTEGER"),
            PgType::BigInt => write!(f, "BIGINT"),
            PgType::Real => write!(f, "REAL"),
            PgType::DoublePrecision => write!(f, "DOUBLE PRECISION"),
            PgType::Numeric => write!(f, "NUMERIC"),
            PgType::Boolean => write!(f, "BOOLEAN"),
            PgType::Text => write!(f, "TEXT"),
            PgType::Bytea => write!(f, "BYTEA"),
            PgType::Timestamptz => write!(f, "TIMESTAMPTZ"),
            PgType::Timestamp => write!(f, "TIMESTAMP"),
            PgType::Date => write!(f, "DATE"),
            PgType::Time => write!(f, "TIME"),
            PgType::Uuid => write!(f, "UUID"),
            PgType::Jsonb => write!(f, "JSONB"),
            PgType::Other(data_type) => write!(f, "{}", data_type),
        }
    }
}

/// A database column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Postgres type
    pub pg_type: PgType,
    /// Whether the column allows NULL
    pub nullable: bool,
    /// Default value expression (if any)
    pub default: Option<String>,
    /// Whether this is (part of) the primary key
    pub primary_key: bool,
    /// Whether values are assigned by the database (`GENERATED BY DEFAULT AS IDENTITY`)
    pub identity: bool,
}

impl Column {
    /// A NOT NULL column with no default.
    pub fn new(name: impl Into<String>, pg_type: PgType) -> Self {
        Self {
            name: name.into(),
            pg_type,
            nullable: false,
            default: None,
            primary_key: false,
            identity: false,
        }
    }

    /// An identity primary key column.
    pub fn identity_pk(name: impl Into<String>, pg_type: PgType) -> Self {
        Self {
            primary_key: true,
            identity: true,
            ..Self::new(name, pg_type)
        }
    }

    /// Mark this column as nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Set the default value expression.
    pub fn default(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }
}

/// A database index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// Index name
    pub name: String,
    /// Column(s) in the index, in order
    pub columns: Vec<String>,
    /// Whether this is a unique index
    pub unique: bool,
}

impl Index {
    /// A non-unique index with the conventional name for `table` and `columns`.
    pub fn on(table: &str, columns: &[&str]) -> Self {
        Self {
            name: index_name(table, columns),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique: false,
        }
    }
}

/// A database table definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Table name
    pub name: String,
    /// Columns, in declaration order
    pub columns: Vec<Column>,
    /// Secondary indices (the primary key index is implied by the columns)
    pub indices: Vec<Index>,
}

impl Table {
    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Names of the primary key columns, in declaration order.
    pub fn primary_key(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// A complete database schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Tables in the schema, indexed by name
    pub tables: IndexMap<String, Table>,
}

impl Schema {
    /// Create a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema from a list of tables.
    pub fn from_tables(tables: impl IntoIterator<Item = Table>) -> Self {
        Self {
            tables: tables.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }

    /// Get a table by name.
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Iterate over all tables.
    pub fn iter_tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Collect the schema from every registered [`TableDef`].
    ///
    /// Tables come out sorted by name so the result does not depend on link order.
    pub fn collect() -> Self {
        let mut tables: Vec<Table> = inventory::iter::<TableDef>
            .into_iter()
            .map(TableDef::to_table)
            .collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        Self::from_tables(tables)
    }
}

// =============================================================================
// Entity registration
// =============================================================================

/// A Rust type that maps onto a database table.
pub trait Entity {
    /// The table name.
    const TABLE: &'static str;

    /// The desired table definition.
    fn table() -> Table;
}

/// A registered table definition.
///
/// Submit one per entity so [`Schema::collect`] can find it:
///
/// ```ignore
/// postsync::inventory::submit!(postsync::TableDef::new::<Post>());
/// ```
pub struct TableDef {
    name: &'static str,
    build: fn() -> Table,
}

impl TableDef {
    /// Create a new table definition for an entity type.
    pub const fn new<T: Entity>() -> Self {
        Self {
            name: T::TABLE,
            build: T::table,
        }
    }

    /// The table name.
    pub fn table_name(&self) -> &'static str {
        self.name
    }

    /// Build the table definition.
    pub fn to_table(&self) -> Table {
        (self.build)()
    }
}

inventory::collect!(TableDef);

// =============================================================================
// Naming
// =============================================================================

/// A PostgreSQL identifier wrapper.
///
/// Display writes the value escaped and quoted with double quotes.
///
/// # Example
/// ```
/// use postsync_schema::Ident;
/// assert_eq!(format!("{}", Ident("user")), "\"user\"");
/// assert_eq!(format!("{}", Ident("bla\"h")), "\"bla\"\"h\"");
/// ```
pub struct Ident<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"")?;
        for c in self.0.as_ref().chars() {
            if c == '"' {
                write!(f, "\"\"")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "\"")
    }
}

/// Quote a PostgreSQL identifier.
///
/// Always quotes identifiers to avoid issues with reserved keywords like
/// `user`, `order`, `table`, `group`, etc. Doubles any embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("{}", Ident(name))
}

/// Generate a standard index name for a table and columns.
///
/// Uses the convention `idx_{table}_{columns}` where columns are joined by underscore.
///
/// # Examples
///
/// ```
/// assert_eq!(postsync_schema::index_name("posts", &["deleted_at"]), "idx_posts_deleted_at");
/// assert_eq!(postsync_schema::index_name("post", &["author_id", "created_at"]), "idx_post_author_id_created_at");
/// ```
pub fn index_name(table: &str, columns: &[impl AsRef<str>]) -> String {
    let cols: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
    format!("idx_{}_{}", table, cols.join("_"))
}

#[cfg(test)]
mod tests;
