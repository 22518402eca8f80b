//! Schema diffing - compare Rust-defined schema against database schema.
//!
//! This module compares two [`Schema`] instances and produces a list of changes
//! needed to transform one into the other. The diff is complete: it reports
//! drops and alterations too. Whether a change is safe to apply automatically
//! is a separate question, answered by [`Change::is_additive`].

use crate::schema::{add_column_sql, create_index_sql, create_table_sql, quote_ident};
use postsync_schema::{Column, Index, PgType, Schema, Table};
use std::collections::HashSet;

/// A diff between two schemas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDiff {
    /// Changes organized by table.
    pub table_diffs: Vec<TableDiff>,
}

impl SchemaDiff {
    /// Returns true if there are no differences.
    pub fn is_empty(&self) -> bool {
        self.table_diffs.is_empty()
    }

    /// Count total number of changes.
    pub fn change_count(&self) -> usize {
        self.table_diffs.iter().map(|t| t.changes.len()).sum()
    }

    /// Iterate over every change along with the table it applies to.
    pub fn changes(&self) -> impl Iterator<Item = (&str, &Change)> {
        self.table_diffs.iter().flat_map(|td| {
            td.changes
                .iter()
                .map(move |change| (td.table.as_str(), change))
        })
    }

    /// Generate SQL statements for all changes in this diff.
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        for table_diff in &self.table_diffs {
            sql.push_str(&format!("-- Table: {}\n", table_diff.table));
            for change in &table_diff.changes {
                sql.push_str(&change.to_sql(&table_diff.table));
                sql.push('\n');
            }
            sql.push('\n');
        }
        sql
    }
}

/// Changes for a single table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDiff {
    /// Table name.
    pub table: String,
    /// List of changes.
    pub changes: Vec<Change>,
}

/// A single schema change.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Add a new table (and its indices).
    AddTable(Table),
    /// Drop an existing table.
    DropTable(String),
    /// Add a new column.
    AddColumn(Column),
    /// Drop an existing column.
    DropColumn(String),
    /// Change a column's type.
    AlterColumnType {
        name: String,
        from: PgType,
        to: PgType,
    },
    /// Change a column's nullability.
    AlterColumnNullable { name: String, from: bool, to: bool },
    /// Change a column's default value.
    AlterColumnDefault {
        name: String,
        from: Option<String>,
        to: Option<String>,
    },
    /// Add an index.
    AddIndex(Index),
    /// Drop an index.
    DropIndex(String),
    /// An index exists under the desired name but covers something else.
    ReplaceIndex { from: Index, to: Index },
}

impl Change {
    /// Whether this change only creates objects and never drops or alters
    /// anything that already exists.
    pub fn is_additive(&self) -> bool {
        matches!(
            self,
            Change::AddTable(_) | Change::AddColumn(_) | Change::AddIndex(_)
        )
    }

    /// The individual SQL statements for this change, in execution order.
    ///
    /// Most changes are a single statement; adding a table also creates its indices.
    pub fn statements(&self, table_name: &str) -> Vec<String> {
        match self {
            Change::AddTable(t) => {
                let mut stmts = vec![create_table_sql(t)];
                stmts.extend(t.indices.iter().map(|idx| create_index_sql(&t.name, idx)));
                stmts
            }
            Change::DropTable(name) => vec![format!("DROP TABLE {};", quote_ident(name))],
            Change::AddColumn(col) => vec![add_column_sql(table_name, col)],
            Change::DropColumn(name) => vec![format!(
                "ALTER TABLE {} DROP COLUMN {};",
                quote_ident(table_name),
                quote_ident(name)
            )],
            Change::AlterColumnType { name, to, .. } => vec![format!(
                "ALTER TABLE {} ALTER COLUMN {} TYPE {} USING {}::{};",
                quote_ident(table_name),
                quote_ident(name),
                to,
                quote_ident(name),
                to
            )],
            Change::AlterColumnNullable { name, to, .. } => {
                let action = if *to { "DROP NOT NULL" } else { "SET NOT NULL" };
                vec![format!(
                    "ALTER TABLE {} ALTER COLUMN {} {};",
                    quote_ident(table_name),
                    quote_ident(name),
                    action
                )]
            }
            Change::AlterColumnDefault { name, to, .. } => {
                let action = match to {
                    Some(default) => format!("SET DEFAULT {}", default),
                    None => "DROP DEFAULT".to_string(),
                };
                vec![format!(
                    "ALTER TABLE {} ALTER COLUMN {} {};",
                    quote_ident(table_name),
                    quote_ident(name),
                    action
                )]
            }
            Change::AddIndex(idx) => vec![create_index_sql(table_name, idx)],
            Change::DropIndex(name) => vec![format!("DROP INDEX {};", quote_ident(name))],
            Change::ReplaceIndex { from, to } => vec![
                format!("DROP INDEX {};", quote_ident(&from.name)),
                create_index_sql(table_name, to),
            ],
        }
    }

    /// Generate SQL for this change.
    ///
    /// The `table_name` is required for column-level changes.
    pub fn to_sql(&self, table_name: &str) -> String {
        self.statements(table_name).join("\n")
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Change::AddTable(t) => write!(f, "+ table {}", t.name),
            Change::DropTable(name) => write!(f, "- table {}", name),
            Change::AddColumn(col) => {
                let nullable = if col.nullable { " (nullable)" } else { "" };
                write!(f, "+ {}: {}{}", col.name, col.pg_type, nullable)
            }
            Change::DropColumn(name) => write!(f, "- {}", name),
            Change::AlterColumnType { name, from, to } => {
                write!(f, "~ {}: {} -> {}", name, from, to)
            }
            Change::AlterColumnNullable { name, from, to } => {
                let from_str = if *from { "nullable" } else { "not null" };
                let to_str = if *to { "nullable" } else { "not null" };
                write!(f, "~ {}: {} -> {}", name, from_str, to_str)
            }
            Change::AlterColumnDefault { name, from, to } => {
                let from_str = from.as_deref().unwrap_or("(none)");
                let to_str = to.as_deref().unwrap_or("(none)");
                write!(f, "~ {} default: {} -> {}", name, from_str, to_str)
            }
            Change::AddIndex(idx) => {
                let unique = if idx.unique { "UNIQUE " } else { "" };
                write!(
                    f,
                    "+ {}INDEX {} ({})",
                    unique,
                    idx.name,
                    idx.columns.join(", ")
                )
            }
            Change::DropIndex(name) => write!(f, "- INDEX {}", name),
            Change::ReplaceIndex { from, to } => write!(
                f,
                "~ INDEX {}: ({}) -> ({})",
                to.name,
                from.columns.join(", "),
                to.columns.join(", ")
            ),
        }
    }
}

/// Extension trait for Schema to add diffing.
pub trait SchemaDiffExt {
    /// Compare this schema (desired/Rust) against another schema (current/database).
    ///
    /// Returns the changes needed to transform `db_schema` into `self`.
    fn diff(&self, db_schema: &Schema) -> SchemaDiff;
}

impl SchemaDiffExt for Schema {
    fn diff(&self, db_schema: &Schema) -> SchemaDiff {
        diff_schemas(self, db_schema)
    }
}

/// Compute the changes needed to transform `current` into `desired`.
///
/// Table diffs come out sorted by table name.
pub fn diff_schemas(desired: &Schema, current: &Schema) -> SchemaDiff {
    let mut table_diffs = Vec::new();

    for desired_table in desired.iter_tables() {
        match current.get_table(&desired_table.name) {
            None => table_diffs.push(TableDiff {
                table: desired_table.name.clone(),
                changes: vec![Change::AddTable(desired_table.clone())],
            }),
            Some(current_table) => {
                let changes = diff_table(desired_table, current_table);
                if !changes.is_empty() {
                    table_diffs.push(TableDiff {
                        table: desired_table.name.clone(),
                        changes,
                    });
                }
            }
        }
    }

    for current_table in current.iter_tables() {
        if desired.get_table(&current_table.name).is_none() {
            table_diffs.push(TableDiff {
                table: current_table.name.clone(),
                changes: vec![Change::DropTable(current_table.name.clone())],
            });
        }
    }

    // Sort by table name for consistent output
    table_diffs.sort_by(|a, b| a.table.cmp(&b.table));

    SchemaDiff { table_diffs }
}

/// Diff two tables with the same name.
///
/// Columns come first so that new indices can refer to new columns.
fn diff_table(desired: &Table, current: &Table) -> Vec<Change> {
    let mut changes = Vec::new();
    changes.extend(diff_columns(&desired.columns, &current.columns));
    changes.extend(diff_indices(&desired.indices, &current.indices));
    changes
}

/// Diff columns between desired and current state.
///
/// Primary key membership and identity generation are not compared.
fn diff_columns(desired: &[Column], current: &[Column]) -> Vec<Change> {
    let mut changes = Vec::new();

    let desired_names: HashSet<&str> = desired.iter().map(|c| c.name.as_str()).collect();
    let current_names: HashSet<&str> = current.iter().map(|c| c.name.as_str()).collect();

    // Columns to add
    for col in desired {
        if !current_names.contains(col.name.as_str()) {
            changes.push(Change::AddColumn(col.clone()));
        }
    }

    // Columns to drop
    for col in current {
        if !desired_names.contains(col.name.as_str()) {
            changes.push(Change::DropColumn(col.name.clone()));
        }
    }

    // Columns in both - check for changes
    for desired_col in desired {
        let Some(current_col) = current.iter().find(|c| c.name == desired_col.name) else {
            continue;
        };

        if desired_col.pg_type != current_col.pg_type {
            changes.push(Change::AlterColumnType {
                name: desired_col.name.clone(),
                from: current_col.pg_type.clone(),
                to: desired_col.pg_type.clone(),
            });
        }

        if desired_col.nullable != current_col.nullable {
            changes.push(Change::AlterColumnNullable {
                name: desired_col.name.clone(),
                from: current_col.nullable,
                to: desired_col.nullable,
            });
        }

        if desired_col.default != current_col.default {
            changes.push(Change::AlterColumnDefault {
                name: desired_col.name.clone(),
                from: current_col.default.clone(),
                to: desired_col.default.clone(),
            });
        }
    }

    changes
}

/// Diff indices.
///
/// Indices are matched by uniqueness and columns, not name. A desired index
/// whose name is already taken by a different index becomes a
/// [`Change::ReplaceIndex`] rather than an add that would collide.
fn diff_indices(desired: &[Index], current: &[Index]) -> Vec<Change> {
    let mut changes = Vec::new();

    let idx_key = |idx: &Index| -> String {
        format!(
            "{}:{}",
            if idx.unique { "U" } else { "" },
            idx.columns.join(",")
        )
    };

    let desired_keys: HashSet<String> = desired.iter().map(idx_key).collect();
    let current_keys: HashSet<String> = current.iter().map(idx_key).collect();
    let mut replaced: HashSet<&str> = HashSet::new();

    for idx in desired {
        if current_keys.contains(&idx_key(idx)) {
            continue;
        }
        match current.iter().find(|c| c.name == idx.name) {
            Some(taken) => {
                replaced.insert(taken.name.as_str());
                changes.push(Change::ReplaceIndex {
                    from: taken.clone(),
                    to: idx.clone(),
                });
            }
            _ => changes.push(Change::AddIndex(idx.clone())),
        }
    }

    for idx in current {
        if !desired_keys.contains(&idx_key(idx)) && !replaced.contains(idx.name.as_str()) {
            changes.push(Change::DropIndex(idx.name.clone()));
        }
    }

    changes
}

impl std::fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            writeln!(f, "No changes detected.")?;
        } else {
            writeln!(f, "Changes detected:\n")?;
            for table_diff in &self.table_diffs {
                writeln!(f, "  {}:", table_diff.table)?;
                for change in &table_diff.changes {
                    writeln!(f, "    {}", change)?;
                }
            }
        }
        Ok(())
    }
}
