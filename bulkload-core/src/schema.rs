//! Table schema definitions for the bulk loader
//!
//! A schema describes the target table of a bulk load: keyspace, table name,
//! column list (with static-column markers) and primary key structure. It is
//! configuration, not runtime state; the insert statement is bound against it
//! once, before any row is processed.

use crate::convert::ColumnSpec;
use crate::error::{Error, Result};
use crate::types::DataType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;

/// Table schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Keyspace name
    pub keyspace: String,

    /// Table name
    pub table: String,

    /// Partition key columns (ordered)
    pub partition_keys: Vec<KeyColumn>,

    /// Clustering key columns (ordered)
    pub clustering_keys: Vec<KeyColumn>,

    /// All columns in the table, in insert order
    pub columns: Vec<Column>,
}

/// Primary key component definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyColumn {
    /// Column name
    pub name: String,

    /// Data type
    #[serde(rename = "type")]
    pub data_type: DataType,

    /// Position in the composite key (0-based)
    pub position: usize,
}

/// Column definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Data type
    #[serde(rename = "type")]
    pub data_type: DataType,

    /// Whether column can be null
    #[serde(default = "default_nullable")]
    pub nullable: bool,

    /// Whether the column is static (shared per partition)
    #[serde(default)]
    pub static_column: bool,
}

fn default_nullable() -> bool {
    true
}

impl TableSchema {
    /// `keyspace.table`, used for directory naming and display
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.keyspace, self.table)
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check structural invariants of the schema.
    ///
    /// Key columns must exist in the column list, must not be nullable or
    /// static, and key positions must be contiguous from 0.
    pub fn validate(&self) -> Result<()> {
        if self.keyspace.is_empty() || self.table.is_empty() {
            return Err(Error::schema("keyspace and table name must be non-empty"));
        }
        if self.columns.is_empty() {
            return Err(Error::schema("schema has no columns"));
        }
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::schema(format!(
                    "duplicate column `{}`",
                    column.name
                )));
            }
        }
        if self.partition_keys.is_empty() {
            return Err(Error::schema("schema has no partition key"));
        }
        for (kind, keys) in [
            ("partition", &self.partition_keys),
            ("clustering", &self.clustering_keys),
        ] {
            for (i, key) in keys.iter().enumerate() {
                if key.position != i {
                    return Err(Error::schema(format!(
                        "{} key positions must be contiguous from 0, got {} at {}",
                        kind, key.position, i
                    )));
                }
                let column = self.column(&key.name).ok_or_else(|| {
                    Error::schema(format!(
                        "{} key `{}` is not in the column list",
                        kind, key.name
                    ))
                })?;
                if column.data_type != key.data_type {
                    return Err(Error::schema(format!(
                        "{} key `{}` type mismatch: {} vs {}",
                        kind, key.name, key.data_type, column.data_type
                    )));
                }
                if column.nullable {
                    return Err(Error::schema(format!(
                        "{} key `{}` must not be nullable",
                        kind, key.name
                    )));
                }
                if column.static_column {
                    return Err(Error::schema(format!(
                        "{} key `{}` must not be static",
                        kind, key.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Render the schema as a CREATE TABLE statement, for display
    pub fn create_table_cql(&self) -> String {
        let mut cql = format!("CREATE TABLE {} (", self.qualified_name());
        for column in &self.columns {
            let _ = write!(cql, "{} {}", column.name, column.data_type);
            if column.static_column {
                cql.push_str(" STATIC");
            }
            cql.push_str(", ");
        }
        cql.push_str("PRIMARY KEY ((");
        for (i, key) in self.partition_keys.iter().enumerate() {
            if i > 0 {
                cql.push_str(", ");
            }
            cql.push_str(&key.name);
        }
        cql.push(')');
        for key in &self.clustering_keys {
            let _ = write!(cql, ", {}", key.name);
        }
        cql.push_str("))");
        cql
    }
}

/// The ordered parameter list of the insert template.
///
/// Binding it against a schema yields the positional `ColumnSpec` list that
/// drives conversion; any count or name mismatch is rejected here, before the
/// first row is read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertStatement {
    /// Parameter columns, in placeholder order
    pub columns: Vec<String>,
}

impl InsertStatement {
    /// Create an insert statement from an ordered column list
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Bind the parameter list against a schema, producing column specs.
    ///
    /// Mapping is positional: parameter i reads source field i. The bind
    /// fails if the parameter count differs from the schema's column count,
    /// or if any parameter names an unknown or repeated column.
    pub fn bind(&self, schema: &TableSchema) -> Result<Vec<ColumnSpec>> {
        if self.columns.len() != schema.columns.len() {
            return Err(Error::schema(format!(
                "insert statement has {} parameters but table {} has {} columns",
                self.columns.len(),
                schema.qualified_name(),
                schema.columns.len()
            )));
        }
        let mut seen = HashSet::new();
        let mut specs = Vec::with_capacity(self.columns.len());
        for (index, name) in self.columns.iter().enumerate() {
            if !seen.insert(name.as_str()) {
                return Err(Error::schema(format!(
                    "insert statement repeats column `{}`",
                    name
                )));
            }
            let column = schema.column(name).ok_or_else(|| {
                Error::schema(format!(
                    "insert statement names unknown column `{}`",
                    name
                ))
            })?;
            specs.push(ColumnSpec {
                name: column.name.clone(),
                data_type: column.data_type,
                nullable: column.nullable,
                index,
            });
        }
        Ok(specs)
    }

    /// Render the statement as CQL, for display
    pub fn cql(&self, schema: &TableSchema) -> String {
        let placeholders = vec!["?"; self.columns.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            schema.qualified_name(),
            self.columns.join(", "),
            placeholders
        )
    }
}
