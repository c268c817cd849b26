//! # Catalog Interface
//!
//! The catalog resolves table and column names to the stable numeric ids that go
//! on the wire. It is consumed, never written, by the planner: the caller hands in
//! a snapshot that stays consistent for one lowering + serialization pass.
//!
//! ## Trait Design
//!
//! `Catalog` is object safe and used as `&dyn Catalog`, so a production planner
//! can back it with its metadata service while tests and the HTTP surface use
//! `InMemoryCatalog`, a HashMap-based snapshot populated programmatically (or
//! deserialized from a request).
//!
//! ## Checked Lookups
//!
//! `get_table_checked` and `TableDescriptor::get_column_checked` turn a missing
//! name into `PlanError::UnknownTable` / `PlanError::UnknownColumn`. Serialization
//! never drops an unresolvable column silently.

use crate::error::{PlanError, PlanPath, Result};
use crate::expr::TableRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Stable id of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(pub u32);

/// Stable id of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub id: ColumnId,
    pub name: String,
}

impl ColumnDescriptor {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: ColumnId(id),
            name: name.into(),
        }
    }
}

/// Table metadata: id plus the columns in table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub id: TableId,
    pub table: TableRef,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    pub fn new(id: u32, table: TableRef, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            id: TableId(id),
            table,
            columns,
        }
    }

    pub fn get_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn get_column_checked(&self, name: &str) -> Result<&ColumnDescriptor> {
        self.get_column(name).ok_or_else(|| PlanError::UnknownColumn {
            table: self.table.to_string(),
            column: name.to_string(),
            path: PlanPath::root(),
        })
    }

    /// Ids of every column, in table order.
    pub fn column_ids(&self) -> Vec<ColumnId> {
        self.columns.iter().map(|c| c.id).collect()
    }
}

/// Read-only access to table metadata.
pub trait Catalog: Send + Sync {
    fn get_table(&self, table: &TableRef) -> Option<TableDescriptor>;

    fn get_table_checked(&self, table: &TableRef) -> Result<TableDescriptor> {
        self.get_table(table).ok_or_else(|| PlanError::UnknownTable {
            table: table.to_string(),
            path: PlanPath::root(),
        })
    }
}

/// In-memory catalog snapshot.
///
/// Tables are keyed by their fully-qualified name (`schema.table`).
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    pub tables: HashMap<String, TableDescriptor>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: TableDescriptor) {
        self.tables.insert(table.table.to_string(), table);
    }

    pub fn with_table(mut self, table: TableDescriptor) -> Self {
        self.add_table(table);
        self
    }
}

impl FromIterator<TableDescriptor> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = TableDescriptor>>(iter: I) -> Self {
        let mut catalog = InMemoryCatalog::new();
        for table in iter {
            catalog.add_table(table);
        }
        catalog
    }
}

impl Catalog for InMemoryCatalog {
    fn get_table(&self, table: &TableRef) -> Option<TableDescriptor> {
        self.tables.get(&table.to_string()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new().with_table(TableDescriptor::new(
            7,
            TableRef::new("public", "t"),
            vec![
                ColumnDescriptor::new(1, "a"),
                ColumnDescriptor::new(2, "b"),
                ColumnDescriptor::new(3, "c"),
            ],
        ))
    }

    #[test]
    fn test_checked_lookups() {
        let catalog = catalog();
        let t = catalog.get_table_checked(&TableRef::new("public", "t")).unwrap();
        assert_eq!(t.id, TableId(7));
        assert_eq!(t.column_ids(), vec![ColumnId(1), ColumnId(2), ColumnId(3)]);
        assert_eq!(t.get_column_checked("c").unwrap().id, ColumnId(3));

        let err = t.get_column_checked("z").unwrap_err();
        assert!(matches!(err, PlanError::UnknownColumn { ref column, .. } if column == "z"));

        let err = catalog
            .get_table_checked(&TableRef::new("public", "missing"))
            .unwrap_err();
        assert!(matches!(err, PlanError::UnknownTable { .. }));
    }
}
