//! Index table definitions.
//!
//! An [`IndexTable`] names a primary key column and any number of secondary
//! indexes. The index engine turns the definition into ordered entries; this
//! module only describes and validates it.

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// One ordered index over a list of columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Column names, most significant first.
    pub columns: Vec<String>,
    /// Whether the column tuple must be unique.
    pub unique: bool,
}

impl IndexSpec {
    /// Stable name of the index, derived from its columns.
    pub fn name(&self) -> String {
        self.columns.join(",")
    }

    /// Does this index start with exactly `fields`, in order?
    pub fn has_prefix(&self, fields: &[String]) -> bool {
        fields.len() <= self.columns.len() && self.columns[..fields.len()] == *fields
    }
}

/// Definition of an index table: a primary key plus secondary indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexTable {
    name: String,
    primary_key: String,
    indexes: Vec<IndexSpec>,
}

impl IndexTable {
    /// Create an empty table definition.
    pub fn new(name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: primary_key.into(),
            indexes: Vec::new(),
        }
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Primary key column name.
    pub fn primary_key_id(&self) -> &str {
        &self.primary_key
    }

    /// Secondary indexes, in declaration order.
    pub fn indexes(&self) -> &[IndexSpec] {
        &self.indexes
    }

    /// The implicit unique index on the primary key.
    pub fn primary_index(&self) -> IndexSpec {
        IndexSpec {
            columns: vec![self.primary_key.clone()],
            unique: true,
        }
    }

    /// Every index the engine maintains: the primary index first, then secondaries.
    pub fn all_indexes(&self) -> Vec<IndexSpec> {
        let mut all = Vec::with_capacity(self.indexes.len() + 1);
        all.push(self.primary_index());
        all.extend(self.indexes.iter().cloned());
        all
    }

    /// Declare a secondary index.
    ///
    /// Re-declaring an identical index is a no-op and returns `Ok(false)`.
    /// Returns `Ok(true)` when the index is new.
    pub fn add_index<S: AsRef<str>>(
        &mut self,
        columns: &[S],
        unique: bool,
    ) -> Result<bool, IndexError> {
        let columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();

        if columns.is_empty() {
            return Err(IndexError::InvalidColumns("no columns given".to_string()));
        }
        if let Some(empty) = columns.iter().position(|c| c.is_empty()) {
            return Err(IndexError::InvalidColumns(format!(
                "column {} has an empty name",
                empty
            )));
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].contains(column) {
                return Err(IndexError::InvalidColumns(format!(
                    "column {} listed twice",
                    column
                )));
            }
        }

        let spec = IndexSpec { columns, unique };
        if let Some(existing) = self.indexes.iter().find(|i| i.columns == spec.columns) {
            if existing.unique != spec.unique {
                return Err(IndexError::Conflict {
                    table: self.name.clone(),
                    index: spec.name(),
                    reason: format!("declared with unique={}", existing.unique),
                });
            }
            return Ok(false);
        }

        self.indexes.push(spec);
        Ok(true)
    }

    /// Look up a maintained index by name, the primary index included.
    pub fn index(&self, name: &str) -> Option<IndexSpec> {
        self.all_indexes().into_iter().find(|i| i.name() == name)
    }

    /// Pick the index serving a scan filtered on `fields`.
    ///
    /// The first secondary index whose leading columns are `fields` wins. With
    /// no secondary match the primary index is used if it fits.
    pub fn select_index(&self, fields: &[String]) -> Option<IndexSpec> {
        if let Some(spec) = self.indexes.iter().find(|i| i.has_prefix(fields)) {
            return Some(spec.clone());
        }
        let primary = self.primary_index();
        primary.has_prefix(fields).then_some(primary)
    }

    /// Check that `other` may be persisted over this definition.
    pub fn check_compatible(&self, other: &IndexTable) -> Result<(), IndexError> {
        if self.primary_key != other.primary_key {
            return Err(IndexError::PrimaryKeyMismatch {
                table: self.name.clone(),
                existing: self.primary_key.clone(),
                requested: other.primary_key.clone(),
            });
        }
        Ok(())
    }
}
