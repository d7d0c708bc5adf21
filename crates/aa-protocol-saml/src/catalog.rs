//! Attribute catalog.
//!
//! The catalog is the set of attributes the authority is able to release,
//! keyed by `(name, name format)`. It is loaded once at startup and shared
//! read-only between requests.

use std::collections::HashSet;

use crate::error::{SamlError, SamlResult};
use crate::types::AttributeNameFormat;

/// An attribute the authority can release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// The attribute name.
    pub name: String,
    /// The attribute name format.
    pub name_format: AttributeNameFormat,
    /// The attribute values, in release order.
    pub values: Vec<String>,
}

impl CatalogEntry {
    /// Creates a catalog entry.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, name_format: AttributeNameFormat, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            name_format,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Read-only lookup of releasable attributes.
pub trait AttributeCatalog: Send + Sync {
    /// Looks up the entry with exactly this name and name format.
    fn lookup(&self, name: &str, name_format: &AttributeNameFormat) -> Option<&CatalogEntry>;

    /// Returns every entry, in catalog order.
    fn entries(&self) -> &[CatalogEntry];
}

/// Catalog backed by a fixed, in-memory table.
#[derive(Debug, Clone, Default)]
pub struct StaticAttributeCatalog {
    entries: Vec<CatalogEntry>,
}

impl StaticAttributeCatalog {
    /// Creates a catalog from the given entries.
    ///
    /// Fails if two entries share the same `(name, name format)` key.
    pub fn new(entries: Vec<CatalogEntry>) -> SamlResult<Self> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert((entry.name.as_str(), &entry.name_format)) {
                return Err(SamlError::Internal(format!(
                    "duplicate catalog entry: {} ({})",
                    entry.name,
                    entry.name_format.uri()
                )));
            }
        }
        Ok(Self { entries })
    }

    /// The demonstration catalog: `name` with three values and `test` with one.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            entries: vec![
                CatalogEntry::new(
                    "name",
                    AttributeNameFormat::Unspecified,
                    ["value1", "value2", "value3"],
                ),
                CatalogEntry::new("test", AttributeNameFormat::Unspecified, ["test"]),
            ],
        }
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AttributeCatalog for StaticAttributeCatalog {
    fn lookup(&self, name: &str, name_format: &AttributeNameFormat) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.name == name && &e.name_format == name_format)
    }

    fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }
}
