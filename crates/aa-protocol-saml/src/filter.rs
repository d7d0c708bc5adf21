//! Attribute filtering.
//!
//! Computes which catalog attributes are released for a query: exact
//! `(name, name format)` matches, with value lists narrowed to the values the
//! requester asked for.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{AttributeCatalog, CatalogEntry};
use crate::types::{Attribute, AttributeNameFormat, RequestedAttribute};

/// What to release when a query names no attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleasePolicy {
    /// Release the full catalog.
    #[default]
    ReleaseAll,
    /// Release nothing.
    ReleaseNone,
}

/// One released attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterResult {
    /// The attribute name.
    pub name: String,
    /// The attribute name format.
    pub name_format: AttributeNameFormat,
    /// Released values.
    pub values: Vec<String>,
}

impl From<&CatalogEntry> for FilterResult {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            name: entry.name.clone(),
            name_format: entry.name_format.clone(),
            values: entry.values.clone(),
        }
    }
}

impl From<FilterResult> for Attribute {
    fn from(result: FilterResult) -> Self {
        Self::new(result.name, result.name_format, result.values)
    }
}

/// Filters the requested attributes against the catalog.
///
/// An empty request releases according to `policy`. Requested attributes
/// without an exact catalog match are omitted. When specific values are
/// requested, the released values are those also present in the catalog,
/// in the requester's order.
pub fn filter(
    requested: &[RequestedAttribute],
    catalog: &dyn AttributeCatalog,
    policy: ReleasePolicy,
) -> Vec<FilterResult> {
    if requested.is_empty() {
        return match policy {
            ReleasePolicy::ReleaseAll => {
                debug!(
                    count = catalog.entries().len(),
                    "No attributes requested - releasing full catalog"
                );
                catalog.entries().iter().map(FilterResult::from).collect()
            }
            ReleasePolicy::ReleaseNone => {
                debug!("No attributes requested - release policy releases nothing");
                Vec::new()
            }
        };
    }

    let mut results = Vec::with_capacity(requested.len());
    for req in requested {
        let Some(entry) = catalog.lookup(&req.name, &req.name_format) else {
            debug!(
                name = %req.name,
                name_format = %req.name_format.uri(),
                "Requested attribute not in catalog"
            );
            continue;
        };

        if req.values.is_empty() {
            results.push(FilterResult::from(entry));
            continue;
        }

        let values = req
            .values
            .iter()
            .filter(|v| entry.values.contains(v))
            .cloned()
            .collect();
        results.push(FilterResult {
            name: entry.name.clone(),
            name_format: entry.name_format.clone(),
            values,
        });
    }

    results
}
