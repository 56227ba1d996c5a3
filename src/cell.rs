//! Cell identity and the read-only metadata consumed from the notebook.

#[cfg(test)]
#[path = "cell_test.rs"]
mod cell_test;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{CELL_WRAPPER_ID_ATTR, SETUP_CELL_ID, UNNAMED_CELL_NAME};

/// Stable, unique identity of a notebook cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(String);

impl CellId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the reserved setup cell.
    #[must_use]
    pub fn is_setup(&self) -> bool {
        self.0 == SETUP_CELL_ID
    }

    /// CSS selector for this cell's wrapper element. The id is written as an escaped
    /// CSS string, so quotes, backslashes and control characters match literally.
    #[must_use]
    pub fn wrapper_selector(&self) -> String {
        let mut selector = format!("[{CELL_WRAPPER_ID_ATTR}=\"");
        for ch in self.0.chars() {
            match ch {
                '"' | '\\' => {
                    selector.push('\\');
                    selector.push(ch);
                }
                c if c.is_control() => selector.push_str(&format!("\\{:x} ", u32::from(c))),
                c => selector.push(c),
            }
        }
        selector.push_str("\"]");
        selector
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CellId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CellId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Per-cell metadata supplied by the cell-management collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellMeta {
    pub id: CellId,
    /// User-assigned name. Absent or [`UNNAMED_CELL_NAME`] means anonymous.
    #[serde(default)]
    pub name: Option<String>,
}

impl CellMeta {
    #[must_use]
    pub fn new(id: impl Into<CellId>, name: Option<&str>) -> Self {
        Self { id: id.into(), name: name.map(str::to_owned) }
    }

    /// Title shown on the cell's drag handle.
    ///
    /// Falls back to the identifier when the cell is unnamed or carries the
    /// reserved anonymous placeholder.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() && name != UNNAMED_CELL_NAME => name,
            _ => self.id.as_str(),
        }
    }
}

/// Normalize the notebook's cell order for layout.
///
/// Drops the setup cell and any repeated identifier (first occurrence wins).
#[must_use]
pub fn layout_order(ids: &[CellId]) -> Vec<CellId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .filter(|id| !id.is_setup())
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect()
}
