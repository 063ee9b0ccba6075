//! In-memory tables for time-indexed historian data and tag metadata.
//!
//! A [`SeriesTable`] holds the measured values: one timestamp index (labels
//! kept verbatim from the file) and one `f64` column per tag, with missing
//! cells stored as NaN. A [`MetaTable`] holds the per-tag metadata rows:
//! description, unit label, and the reference to the matching model variable.
//! Both are built per read call and owned by the caller; nothing is cached.

use serde::Serialize;

use crate::model::VarRef;

/// One named column of measured values.
#[derive(Clone, Debug, Serialize)]
pub struct TagSeries {
    pub tag: String,
    pub values: Vec<f64>,
}

/// Time-indexed value table keyed by tag.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SeriesTable {
    /// Timestamp labels, one per row, as they appeared in the file.
    pub index: Vec<String>,
    columns: Vec<TagSeries>,
}

impl SeriesTable {
    pub fn new(index: Vec<String>) -> Self {
        Self { index, columns: Vec::new() }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Append a column. The values must have one entry per index row.
    pub fn push_column(&mut self, tag: impl Into<String>, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.index.len());
        self.columns.push(TagSeries { tag: tag.into(), values });
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        self.columns.iter().any(|c| c.tag == tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.tag.as_str())
    }

    pub fn column(&self, tag: &str) -> Option<&[f64]> {
        self.columns.iter().find(|c| c.tag == tag).map(|c| c.values.as_slice())
    }

    /// Replace the values of an existing column. Returns false if the tag is
    /// not present.
    pub fn set_column(&mut self, tag: &str, values: Vec<f64>) -> bool {
        match self.columns.iter_mut().find(|c| c.tag == tag) {
            Some(column) => {
                column.values = values;
                true
            }
            None => false,
        }
    }

    /// Value of a tag at a timestamp label, by exact label match.
    pub fn value(&self, tag: &str, timestamp: &str) -> Option<f64> {
        let row = self.index.iter().position(|t| t == timestamp)?;
        self.column(tag).and_then(|values| values.get(row).copied())
    }

    /// Apply a rename mapper to every tag. A mapper returning an empty
    /// string drops the column.
    pub fn rename_tags(&mut self, mapper: &dyn Fn(&str) -> String) {
        for column in &mut self.columns {
            column.tag = mapper(&column.tag);
        }
        self.columns.retain(|c| !c.tag.is_empty());
    }
}

/// Metadata for one tag.
#[derive(Clone, Debug, Serialize)]
pub struct TagMeta {
    pub tag: String,
    pub description: String,
    /// Unit label; replaced with the canonical unit string after conversion.
    pub units: String,
    /// Raw reference string from the metadata file, e.g. `pressure[:]`.
    pub reference_string: String,
    /// Resolved model variable, when a model was supplied and the reference
    /// string named a variable it knows.
    #[serde(skip)]
    pub reference: Option<VarRef>,
}

impl TagMeta {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            description: String::new(),
            units: String::new(),
            reference_string: String::new(),
            reference: None,
        }
    }
}

/// Ordered collection of [`TagMeta`] rows keyed by tag.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MetaTable {
    entries: Vec<TagMeta>,
}

impl MetaTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: TagMeta) {
        self.entries.push(entry);
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        self.entries.iter().any(|e| e.tag == tag)
    }

    pub fn get(&self, tag: &str) -> Option<&TagMeta> {
        self.entries.iter().find(|e| e.tag == tag)
    }

    pub fn get_mut(&mut self, tag: &str) -> Option<&mut TagMeta> {
        self.entries.iter_mut().find(|e| e.tag == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagMeta> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TagMeta> {
        self.entries.iter_mut()
    }

    /// Apply a rename mapper to every tag. A mapper returning an empty
    /// string drops the entry.
    pub fn rename_tags(&mut self, mapper: &dyn Fn(&str) -> String) {
        for entry in &mut self.entries {
            entry.tag = mapper(&entry.tag);
        }
        self.entries.retain(|e| !e.tag.is_empty());
    }
}
