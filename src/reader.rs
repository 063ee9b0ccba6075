//! Historian export reader and tag mapper.
//!
//! Reads a data file (timestamp index plus one column per tag) and its
//! companion metadata file (headerless rows of
//! `tag,description,unit,reference-string`), renames tags, binds metadata
//! rows to model variables through a [`VariableSource`], and converts every
//! column with a known unit label to the target unit system.
//!
//! Columns without a metadata entry are kept unconverted, so auxiliary
//! columns such as an ambient-pressure reading stay addressable by tag.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::frame::{MetaTable, SeriesTable, TagMeta};
use crate::model::{resolve_reference, VariableSource};
use crate::units::{unit_convert, AmbientPressure, ConvertError, ConvertOptions, UnitSystem};

/// Where the ambient pressure for gauge columns comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum AmbientSource {
    /// A fixed value for every row.
    Value(f64),
    /// A data column, addressed by its (renamed) tag; one value per row.
    Tag(String),
}

/// Options for [`read_data`].
#[derive(Default)]
pub struct ReadOptions<'a> {
    /// Model whose variables the metadata reference strings are resolved
    /// against. Without a model, references stay unresolved.
    pub model: Option<&'a dyn VariableSource>,
    /// Tag rename mapper applied to data columns and metadata rows alike.
    /// Returning an empty string drops the tag.
    pub rename_mapper: Option<&'a dyn Fn(&str) -> String>,
    /// Target unit system. Without one, no conversion is performed and unit
    /// labels are left as read.
    pub unit_system: Option<UnitSystem>,
    /// Ambient pressure for gauge-pressure columns. Defaults to 1 atm.
    pub ambient_pressure: Option<AmbientSource>,
    /// Unit the ambient pressure is stated in. Defaults to `atm`.
    pub ambient_pressure_unit: Option<String>,
    /// Caller unit-label aliases, passed through to conversion.
    pub unit_aliases: HashMap<String, String>,
}

impl<'a> ReadOptions<'a> {
    pub fn model(mut self, model: &'a dyn VariableSource) -> Self {
        self.model = Some(model);
        self
    }

    pub fn rename_mapper(mut self, mapper: &'a dyn Fn(&str) -> String) -> Self {
        self.rename_mapper = Some(mapper);
        self
    }

    pub fn unit_system(mut self, system: UnitSystem) -> Self {
        self.unit_system = Some(system);
        self
    }

    pub fn ambient_value(mut self, value: f64) -> Self {
        self.ambient_pressure = Some(AmbientSource::Value(value));
        self
    }

    pub fn ambient_tag(mut self, tag: &str) -> Self {
        self.ambient_pressure = Some(AmbientSource::Tag(tag.to_string()));
        self
    }

    pub fn ambient_pressure_unit(mut self, unit: &str) -> Self {
        self.ambient_pressure_unit = Some(unit.to_string());
        self
    }

    pub fn alias(mut self, label: &str, unit: &str) -> Self {
        self.unit_aliases.insert(label.to_string(), unit.to_string());
        self
    }

    pub fn aliases(mut self, map: HashMap<String, String>) -> Self {
        self.unit_aliases.extend(map);
        self
    }
}

/// Failures while reading a data/metadata file pair.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("data file {path} has no timestamp column")]
    MissingIndex { path: String },
    #[error("ambient pressure tag '{tag}' is not a column of the data file")]
    UnknownAmbientTag { tag: String },
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Read a data/metadata file pair into a value table and a metadata table.
///
/// Tags are renamed first, then metadata rows are bound to model variables,
/// then every data column with a metadata entry is converted to the target
/// unit system (updating the column values and the metadata unit string).
/// Unresolvable unit labels follow the warn-and-passthrough policy of
/// [`unit_convert`].
pub fn read_data(
    data_path: impl AsRef<Path>,
    meta_path: impl AsRef<Path>,
    opts: &ReadOptions<'_>,
) -> Result<(SeriesTable, MetaTable), ReadError> {
    let mut meta = read_metadata(meta_path.as_ref())?;
    let mut table = read_series(data_path.as_ref())?;

    if let Some(mapper) = opts.rename_mapper {
        table.rename_tags(mapper);
        meta.rename_tags(mapper);
    }

    if let Some(model) = opts.model {
        for entry in meta.iter_mut() {
            entry.reference = resolve_reference(model, &entry.reference_string);
        }
    }

    if let Some(system) = opts.unit_system {
        // Ambient values are captured before any column is converted, so a
        // gauge correction always sees the ambient column in its stated unit.
        let ambient = match &opts.ambient_pressure {
            Some(AmbientSource::Tag(tag)) => {
                let values = table
                    .column(tag)
                    .ok_or_else(|| ReadError::UnknownAmbientTag { tag: tag.clone() })?;
                AmbientPressure::Series(values.to_vec())
            }
            Some(AmbientSource::Value(value)) => AmbientPressure::Scalar(*value),
            None => AmbientPressure::default(),
        };

        let tags: Vec<String> = meta.iter().map(|e| e.tag.clone()).collect();
        for tag in tags {
            let Some(entry_units) = meta.get(&tag).map(|e| e.units.clone()) else { continue };
            if entry_units.is_empty() {
                continue;
            }
            let Some(column) = table.column(&tag) else { continue };

            let mut copts = ConvertOptions::default()
                .system(system)
                .aliases(opts.unit_aliases.clone())
                .ambient_pressure(ambient.clone());
            if let Some(unit) = &opts.ambient_pressure_unit {
                copts = copts.ambient_pressure_unit(unit);
            }

            let converted = unit_convert(column, &entry_units, &copts)?;
            table.set_column(&tag, converted.values);
            if let Some(entry) = meta.get_mut(&tag) {
                entry.units = converted.unit;
            }
        }
    }

    Ok((table, meta))
}

/// Parse the data file: first header cell names the timestamp index, the
/// remaining cells are tags. Blank and non-numeric cells become NaN.
fn read_series(path: &Path) -> Result<SeriesTable, ReadError> {
    let display = path.display().to_string();
    let parse_err = |source| ReadError::Parse { path: display.clone(), source };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_path(path)
        .map_err(|e| ReadError::Parse { path: display.clone(), source: e })?;

    let headers = rdr.headers().map_err(parse_err)?.clone();
    if headers.is_empty() {
        return Err(ReadError::MissingIndex { path: display });
    }
    let tags: Vec<String> = headers.iter().skip(1).map(String::from).collect();

    let mut index: Vec<String> = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); tags.len()];
    for result in rdr.records() {
        let record = result.map_err(|source| ReadError::Parse {
            path: display.clone(),
            source,
        })?;
        index.push(record.get(0).unwrap_or("").to_string());
        for (i, column) in columns.iter_mut().enumerate() {
            let cell = record.get(i + 1).unwrap_or("");
            column.push(cell.parse::<f64>().unwrap_or(f64::NAN));
        }
    }

    let mut table = SeriesTable::new(index);
    for (tag, values) in tags.into_iter().zip(columns) {
        table.push_column(tag, values);
    }
    Ok(table)
}

/// Parse the metadata file: headerless rows of
/// `tag,description,unit,reference-string`, trailing fields optional.
fn read_metadata(path: &Path) -> Result<MetaTable, ReadError> {
    let display = path.display().to_string();

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_path(path)
        .map_err(|e| ReadError::Parse { path: display.clone(), source: e })?;

    let mut meta = MetaTable::default();
    for result in rdr.records() {
        let record = result.map_err(|source| ReadError::Parse {
            path: display.clone(),
            source,
        })?;
        let Some(tag) = record.get(0).filter(|t| !t.is_empty()) else {
            continue;
        };
        let mut entry = TagMeta::new(tag);
        entry.description = record.get(1).unwrap_or("").to_string();
        entry.units = record.get(2).unwrap_or("").to_string();
        entry.reference_string = record.get(3).unwrap_or("").to_string();
        meta.push(entry);
    }
    Ok(meta)
}
