//! plantlog - plant historian data loading and unit conversion for process models
//!
//! This library reads time-series measurement exports (a delimited data file
//! plus a tag metadata file), maps renamed tags onto the variables of an
//! external equation-oriented process model, and converts measured physical
//! quantities between unit systems, including gauge-to-absolute pressure
//! correction with a scalar or per-row ambient pressure.
//!
//! ## Module Structure
//!
//! - [`units`] - Unit registry, unit systems, and the conversion routine
//! - [`frame`] - Time-indexed value tables and tag metadata tables
//! - [`model`] - Boundary trait and variable handles for the external
//!   modeling framework
//! - [`reader`] - Data/metadata file reading and tag mapping

pub mod frame;
pub mod model;
pub mod reader;
pub mod units;

pub use frame::{MetaTable, SeriesTable, TagMeta, TagSeries};
pub use model::{ModelVariable, VarRef, VariableSource};
pub use reader::{read_data, AmbientSource, ReadError, ReadOptions};
pub use units::{
    convert_scalar, convert_system, convert_to, unit_convert, AmbientPressure, ConvertError,
    ConvertOptions, Converted, ConvertWarning, UnitSystem,
};
