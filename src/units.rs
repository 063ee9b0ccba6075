//! Unit registry and conversion for historian measurement data.
//!
//! Historian exports label each tag with a free-form unit string ("PSIG",
//! "DEG F", "ft^3"). This module resolves those labels against a built-in
//! registry of canonical units, converts values to an explicit target unit or
//! to the base units of a named unit system, and handles gauge-pressure
//! labels by adding an ambient pressure so that absolute values are reported.
//!
//! An unresolvable source label is not an error: the values pass through
//! unchanged with their original label and a single [`ConvertWarning`] is
//! reported (and logged). An unresolvable *target* unit is a hard error.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use thiserror::Error;

// ============================================================================
// Dimensions and registry
// ============================================================================

/// Exponents over the SI base dimensions, in the order
/// length, mass, time, temperature, current, luminous intensity, amount.
type Dims = [i8; 7];

#[allow(dead_code)]
const DIMLESS: Dims = [0, 0, 0, 0, 0, 0, 0];
const LENGTH: Dims = [1, 0, 0, 0, 0, 0, 0];
const MASS: Dims = [0, 1, 0, 0, 0, 0, 0];
const TIME: Dims = [0, 0, 1, 0, 0, 0, 0];
const TEMPERATURE: Dims = [0, 0, 0, 1, 0, 0, 0];
const PRESSURE: Dims = [-1, 1, -2, 0, 0, 0, 0];
const VOLUME: Dims = [3, 0, 0, 0, 0, 0, 0];
const MASS_FLOW: Dims = [0, 1, -1, 0, 0, 0, 0];
const VOLUME_FLOW: Dims = [3, 0, -1, 0, 0, 0, 0];

const ATM_PA: f64 = 101_325.0;
const PSI_PA: f64 = 6_894.757_293_168_36;
const TORR_PA: f64 = ATM_PA / 760.0;
const IN_HG_PA: f64 = 3_386.389;
const IN_H2O_PA: f64 = 249.088_9;
const KGF_CM2_PA: f64 = 98_066.5;
const FT3_M3: f64 = 0.028_316_846_592;
const GAL_M3: f64 = 0.003_785_411_784;
const BBL_M3: f64 = 0.158_987_294_928;
const LB_KG: f64 = 0.453_592_37;
const DEG_F_OFFSET_K: f64 = 255.372_222_222_222_24;

/// A canonical unit: long name, base-dimension exponents, and the affine map
/// to SI coherent base units (`si = value * scale + offset`).
#[derive(Clone, Copy, Debug)]
struct UnitDef {
    name: &'static str,
    dims: Dims,
    scale: f64,
    offset: f64,
}

fn insert(map: &mut HashMap<&'static str, UnitDef>, def: UnitDef, aliases: &[&'static str]) {
    map.insert(def.name, def);
    for alias in aliases {
        map.insert(alias, def);
    }
}

/// Registry of resolvable unit spellings. Keys are exact strings; looser
/// historian spellings go through [`HISTORIAN_ALIASES`] first.
static REGISTRY: LazyLock<HashMap<&'static str, UnitDef>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    let linear = |name, dims, scale| UnitDef { name, dims, scale, offset: 0.0 };

    // Pressure
    insert(&mut m, linear("pascal", PRESSURE, 1.0), &["Pa", "pa", "PA"]);
    insert(&mut m, linear("kilopascal", PRESSURE, 1e3), &["kPa", "kpa", "KPA"]);
    insert(&mut m, linear("megapascal", PRESSURE, 1e6), &["MPa", "MPA"]);
    insert(&mut m, linear("bar", PRESSURE, 1e5), &["BAR"]);
    insert(&mut m, linear("millibar", PRESSURE, 1e2), &["mbar", "MBAR"]);
    insert(
        &mut m,
        linear("standard_atmosphere", PRESSURE, ATM_PA),
        &["atm", "ATM", "atmosphere"],
    );
    insert(
        &mut m,
        linear("pound_force_per_square_inch", PRESSURE, PSI_PA),
        &["psi", "PSI", "psia", "PSIA", "lbf/in^2"],
    );
    insert(
        &mut m,
        linear("torr", PRESSURE, TORR_PA),
        &["Torr", "mmHg", "MMHG", "mm Hg"],
    );
    insert(
        &mut m,
        linear("inch_Hg", PRESSURE, IN_HG_PA),
        &["inHg", "INHG", "in Hg", "in hg"],
    );
    insert(
        &mut m,
        linear("inch_H2O", PRESSURE, IN_H2O_PA),
        &["inH2O", "INH2O", "in H2O", "in water"],
    );
    insert(
        &mut m,
        linear("kilogram_force_per_square_centimeter", PRESSURE, KGF_CM2_PA),
        &["kgf/cm2", "kgf/cm^2", "kg/cm2", "KG/CM2"],
    );

    // Temperature
    insert(&mut m, linear("kelvin", TEMPERATURE, 1.0), &["K", "degK"]);
    insert(
        &mut m,
        UnitDef { name: "degree_Celsius", dims: TEMPERATURE, scale: 1.0, offset: 273.15 },
        &["degC", "C", "\u{b0}C", "celsius"],
    );
    insert(
        &mut m,
        UnitDef {
            name: "degree_Fahrenheit",
            dims: TEMPERATURE,
            scale: 5.0 / 9.0,
            offset: DEG_F_OFFSET_K,
        },
        &["degF", "F", "\u{b0}F", "fahrenheit"],
    );
    insert(
        &mut m,
        UnitDef { name: "degree_Rankine", dims: TEMPERATURE, scale: 5.0 / 9.0, offset: 0.0 },
        &["degR", "R", "rankine"],
    );

    // Volume
    insert(&mut m, linear("meter ** 3", VOLUME, 1.0), &["m3", "m^3", "m**3"]);
    insert(&mut m, linear("liter", VOLUME, 1e-3), &["L", "l", "litre"]);
    insert(
        &mut m,
        linear("foot ** 3", VOLUME, FT3_M3),
        &["ft3", "ft^3", "ft**3", "cu ft"],
    );
    insert(&mut m, linear("gallon", VOLUME, GAL_M3), &["gal", "GAL"]);
    insert(&mut m, linear("oil_barrel", VOLUME, BBL_M3), &["bbl", "BBL", "barrel"]);

    // Length
    insert(&mut m, linear("meter", LENGTH, 1.0), &["m", "metre"]);
    insert(&mut m, linear("centimeter", LENGTH, 1e-2), &["cm"]);
    insert(&mut m, linear("millimeter", LENGTH, 1e-3), &["mm"]);
    insert(&mut m, linear("foot", LENGTH, 0.3048), &["ft", "feet"]);
    insert(&mut m, linear("inch", LENGTH, 0.0254), &["in"]);

    // Mass
    insert(&mut m, linear("kilogram", MASS, 1.0), &["kg", "KG"]);
    insert(&mut m, linear("gram", MASS, 1e-3), &["g"]);
    insert(&mut m, linear("pound", MASS, LB_KG), &["lb", "lbs", "LB"]);
    insert(&mut m, linear("metric_ton", MASS, 1e3), &["t", "tonne"]);

    // Time
    insert(&mut m, linear("second", TIME, 1.0), &["s", "sec"]);
    insert(&mut m, linear("minute", TIME, 60.0), &["min"]);
    insert(&mut m, linear("hour", TIME, 3600.0), &["hr", "h", "HR"]);

    // Mass flow
    insert(&mut m, linear("kilogram / second", MASS_FLOW, 1.0), &["kg/s", "kg/sec"]);
    insert(
        &mut m,
        linear("kilogram / hour", MASS_FLOW, 1.0 / 3600.0),
        &["kg/hr", "kg/h", "KG/HR"],
    );
    insert(
        &mut m,
        linear("pound / hour", MASS_FLOW, LB_KG / 3600.0),
        &["lb/hr", "LB/HR", "lbs/hr"],
    );
    insert(
        &mut m,
        linear("kilopound / hour", MASS_FLOW, 1e3 * LB_KG / 3600.0),
        &["klb/hr", "KLB/HR"],
    );
    insert(
        &mut m,
        linear("metric_ton / hour", MASS_FLOW, 1e3 / 3600.0),
        &["t/hr", "t/h", "MT/HR"],
    );

    // Volumetric flow
    insert(&mut m, linear("meter ** 3 / second", VOLUME_FLOW, 1.0), &["m3/s", "m^3/s"]);
    insert(
        &mut m,
        linear("meter ** 3 / hour", VOLUME_FLOW, 1.0 / 3600.0),
        &["m3/hr", "m3/h", "m^3/hr"],
    );
    insert(
        &mut m,
        linear("gallon / minute", VOLUME_FLOW, GAL_M3 / 60.0),
        &["gpm", "GPM", "gal/min"],
    );
    insert(
        &mut m,
        linear("foot ** 3 / minute", VOLUME_FLOW, FT3_M3 / 60.0),
        &["cfm", "CFM", "ft3/min"],
    );

    m
});

/// Looser historian spellings mapped onto registry (or gauge) labels.
static HISTORIAN_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("PSIG", "psig"),
        ("BARG", "barg"),
        ("KPAG", "kPag"),
        ("DEG F", "degF"),
        ("DEGF", "degF"),
        ("DEG C", "degC"),
        ("DEGC", "degC"),
        ("DEG K", "K"),
        ("DEG R", "degR"),
        ("INWC", "inH2O"),
        ("IN WC", "inH2O"),
    ])
});

/// Gauge-pressure labels and the absolute unit they are measured in.
static GAUGE_PRESSURES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("psig", "psi"),
        ("barg", "bar"),
        ("kPag", "kPa"),
        ("in water gauge", "inH2O"),
        ("in hg gauge", "inHg"),
    ])
});

/// Labels that are never converted (composition and chemistry scales).
const IGNORE_UNITS: &[&str] = &["percent", "%", "ppm", "PPM", "ppb", "PPB", "pH", "PH"];

/// Look up the canonical long name for a unit label, if the label resolves.
pub fn canonical_unit(label: &str) -> Option<&'static str> {
    let label = HISTORIAN_ALIASES.get(label).copied().unwrap_or(label);
    REGISTRY.get(label).map(|def| def.name)
}

// ============================================================================
// Unit systems
// ============================================================================

/// A named coherent set of base units used as a conversion target.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, AsRefStr, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum UnitSystem {
    /// meter / kilogram / second base units
    #[default]
    Mks,
    /// centimeter / gram / second base units
    Cgs,
}

impl UnitSystem {
    /// Base unit name and the number of base units per SI coherent unit,
    /// per dimension slot.
    fn base_units(&self) -> [(&'static str, f64); 7] {
        match self {
            UnitSystem::Mks => [
                ("meter", 1.0),
                ("kilogram", 1.0),
                ("second", 1.0),
                ("kelvin", 1.0),
                ("ampere", 1.0),
                ("candela", 1.0),
                ("mole", 1.0),
            ],
            UnitSystem::Cgs => [
                ("centimeter", 1e2),
                ("gram", 1e3),
                ("second", 1.0),
                ("kelvin", 1.0),
                ("ampere", 1.0),
                ("candela", 1.0),
                ("mole", 1.0),
            ],
        }
    }

    /// Multiplier taking an SI coherent value to this system's base units.
    fn factor(&self, dims: &Dims) -> f64 {
        let base = self.base_units();
        dims.iter()
            .zip(base.iter())
            .map(|(exp, (_, per_si))| per_si.powi(*exp as i32))
            .product()
    }

    /// Render the base-unit string for a dimension vector, in the style
    /// `kilogram / meter / second ** 2`.
    fn render(&self, dims: &Dims) -> String {
        let base = self.base_units();
        let mut factors: Vec<(&str, i8)> = dims
            .iter()
            .zip(base.iter())
            .filter(|(exp, _)| **exp != 0)
            .map(|(exp, (name, _))| (*name, *exp))
            .collect();
        if factors.is_empty() {
            return "dimensionless".to_string();
        }
        factors.sort_by(|a, b| a.0.cmp(b.0));

        let power = |name: &str, exp: i8| {
            if exp.abs() > 1 {
                format!("{} ** {}", name, exp.abs())
            } else {
                name.to_string()
            }
        };
        let numerator: Vec<String> = factors
            .iter()
            .filter(|(_, exp)| *exp > 0)
            .map(|(name, exp)| power(name, *exp))
            .collect();
        let mut out = if numerator.is_empty() {
            "1".to_string()
        } else {
            numerator.join(" * ")
        };
        for (name, exp) in factors.iter().filter(|(_, exp)| *exp < 0) {
            out.push_str(" / ");
            out.push_str(&power(name, *exp));
        }
        out
    }
}

// ============================================================================
// Conversion options and results
// ============================================================================

/// Ambient pressure used to shift gauge readings to absolute.
#[derive(Clone, Debug, PartialEq)]
pub enum AmbientPressure {
    /// One ambient value added uniformly across all elements.
    Scalar(f64),
    /// Per-element ambient values, added elementwise.
    Series(Vec<f64>),
}

impl Default for AmbientPressure {
    fn default() -> Self {
        AmbientPressure::Scalar(1.0)
    }
}

/// Options for [`unit_convert`]. The explicit target takes precedence over
/// the unit system; with neither set, values convert to [`UnitSystem::Mks`]
/// base units.
#[derive(Clone, Debug, Default)]
pub struct ConvertOptions {
    pub to: Option<String>,
    pub system: Option<UnitSystem>,
    /// Caller label aliases, consulted before the built-in tables.
    pub aliases: HashMap<String, String>,
    /// Extra labels to pass through unconverted.
    pub ignore_units: Vec<String>,
    /// Extra gauge-pressure labels and their absolute units.
    pub gauge_pressures: HashMap<String, String>,
    /// Ambient pressure for gauge corrections. Defaults to a scalar 1.0.
    pub ambient_pressure: Option<AmbientPressure>,
    /// Unit the ambient pressure is stated in. Defaults to `atm`.
    pub ambient_pressure_unit: Option<String>,
}

impl ConvertOptions {
    pub fn to(mut self, unit: &str) -> Self {
        self.to = Some(unit.to_string());
        self
    }

    pub fn system(mut self, system: UnitSystem) -> Self {
        self.system = Some(system);
        self
    }

    pub fn alias(mut self, label: &str, unit: &str) -> Self {
        self.aliases.insert(label.to_string(), unit.to_string());
        self
    }

    pub fn aliases(mut self, map: HashMap<String, String>) -> Self {
        self.aliases.extend(map);
        self
    }

    pub fn ignore(mut self, label: &str) -> Self {
        self.ignore_units.push(label.to_string());
        self
    }

    pub fn gauge(mut self, label: &str, absolute: &str) -> Self {
        self.gauge_pressures.insert(label.to_string(), absolute.to_string());
        self
    }

    pub fn ambient_pressure(mut self, ambient: AmbientPressure) -> Self {
        self.ambient_pressure = Some(ambient);
        self
    }

    pub fn ambient_pressure_unit(mut self, unit: &str) -> Self {
        self.ambient_pressure_unit = Some(unit.to_string());
        self
    }
}

/// Result of a conversion: the values, the resulting unit string, and the
/// warning when the source label did not resolve and nothing was converted.
#[derive(Clone, Debug, PartialEq)]
pub struct Converted {
    pub values: Vec<f64>,
    pub unit: String,
    pub warning: Option<ConvertWarning>,
}

/// Non-fatal conversion outcomes reported to the user.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConvertWarning {
    #[error("In unit conversion, from unit '{unit}' is not defined. No conversion.")]
    UndefinedUnit { unit: String },
}

/// Hard conversion failures.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("target unit '{unit}' is not defined")]
    UndefinedTarget { unit: String },
    #[error("cannot convert from '{from}' to '{to}': incompatible dimensions")]
    IncompatibleDimensions { from: String, to: String },
    #[error("ambient pressure unit '{unit}' is not a known pressure unit")]
    BadAmbientUnit { unit: String },
    #[error("ambient pressure series has {ambient} values but the data has {data}")]
    AmbientLengthMismatch { ambient: usize, data: usize },
}

// ============================================================================
// Conversion
// ============================================================================

/// Resolve a raw label through the caller aliases, then the historian table.
fn resolve_label(raw: &str, aliases: &HashMap<String, String>) -> String {
    if let Some(mapped) = aliases.get(raw) {
        return mapped.clone();
    }
    if let Some(mapped) = HISTORIAN_ALIASES.get(raw) {
        return mapped.to_string();
    }
    raw.to_string()
}

/// Where converted values end up: an explicit unit or a system's base units.
enum Output {
    Unit(UnitDef),
    System(UnitSystem, Dims),
}

impl Output {
    fn from_si(&self, si: f64) -> f64 {
        match self {
            Output::Unit(def) => (si - def.offset) / def.scale,
            Output::System(system, dims) => si * system.factor(dims),
        }
    }

    fn unit_string(&self) -> String {
        match self {
            Output::Unit(def) => def.name.to_string(),
            Output::System(system, dims) => system.render(dims),
        }
    }
}

/// Convert `values` from the unit labelled `from` according to `opts`.
///
/// Returns the converted values and the canonical unit string. Ignore-list
/// labels and unresolvable source labels pass through unchanged; the latter
/// additionally carry a [`ConvertWarning`] and are logged.
pub fn unit_convert(
    values: &[f64],
    from: &str,
    opts: &ConvertOptions,
) -> Result<Converted, ConvertError> {
    let label = resolve_label(from, &opts.aliases);

    if IGNORE_UNITS.contains(&label.as_str()) || opts.ignore_units.iter().any(|u| *u == label) {
        return Ok(Converted { values: values.to_vec(), unit: label, warning: None });
    }

    let (gauge, label) = if let Some(absolute) = opts.gauge_pressures.get(&label) {
        (true, absolute.clone())
    } else if let Some(absolute) = GAUGE_PRESSURES.get(label.as_str()) {
        (true, absolute.to_string())
    } else {
        (false, label)
    };

    let Some(source) = REGISTRY.get(label.as_str()).copied() else {
        let warning = ConvertWarning::UndefinedUnit { unit: label.clone() };
        tracing::warn!("{}", warning);
        return Ok(Converted { values: values.to_vec(), unit: label, warning: Some(warning) });
    };

    let output = match &opts.to {
        Some(to) => {
            let target_label = resolve_label(to, &opts.aliases);
            let target = REGISTRY
                .get(target_label.as_str())
                .copied()
                .ok_or_else(|| ConvertError::UndefinedTarget { unit: to.clone() })?;
            if target.dims != source.dims {
                return Err(ConvertError::IncompatibleDimensions {
                    from: source.name.to_string(),
                    to: target.name.to_string(),
                });
            }
            Output::Unit(target)
        }
        None => Output::System(opts.system.unwrap_or_default(), source.dims),
    };

    let mut out: Vec<f64> = values
        .iter()
        .map(|v| output.from_si(v * source.scale + source.offset))
        .collect();

    if gauge {
        let ambient_unit = opts.ambient_pressure_unit.as_deref().unwrap_or("atm");
        let ambient_label = resolve_label(ambient_unit, &opts.aliases);
        let ambient_def = REGISTRY
            .get(ambient_label.as_str())
            .copied()
            .filter(|def| def.dims == PRESSURE)
            .ok_or_else(|| ConvertError::BadAmbientUnit { unit: ambient_unit.to_string() })?;
        let shift = |a: f64| output.from_si(a * ambient_def.scale + ambient_def.offset);
        match opts.ambient_pressure.clone().unwrap_or_default() {
            AmbientPressure::Scalar(a) => {
                let add = shift(a);
                for v in &mut out {
                    *v += add;
                }
            }
            AmbientPressure::Series(ambient) => {
                if ambient.len() != out.len() {
                    return Err(ConvertError::AmbientLengthMismatch {
                        ambient: ambient.len(),
                        data: out.len(),
                    });
                }
                for (v, a) in out.iter_mut().zip(ambient.iter()) {
                    *v += shift(*a);
                }
            }
        }
    }

    Ok(Converted { values: out, unit: output.unit_string(), warning: None })
}

/// Convert to an explicit target unit.
pub fn convert_to(values: &[f64], from: &str, to: &str) -> Result<Converted, ConvertError> {
    unit_convert(values, from, &ConvertOptions::default().to(to))
}

/// Convert to the base units of a unit system.
pub fn convert_system(
    values: &[f64],
    from: &str,
    system: UnitSystem,
) -> Result<Converted, ConvertError> {
    unit_convert(values, from, &ConvertOptions::default().system(system))
}

/// Scalar convenience wrapper around [`unit_convert`].
pub fn convert_scalar(
    value: f64,
    from: &str,
    opts: &ConvertOptions,
) -> Result<(f64, String), ConvertError> {
    let converted = unit_convert(&[value], from, opts)?;
    Ok((converted.values[0], converted.unit))
}

// ============================================================================
// Alias map persistence
// ============================================================================

/// Errors loading a unit alias map from disk.
#[derive(Debug, Error)]
pub enum AliasMapError {
    #[error("failed to read alias map: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse alias map: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Load a caller-supplied label-to-unit alias map from a JSON object file,
/// e.g. `{"MYPRESSURE": "psi"}`.
pub fn load_alias_map(path: impl AsRef<Path>) -> Result<HashMap<String, String>, AliasMapError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
