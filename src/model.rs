//! Boundary to the external equation-oriented modeling framework.
//!
//! The framework itself is an external collaborator: this crate never builds
//! or solves models. It only asks a [`VariableSource`] for named variables
//! and stores the returned [`VarRef`] handles in the tag metadata, so that a
//! measured tag can be matched to the model quantity it calibrates.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;

/// Shared handle to a model variable. Cloning is cheap and the handle stays
/// usable independently of the source model's lifetime.
pub type VarRef = Arc<ModelVariable>;

/// Snapshot of a named, optionally time-indexed model variable.
#[derive(Clone, Debug, Default)]
pub struct ModelVariable {
    name: String,
    doc: String,
    scalar: Option<f64>,
    indexed: BTreeMap<i64, f64>,
}

impl ModelVariable {
    /// A scalar (unindexed) variable.
    pub fn scalar(name: impl Into<String>, doc: impl Into<String>, value: f64) -> Self {
        Self { name: name.into(), doc: doc.into(), scalar: Some(value), indexed: BTreeMap::new() }
    }

    /// A variable indexed by integer time keys.
    pub fn indexed(
        name: impl Into<String>,
        doc: impl Into<String>,
        values: impl IntoIterator<Item = (i64, f64)>,
    ) -> Self {
        Self {
            name: name.into(),
            doc: doc.into(),
            scalar: None,
            indexed: values.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn is_indexed(&self) -> bool {
        !self.indexed.is_empty()
    }

    /// Value at a time key, for indexed variables.
    pub fn value(&self, key: i64) -> Option<f64> {
        self.indexed.get(&key).copied()
    }

    /// Value of a scalar variable.
    pub fn scalar_value(&self) -> Option<f64> {
        self.scalar
    }

    /// Time keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = i64> + '_ {
        self.indexed.keys().copied()
    }

    pub fn into_ref(self) -> VarRef {
        Arc::new(self)
    }
}

/// Implemented by the external modeling framework (or an adapter around it)
/// to expose its variables by name.
pub trait VariableSource {
    fn variable(&self, name: &str) -> Option<VarRef>;
}

/// How a reference string indexes the named variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReferenceIndex {
    /// `name` - unindexed reference
    None,
    /// `name[:]` - indexed over the model's time set
    All,
    /// `name[k]` - a single time key
    Key(i64),
}

/// Parsed form of a metadata reference string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceString {
    pub variable: String,
    pub index: ReferenceIndex,
}

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<name>[A-Za-z_][A-Za-z0-9_.]*)(?:\[(?<index>[^\]]*)\])?$")
        .expect("reference pattern is valid")
});

impl ReferenceString {
    /// Parse `name`, `name[:]`, or `name[k]`. Returns None for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        let captures = REFERENCE_RE.captures(raw.trim())?;
        let variable = captures["name"].to_string();
        let index = match captures.name("index") {
            None => ReferenceIndex::None,
            Some(m) if m.as_str() == ":" || m.as_str() == "*" => ReferenceIndex::All,
            Some(m) => ReferenceIndex::Key(m.as_str().trim().parse().ok()?),
        };
        Some(Self { variable, index })
    }
}

/// Resolve a metadata reference string against a variable source. Unknown
/// variables and unparseable strings resolve to None rather than failing.
pub fn resolve_reference(source: &dyn VariableSource, reference_string: &str) -> Option<VarRef> {
    let raw = reference_string.trim();
    if raw.is_empty() {
        return None;
    }
    let Some(parsed) = ReferenceString::parse(raw) else {
        tracing::debug!("unparseable reference string: {}", raw);
        return None;
    };
    let variable = source.variable(&parsed.variable);
    if variable.is_none() {
        tracing::debug!("model has no variable named {}", parsed.variable);
    }
    variable
}
