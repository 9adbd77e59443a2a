use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A resolved variable value inside a question instance.
///
/// `Fault` marks a variable that could not be produced; it keeps the rest
/// of the instance alive while staying distinguishable from real data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    #[serde(skip)]
    Fault(ResolveFault),
}

impl Value {
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Fault(_) => "fault",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub const fn is_fault(&self) -> bool {
        matches!(self, Value::Fault(_))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

/// Why a variable ended up as a `Value::Fault`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveFault {
    /// Dependencies never became available before resolution stalled.
    Unresolved,
    /// The template named a generator kind the engine does not know.
    UnknownGenerator,
    /// The generator ran but reported an error.
    GeneratorFailed,
}

impl ResolveFault {
    pub const fn label(self) -> &'static str {
        match self {
            ResolveFault::Unresolved => "unresolved",
            ResolveFault::UnknownGenerator => "unknown_generator",
            ResolveFault::GeneratorFailed => "generator_failed",
        }
    }
}

/// A variable could not be read in the shape a computation expected.
#[derive(Debug, thiserror::Error)]
pub enum VarError {
    #[error("variable '{0}' is not available")]
    Missing(String),
    #[error("variable '{name}' is {found}, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// The set of resolved variables for one question instance.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: BTreeMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn lookup(&self, name: &str) -> Result<&Value, VarError> {
        self.values
            .get(name)
            .ok_or_else(|| VarError::Missing(name.to_string()))
    }

    pub fn float(&self, name: &str) -> Result<f64, VarError> {
        let value = self.lookup(name)?;
        value.as_f64().ok_or_else(|| VarError::TypeMismatch {
            name: name.to_string(),
            expected: "number",
            found: value.type_name(),
        })
    }

    pub fn int(&self, name: &str) -> Result<i64, VarError> {
        let value = self.lookup(name)?;
        value.as_i64().ok_or_else(|| VarError::TypeMismatch {
            name: name.to_string(),
            expected: "int",
            found: value.type_name(),
        })
    }

    pub fn text(&self, name: &str) -> Result<&str, VarError> {
        let value = self.lookup(name)?;
        value.as_text().ok_or_else(|| VarError::TypeMismatch {
            name: name.to_string(),
            expected: "text",
            found: value.type_name(),
        })
    }

    pub fn list(&self, name: &str) -> Result<&[Value], VarError> {
        let value = self.lookup(name)?;
        value.as_list().ok_or_else(|| VarError::TypeMismatch {
            name: name.to_string(),
            expected: "list",
            found: value.type_name(),
        })
    }

    /// Reads a list variable as floats, rejecting non-numeric entries.
    pub fn numeric_list(&self, name: &str) -> Result<Vec<f64>, VarError> {
        let items = self.list(name)?;
        items
            .iter()
            .map(|item| {
                item.as_f64().ok_or_else(|| VarError::TypeMismatch {
                    name: name.to_string(),
                    expected: "numeric list",
                    found: item.type_name(),
                })
            })
            .collect()
    }
}
