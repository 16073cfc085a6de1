//! Scalar values stored in application documents, and coercion of raw user
//! input into them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capability::{Parameter, ParameterKind};
use crate::error::{CapError, Result};

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
        }
    }
}

/// A value as the caller captured it.
///
/// Flag parsers frequently keep everything as text, so [`RawInput::Text`] is
/// accepted for every kind and parsed on demand.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    Int(i64),
    Bool(bool),
    Float(f64),
    Text(String),
}

impl RawInput {
    const fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::Float(_) => "float",
            Self::Text(_) => "string",
        }
    }

    /// Whether this input counts as "not supplied".
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }
}

impl From<&str> for RawInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for RawInput {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for RawInput {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for RawInput {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// User-supplied inputs keyed by flag name (a parameter's alias or name).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inputs {
    values: BTreeMap<String, RawInput>,
}

impl Inputs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key=value` pairs; every value is kept as text.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut inputs = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                CapError::Config(format!("invalid input `{pair}`, expected key=value"))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(CapError::Config(format!("invalid input `{pair}`, empty key")));
            }
            inputs.insert(key, RawInput::Text(value.to_string()));
        }
        Ok(inputs)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawInput>) {
        self.values.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawInput>) -> Self {
        self.insert(key, value);
        self
    }

    /// The supplied value for `key`, ignoring blank text.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RawInput> {
        self.values.get(key).filter(|raw| !raw.is_blank())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Coerce one raw input to the parameter's declared kind.
///
/// Returns `Ok(None)` for kinds that cannot be bound from flat input. A
/// primitive of the wrong kind is retried as text when it arrived as text;
/// anything else is a type mismatch.
pub fn coerce(parameter: &Parameter, raw: &RawInput) -> Result<Option<Value>> {
    let direct = match (parameter.kind, raw) {
        (ParameterKind::Other, _) => return Ok(None),
        (ParameterKind::Int, RawInput::Int(v)) => Some(Value::Int(*v)),
        (ParameterKind::Bool, RawInput::Bool(v)) => Some(Value::Bool(*v)),
        (ParameterKind::Float, RawInput::Float(v)) => Some(Value::Float(*v)),
        (ParameterKind::String, RawInput::Text(v)) => Some(Value::String(v.clone())),
        _ => None,
    };
    if let Some(value) = direct {
        return Ok(Some(value));
    }

    let RawInput::Text(text) = raw else {
        return Err(mismatch(
            parameter,
            format!(
                "trying to get {} value of flag of type {}",
                parameter.kind.as_str(),
                raw.type_name()
            ),
        ));
    };
    let text = text.trim();
    let value = match parameter.kind {
        ParameterKind::Int => text
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|err| mismatch(parameter, format!("parsing {text:?}: {err}")))?,
        ParameterKind::Bool => parse_bool(text)
            .map(Value::Bool)
            .ok_or_else(|| mismatch(parameter, format!("parsing {text:?}: invalid syntax")))?,
        ParameterKind::Float => text
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|err| mismatch(parameter, format!("parsing {text:?}: {err}")))?,
        ParameterKind::String | ParameterKind::Other => return Ok(None),
    };
    Ok(Some(value))
}

fn mismatch(parameter: &Parameter, reason: String) -> CapError {
    CapError::TypeMismatch {
        parameter: parameter.lookup_key().to_string(),
        reason,
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
