use super::{Options, ValueType};
use propdoc_types::{Error, Result, Value};

fn reject(type_name: &str, raw: &Value) -> Error {
    Error::coercion(type_name, format!("{} is not accepted", raw.kind_name()))
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64)
        .then_some(f as i64)
}

/// Text. Scalars are rendered into their decimal/boolean form.
#[derive(Debug, Clone, Default)]
pub struct StringType {
    options: Options,
}

impl StringType {
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

impl ValueType for StringType {
    fn name(&self) -> &str {
        "string"
    }

    fn parse(&self, raw: &Value) -> Result<Value> {
        match raw {
            Value::Unset | Value::Null => Ok(Value::Unset),
            Value::Text(s) => Ok(Value::Text(s.clone())),
            Value::Bool(b) => Ok(Value::Text(b.to_string())),
            Value::Int(i) => Ok(Value::Text(i.to_string())),
            Value::Float(f) => Ok(Value::Text(f.to_string())),
            other => Err(reject(self.name(), other)),
        }
    }

    fn empty_value(&self) -> Value {
        Value::Text(String::new())
    }

    fn options(&self) -> &Options {
        &self.options
    }
}

/// Signed 64-bit integers. Accepts integral floats and numeric text.
#[derive(Debug, Clone, Default)]
pub struct IntegerType {
    options: Options,
}

impl IntegerType {
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

impl ValueType for IntegerType {
    fn name(&self) -> &str {
        "integer"
    }

    fn parse(&self, raw: &Value) -> Result<Value> {
        match raw {
            Value::Unset | Value::Null => Ok(Value::Unset),
            Value::Int(i) => Ok(Value::Int(*i)),
            Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
            Value::Float(f) => integral(*f)
                .map(Value::Int)
                .ok_or_else(|| Error::coercion(self.name(), format!("{f} is not integral"))),
            Value::Text(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().and_then(integral))
                    .map(Value::Int)
                    .ok_or_else(|| Error::coercion(self.name(), format!("'{s}' is not an integer")))
            }
            other => Err(reject(self.name(), other)),
        }
    }

    fn empty_value(&self) -> Value {
        Value::Int(0)
    }

    fn options(&self) -> &Options {
        &self.options
    }
}

/// 64-bit floats. Accepts integers and numeric text.
#[derive(Debug, Clone, Default)]
pub struct DoubleType {
    options: Options,
}

impl DoubleType {
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// NaN never equals itself and has no JSON form, so only finite
    /// numbers are stored.
    fn finite(f: f64) -> Result<Value> {
        if f.is_finite() {
            Ok(Value::Float(f))
        } else {
            Err(Error::coercion("double", format!("{f} is not a finite number")))
        }
    }
}

impl ValueType for DoubleType {
    fn name(&self) -> &str {
        "double"
    }

    fn parse(&self, raw: &Value) -> Result<Value> {
        match raw {
            Value::Unset | Value::Null => Ok(Value::Unset),
            Value::Float(f) => Self::finite(*f),
            Value::Int(i) => Ok(Value::Float(*i as f64)),
            Value::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| Error::coercion(self.name(), format!("'{s}' is not a number")))
                .and_then(Self::finite),
            other => Err(reject(self.name(), other)),
        }
    }

    fn empty_value(&self) -> Value {
        Value::Float(0.0)
    }

    fn options(&self) -> &Options {
        &self.options
    }
}

/// Booleans. Accepts 0/1 and the usual textual spellings.
#[derive(Debug, Clone, Default)]
pub struct BooleanType {
    options: Options,
}

impl BooleanType {
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

impl ValueType for BooleanType {
    fn name(&self) -> &str {
        "boolean"
    }

    fn parse(&self, raw: &Value) -> Result<Value> {
        match raw {
            Value::Unset | Value::Null => Ok(Value::Unset),
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::Int(0) => Ok(Value::Bool(false)),
            Value::Int(1) => Ok(Value::Bool(true)),
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
                "false" | "0" | "no" | "off" | "" => Ok(Value::Bool(false)),
                _ => Err(Error::coercion(self.name(), format!("'{s}' is not a boolean"))),
            },
            other => Err(reject(self.name(), other)),
        }
    }

    fn empty_value(&self) -> Value {
        Value::Bool(false)
    }

    fn options(&self) -> &Options {
        &self.options
    }
}

/// Anything but a sentinel, stored as given.
#[derive(Debug, Clone, Default)]
pub struct MixedType {
    options: Options,
}

impl MixedType {
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

impl ValueType for MixedType {
    fn name(&self) -> &str {
        "mixed"
    }

    fn parse(&self, raw: &Value) -> Result<Value> {
        match raw {
            Value::Unset | Value::Null => Ok(Value::Unset),
            Value::Dirty(_) => Err(reject(self.name(), raw)),
            Value::Float(f) if !f.is_finite() => Err(reject(self.name(), raw)),
            other => Ok(other.clone()),
        }
    }

    fn empty_value(&self) -> Value {
        Value::Null
    }

    fn options(&self) -> &Options {
        &self.options
    }
}
