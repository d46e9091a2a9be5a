use std::fmt::{self, Display};

/// A single flag value forwarded to the generator.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Num(f64),
    Str(String),
    /// Boolean-like flag rendered as `1` or `0`.
    Switch(bool),
    /// Colon-delimited section list, e.g. compartment widths.
    List(Vec<String>),
}

impl Value {
    /// Builds a [`Value::List`] from anything displayable.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        Value::List(items.into_iter().map(|item| item.to_string()).collect())
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{value}"),
            Value::Num(value) => write!(f, "{value}"),
            Value::Str(value) => write!(f, "{value}"),
            Value::Switch(true) => write!(f, "1"),
            Value::Switch(false) => write!(f, "0"),
            Value::List(items) => write!(f, "{}", items.join(":")),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Num(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Switch(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

/// Ordered set of generator parameters describing one design instance.
///
/// Flags render in insertion order, which keeps the assembled argument
/// list reproducible between runs.
#[derive(Debug, Clone, Default)]
pub struct ParamSet {
    params: Vec<(String, Value)>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a flag. Overwriting an existing flag keeps its position.
    pub fn set(mut self, flag: impl Into<String>, value: impl Into<Value>) -> Self {
        let flag = flag.into();
        let value = value.into();

        match self.params.iter_mut().find(|(name, _)| *name == flag) {
            Some(entry) => entry.1 = value,
            None => self.params.push((flag, value)),
        }

        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Renders the set as `--flag=value` argument strings.
    pub fn to_args(&self) -> Vec<String> {
        self.params
            .iter()
            .map(|(flag, value)| format!("--{flag}={value}"))
            .collect()
    }
}
