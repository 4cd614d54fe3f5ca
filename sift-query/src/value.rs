//! Operand values carried by criteria fields and comparisons.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A value that can be used in comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// JSON value.
    Json(serde_json::Value),
    /// List of values.
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the value counts as "not provided".
    ///
    /// Null, the empty string and the empty list are empty. Everything else,
    /// including `0`, `false` and whitespace-only strings, is a real value.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// View the value as a sequence.
    ///
    /// A list yields its items, any other value yields itself as a
    /// one-element sequence.
    pub fn as_slice(&self) -> &[FilterValue] {
        match self {
            Self::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    /// Get the string content, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(s) => write!(f, "'{}'", s),
            Self::Json(v) => write!(f, "{}", v),
            Self::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

impl From<serde_json::Value> for FilterValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map(Self::Float).unwrap_or(Self::Json(Value::Number(n))),
            },
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Into::into).collect()),
            obj @ Value::Object(_) => Self::Json(obj),
        }
    }
}

/// Borrowing conversion from a criteria field to its operand value.
///
/// The `Criteria` derive calls this on every annotated field, so any type
/// used in a criteria struct must implement it.
pub trait ToFilterValue {
    /// Convert the field to a filter value.
    fn to_filter_value(&self) -> FilterValue;
}

impl<T: ToFilterValue + ?Sized> ToFilterValue for &T {
    fn to_filter_value(&self) -> FilterValue {
        (**self).to_filter_value()
    }
}

macro_rules! impl_int_value {
    ($($ty:ty),*) => {
        $(
            impl ToFilterValue for $ty {
                fn to_filter_value(&self) -> FilterValue {
                    FilterValue::Int(i64::from(*self))
                }
            }
        )*
    };
}

impl_int_value!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_wide_int_value {
    ($($ty:ty),*) => {
        $(
            impl ToFilterValue for $ty {
                fn to_filter_value(&self) -> FilterValue {
                    match i64::try_from(*self) {
                        Ok(v) => FilterValue::Int(v),
                        Err(_) => FilterValue::String(self.to_string()),
                    }
                }
            }
        )*
    };
}

impl_wide_int_value!(u64, usize, i128, u128);

impl ToFilterValue for f32 {
    fn to_filter_value(&self) -> FilterValue {
        FilterValue::Float(f64::from(*self))
    }
}

impl ToFilterValue for f64 {
    fn to_filter_value(&self) -> FilterValue {
        FilterValue::Float(*self)
    }
}

impl ToFilterValue for bool {
    fn to_filter_value(&self) -> FilterValue {
        FilterValue::Bool(*self)
    }
}

impl ToFilterValue for str {
    fn to_filter_value(&self) -> FilterValue {
        FilterValue::String(self.to_string())
    }
}

impl ToFilterValue for String {
    fn to_filter_value(&self) -> FilterValue {
        FilterValue::String(self.clone())
    }
}

impl<T: ToFilterValue> ToFilterValue for Option<T> {
    fn to_filter_value(&self) -> FilterValue {
        match self {
            Some(v) => v.to_filter_value(),
            None => FilterValue::Null,
        }
    }
}

impl<T: ToFilterValue> ToFilterValue for [T] {
    fn to_filter_value(&self) -> FilterValue {
        FilterValue::List(self.iter().map(ToFilterValue::to_filter_value).collect())
    }
}

impl<T: ToFilterValue, const N: usize> ToFilterValue for [T; N] {
    fn to_filter_value(&self) -> FilterValue {
        self.as_slice().to_filter_value()
    }
}

impl<T: ToFilterValue> ToFilterValue for Vec<T> {
    fn to_filter_value(&self) -> FilterValue {
        self.as_slice().to_filter_value()
    }
}

impl ToFilterValue for FilterValue {
    fn to_filter_value(&self) -> FilterValue {
        self.clone()
    }
}

impl ToFilterValue for serde_json::Value {
    fn to_filter_value(&self) -> FilterValue {
        self.clone().into()
    }
}

impl ToFilterValue for uuid::Uuid {
    fn to_filter_value(&self) -> FilterValue {
        FilterValue::String(self.hyphenated().to_string())
    }
}

impl ToFilterValue for chrono::NaiveDate {
    fn to_filter_value(&self) -> FilterValue {
        FilterValue::String(self.format("%Y-%m-%d").to_string())
    }
}

impl ToFilterValue for chrono::NaiveDateTime {
    fn to_filter_value(&self) -> FilterValue {
        FilterValue::String(self.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

impl ToFilterValue for chrono::DateTime<chrono::Utc> {
    fn to_filter_value(&self) -> FilterValue {
        FilterValue::String(self.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}
