//! Dynamic value representation for decoded documents.
//!
//! A pleat document decodes to a tree of [`Value`]s: maps, sequences and
//! scalars. Implicit nils (a key with nothing after it, a missing inline array
//! element) become [`Value::Null`].
//!
//! ## Usage Patterns
//!
//! ### Decoding
//!
//! ```rust
//! use serde_pleat::{decode_str, Value};
//!
//! let value = decode_str("name: \"Sammy Sosa\"\nhr: 63").unwrap();
//! assert_eq!(value["name:"].as_str(), Some("Sammy Sosa"));
//! assert_eq!(value["hr:"].as_i64(), Some(63));
//! ```
//!
//! ### Creating Values
//!
//! ```rust
//! use serde_pleat::{value, Value};
//!
//! let manual = Value::from(vec![Value::from(1), Value::from("two")]);
//! assert_eq!(manual, value!([1, "two"]));
//! ```
//!
//! ### Extracting Values
//!
//! ```rust
//! use serde_pleat::Value;
//!
//! let num: i64 = i64::try_from(Value::from(42)).unwrap();
//! assert_eq!(num, 42);
//! ```

use crate::Map;
use num_bigint::BigInt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Index;

/// Any decoded pleat value.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(Map),
}

/// A decoded numeral.
///
/// Decimal integers become [`Number::Integer`] when they fit an `i64` and
/// [`Number::Unsigned`] when they only fit a `u64`. Hex numerals are always
/// unsigned. Anything larger is kept exactly as a [`Number::Big`].
///
/// # Examples
///
/// ```rust
/// use serde_pleat::Number;
///
/// assert_eq!(Number::from(7u64), Number::Integer(7));
/// assert_eq!(Number::from(u64::MAX), Number::Unsigned(u64::MAX));
/// assert_eq!(Number::Float(2.0).to_string(), "2.0");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Big(BigInt),
}

impl Number {
    /// Returns `true` for every integral variant.
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_) | Number::Unsigned(_) | Number::Big(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Converts to an `i64` when the value is integral and in range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_pleat::Number;
    ///
    /// assert_eq!(Number::Integer(-3).as_i64(), Some(-3));
    /// assert_eq!(Number::Float(42.0).as_i64(), Some(42));
    /// assert_eq!(Number::Float(42.5).as_i64(), None);
    /// assert_eq!(Number::Unsigned(u64::MAX).as_i64(), None);
    /// ```
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Unsigned(u) => i64::try_from(*u).ok(),
            Number::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            Number::Big(_) => None,
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Number::Integer(i) => u64::try_from(*i).ok(),
            Number::Unsigned(u) => Some(*u),
            Number::Float(f) => {
                if f.fract() == 0.0 && *f >= 0.0 && *f < u64::MAX as f64 {
                    Some(*f as u64)
                } else {
                    None
                }
            }
            Number::Big(_) => None,
        }
    }

    /// Converts to the nearest `f64`.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Unsigned(u) => *u as f64,
            Number::Float(f) => *f,
            Number::Big(b) => b.to_string().parse().unwrap_or(f64::NAN),
        }
    }
}

/// Renders a numeral the number grammar reads back to the same value.
impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Unsigned(u) => write!(f, "{}", u),
            // Debug keeps a `.0` or exponent and round-trips exactly.
            Number::Float(fl) => write!(f, "{:?}", fl),
            Number::Big(b) => write!(f, "{}", b),
        }
    }
}

macro_rules! number_from_signed {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Number {
            fn from(value: $ty) -> Self {
                Number::Integer(i64::from(value))
            }
        }
    )*};
}

macro_rules! number_from_unsigned {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Number {
            fn from(value: $ty) -> Self {
                Number::from(u64::from(value))
            }
        }
    )*};
}

number_from_signed!(i8, i16, i32, i64);
number_from_unsigned!(u8, u16, u32);

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Number::Integer(i),
            Err(_) => Number::Unsigned(value),
        }
    }
}

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        Number::Float(f64::from(value))
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number::Big(value)
    }
}

impl Value {
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// If the value is a boolean, returns it. Otherwise returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_pleat::Value;
    ///
    /// assert_eq!(Value::Bool(true).as_bool(), Some(true));
    /// assert_eq!(Value::from(42).as_bool(), None);
    /// ```
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(Number::as_i64)
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        self.as_number().and_then(Number::as_u64)
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(Number::as_f64)
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Looks up a map key (colon included) or a sequence index.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_pleat::decode_str;
    ///
    /// let value = decode_str("list:\n  - 1\n  - 2").unwrap();
    /// assert_eq!(value.get("list:").and_then(|list| list.get(1)).and_then(|v| v.as_i64()), Some(2));
    /// assert!(value.get("missing:").is_none());
    /// ```
    #[must_use]
    pub fn get<I: ValueIndex>(&self, index: I) -> Option<&Value> {
        index.index_into(self)
    }
}

/// Types that can index into a [`Value`]: `&str` for maps, `usize` for
/// sequences.
pub trait ValueIndex {
    fn index_into<'v>(&self, value: &'v Value) -> Option<&'v Value>;
}

impl ValueIndex for &str {
    fn index_into<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        value.as_object().and_then(|map| map.get(self))
    }
}

impl ValueIndex for usize {
    fn index_into<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        value.as_array().and_then(|items| items.get(*self))
    }
}

static NULL: Value = Value::Null;

/// Missing keys and out-of-range indices yield [`Value::Null`].
impl<I: ValueIndex> Index<I> for Value {
    type Output = Value;

    fn index(&self, index: I) -> &Value {
        index.index_into(self).unwrap_or(&NULL)
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

/// A compact single-line rendering, meant for diagnostics.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write_quoted(f, s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Object(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} {}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Number::Integer(i) => serializer.serialize_i64(*i),
            Number::Unsigned(u) => serializer.serialize_u64(*u),
            Number::Float(f) => serializer.serialize_f64(*f),
            Number::Big(b) => serializer.serialize_str(&b.to_string()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for element in arr {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (k, v) in obj {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any pleat value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Value, E> {
                Ok(Value::Number(Number::Integer(value)))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Value, E> {
                Ok(Value::Number(Number::from(value)))
            }

            fn visit_i128<E>(self, value: i128) -> Result<Value, E> {
                Ok(Value::Number(match i64::try_from(value) {
                    Ok(i) => Number::Integer(i),
                    Err(_) => Number::Big(BigInt::from(value)),
                }))
            }

            fn visit_u128<E>(self, value: u128) -> Result<Value, E> {
                Ok(Value::Number(match u64::try_from(value) {
                    Ok(u) => Number::from(u),
                    Err(_) => Number::Big(BigInt::from(value)),
                }))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Value, E> {
                Ok(Value::Number(Number::Float(value)))
            }

            fn visit_str<E>(self, value: &str) -> Result<Value, E> {
                Ok(Value::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Value, E> {
                Ok(Value::String(value))
            }

            fn visit_unit<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::Array(vec))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = Map::new();
                while let Some((key, value)) = map.next_entry()? {
                    values.insert(key, value);
                }
                Ok(Value::Object(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

fn mismatch(expected: &str, value: &Value) -> crate::Error {
    crate::Error::new(crate::ErrorKind::TypeMismatch {
        expected: expected.to_string(),
        found: value.to_string(),
    })
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value.as_i64().ok_or_else(|| mismatch("an i64", &value))
    }
}

impl TryFrom<Value> for u64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value.as_u64().ok_or_else(|| mismatch("a u64", &value))
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value.as_f64().ok_or_else(|| mismatch("a number", &value))
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value.as_bool().ok_or_else(|| mismatch("a boolean", &value))
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(mismatch("a string", &other)),
        }
    }
}

macro_rules! value_from_number {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::Number(Number::from(value))
            }
        }
    )*};
}

value_from_number!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, BigInt);

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tryfrom_i64() {
        assert_eq!(i64::try_from(Value::from(42)).unwrap(), 42);
        assert_eq!(i64::try_from(Value::from(42.0)).unwrap(), 42);
        let err = i64::try_from(Value::from("test")).unwrap_err();
        assert_eq!(
            err.kind(),
            &crate::ErrorKind::TypeMismatch {
                expected: "an i64".to_string(),
                found: "\"test\"".to_string(),
            }
        );
    }

    #[test]
    fn test_tryfrom_u64_and_f64() {
        assert_eq!(u64::try_from(Value::from(u64::MAX)).unwrap(), u64::MAX);
        assert!(u64::try_from(Value::from(-1)).is_err());
        assert_eq!(f64::try_from(Value::from(3)).unwrap(), 3.0);
        assert!(f64::try_from(Value::Null).is_err());
    }

    #[test]
    fn test_tryfrom_bool_and_string() {
        assert!(bool::try_from(Value::Bool(true)).unwrap());
        assert!(bool::try_from(Value::from(1)).is_err());
        assert_eq!(String::try_from(Value::from("hello")).unwrap(), "hello");
        assert!(String::try_from(Value::from(42)).is_err());
    }

    #[test]
    fn test_number_display_round_trips_floats() {
        assert_eq!(Number::Float(1.0).to_string(), "1.0");
        assert_eq!(Number::Float(-0.5).to_string(), "-0.5");
        assert_eq!(Number::Float(1e300).to_string(), "1e300");
        assert_eq!(Number::Unsigned(u64::MAX).to_string(), "18446744073709551615");
    }

    #[test]
    fn test_from_unsigned_prefers_integer() {
        assert_eq!(Value::from(5u64), Value::Number(Number::Integer(5)));
        assert_eq!(
            Value::from(u64::MAX),
            Value::Number(Number::Unsigned(u64::MAX))
        );
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn test_index() {
        let mut map = Map::new();
        map.insert("list:".to_string(), Value::from(vec![Value::from(1), Value::from(2)]));
        let value = Value::Object(map);
        assert_eq!(value["list:"][1], Value::from(2));
        assert_eq!(value["missing:"], Value::Null);
        assert_eq!(value["list:"][9], Value::Null);
    }

    #[test]
    fn test_display() {
        let mut map = Map::new();
        map.insert("a:".to_string(), Value::from("x\"y"));
        map.insert("b:".to_string(), Value::from(vec![Value::Null, Value::from(true)]));
        assert_eq!(Value::Object(map).to_string(), "{a: \"x\\\"y\", b: [null, true]}");
    }
}
