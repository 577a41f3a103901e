//! Serde deserialization from decoded values.
//!
//! Decoding happens in two passes: the document decoder produces a [`Value`]
//! tree, then [`Value`] acts as a [`serde::Deserializer`] for the target type.
//!
//! Map keys keep their terminating colon inside [`Value`]. When a map is
//! presented to a struct, a map type or an enum, one trailing colon is
//! stripped so `name:` matches the field `name`. Only `deserialize_any` (used
//! by self-describing targets such as [`Value`] itself) sees keys verbatim.
//!
//! ## Usage
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_pleat::from_str;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Player {
//!     name: String,
//!     hr: u32,
//!     avg: f64,
//! }
//!
//! let player: Player = from_str("name: \"Mark McGwire\"\nhr: 65\navg: 0.278").unwrap();
//! assert_eq!(
//!     player,
//!     Player { name: "Mark McGwire".to_string(), hr: 65, avg: 0.278 }
//! );
//! ```
//!
//! Implicit nils map to `None`:
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use serde_pleat::from_str;
//!
//! let map: BTreeMap<String, Option<i32>> = from_str("a: 1\nb:").unwrap();
//! assert_eq!(map["a"], Some(1));
//! assert_eq!(map["b"], None);
//! ```

use crate::{Error, Map, Number, Result, Value};
use serde::de::{self, Error as _, IntoDeserializer, Unexpected};
use serde::forward_to_deserialize_any;

fn strip_colon(key: String) -> String {
    match key.strip_suffix(':') {
        Some(stripped) => stripped.to_string(),
        None => key,
    }
}

impl Value {
    fn unexpected(&self) -> Unexpected<'_> {
        match self {
            Value::Null => Unexpected::Unit,
            Value::Bool(b) => Unexpected::Bool(*b),
            Value::Number(Number::Integer(i)) => Unexpected::Signed(*i),
            Value::Number(Number::Unsigned(u)) => Unexpected::Unsigned(*u),
            Value::Number(Number::Float(f)) => Unexpected::Float(*f),
            Value::Number(Number::Big(_)) => Unexpected::Other("big integer"),
            Value::String(s) => Unexpected::Str(s),
            Value::Array(_) => Unexpected::Seq,
            Value::Object(_) => Unexpected::Map,
        }
    }
}

impl<'de> de::Deserializer<'de> for Value {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(Number::Integer(i)) => visitor.visit_i64(i),
            Value::Number(Number::Unsigned(u)) => visitor.visit_u64(u),
            Value::Number(Number::Float(f)) => visitor.visit_f64(f),
            Value::Number(Number::Big(b)) => visitor.visit_string(b.to_string()),
            Value::String(s) => visitor.visit_string(s),
            Value::Array(arr) => visitor.visit_seq(SeqDeserializer::new(arr)),
            Value::Object(obj) => visitor.visit_map(MapDeserializer::new(obj, false)),
        }
    }

    fn deserialize_i128<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if let Value::Number(Number::Big(b)) = &self {
            if let Ok(i) = i128::try_from(b) {
                return visitor.visit_i128(i);
            }
        }
        self.deserialize_any(visitor)
    }

    fn deserialize_u128<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if let Value::Number(Number::Big(b)) = &self {
            if let Ok(u) = u128::try_from(b) {
                return visitor.visit_u128(u);
            }
        }
        self.deserialize_any(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(other),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::Object(obj) => visitor.visit_map(MapDeserializer::new(obj, true)),
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    /// Unit variants are strings; other variants are single-entry maps keyed
    /// by the variant name.
    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::String(s) => visitor.visit_enum(s.into_deserializer()),
            Value::Object(obj) if obj.len() == 1 => match obj.into_iter().next() {
                Some((variant, value)) => {
                    visitor.visit_enum(EnumDeserializer::new(strip_colon(variant), value))
                }
                None => Err(Error::custom("empty enum map")),
            },
            other => Err(Error::invalid_type(other.unexpected(), &"an enum variant")),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 u8 u16 u32 u64 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct identifier ignored_any
    }
}

impl<'de> IntoDeserializer<'de, Error> for Value {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(value).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, Value>,
    value: Option<Value>,
    strip: bool,
}

impl MapDeserializer {
    fn new(map: Map, strip: bool) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
            strip,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                let key = if self.strip { strip_colon(key) } else { key };
                seed.deserialize(Value::String(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(value),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Value,
}

impl EnumDeserializer {
    fn new(variant: String, value: Value) -> Self {
        EnumDeserializer { variant, value }
    }
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(Value::String(self.variant))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Value,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Value::Null => Ok(()),
            other => Err(Error::invalid_type(other.unexpected(), &"a unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(self.value)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Array(arr) => visitor.visit_seq(SeqDeserializer::new(arr)),
            other => Err(Error::invalid_type(other.unexpected(), &"a tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Object(obj) => visitor.visit_map(MapDeserializer::new(obj, true)),
            other => Err(Error::invalid_type(other.unexpected(), &"a struct variant")),
        }
    }
}
