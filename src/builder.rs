//! Collection builders.
//!
//! The document decoder never constructs maps or sequences itself. It asks a
//! [`Builders`] factory for an empty builder whenever a collection opens, feeds
//! entries into it and calls `finish` when the collection closes. Builders are
//! passed by value and returned from every call, so an implementation may be
//! mutable or copy-on-write; the decoder keeps only the latest one.
//!
//! [`ValueBuilders`] is the default back end and produces [`Value`] trees.

use crate::{Map, Value};

pub trait MapBuilder: Sized {
    /// Adds an entry, returning the builder to use from now on.
    #[must_use]
    fn insert(self, key: String, value: Value) -> Self;

    fn finish(self) -> Value;
}

pub trait SequenceBuilder: Sized {
    /// Sets element `index`. The decoder supplies indices in order, starting
    /// at zero.
    #[must_use]
    fn push(self, index: usize, value: Value) -> Self;

    fn finish(self) -> Value;
}

/// A factory for empty builders.
///
/// `reserve_comment_slot` asks the builder to set aside the empty key (or a
/// leading position) for comments attached to the collection as a whole.
pub trait Builders {
    type Map: MapBuilder;
    type Sequence: SequenceBuilder;

    fn map(&self, reserve_comment_slot: bool) -> Self::Map;

    fn sequence(&self, reserve_comment_slot: bool) -> Self::Sequence;
}

/// Builds [`Value::Object`] and [`Value::Array`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ValueBuilders;

impl Builders for ValueBuilders {
    type Map = MapValue;
    type Sequence = SequenceValue;

    fn map(&self, reserve_comment_slot: bool) -> MapValue {
        MapValue::new(reserve_comment_slot)
    }

    fn sequence(&self, _reserve_comment_slot: bool) -> SequenceValue {
        SequenceValue::default()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapValue {
    map: Map,
    reserved: bool,
}

impl MapValue {
    /// A reserved map holds its comment slot under the empty key from the
    /// start, so the slot sorts before every entry.
    #[must_use]
    pub fn new(reserve_comment_slot: bool) -> Self {
        let mut map = Map::new();
        if reserve_comment_slot {
            map.insert(String::new(), Value::Null);
        }
        MapValue {
            map,
            reserved: reserve_comment_slot,
        }
    }
}

impl MapBuilder for MapValue {
    /// # Panics
    ///
    /// Panics when `key` is empty and the map did not reserve a comment slot.
    fn insert(mut self, key: String, value: Value) -> Self {
        assert!(
            self.reserved || !key.is_empty(),
            "empty key written to a map without a reserved comment slot"
        );
        self.map.insert(key, value);
        self
    }

    fn finish(mut self) -> Value {
        if self.reserved && self.map.get("") == Some(&Value::Null) {
            self.map.remove("");
        }
        Value::Object(self.map)
    }
}

#[derive(Clone, Debug, Default)]
pub struct SequenceValue {
    items: Vec<Value>,
}

impl SequenceBuilder for SequenceValue {
    fn push(mut self, index: usize, value: Value) -> Self {
        debug_assert_eq!(index, self.items.len(), "sequence elements out of order");
        self.items.push(value);
        self
    }

    fn finish(self) -> Value {
        Value::Array(self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_keeps_insertion_order() {
        let value = ValueBuilders
            .map(false)
            .insert("b:".to_string(), Value::from(1))
            .insert("a:".to_string(), Value::from(2))
            .finish();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b:", "a:"]);
    }

    #[test]
    fn test_unused_comment_slot_is_dropped() {
        let value = ValueBuilders
            .map(true)
            .insert("a:".to_string(), Value::from(1))
            .finish();
        assert!(!value.as_object().unwrap().contains_key(""));
    }

    #[test]
    fn test_filled_comment_slot_leads_the_map() {
        let value = ValueBuilders
            .map(true)
            .insert("a:".to_string(), Value::from(1))
            .insert(String::new(), Value::from("# about"))
            .finish();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["", "a:"]);
    }

    #[test]
    #[should_panic(expected = "reserved comment slot")]
    fn test_empty_key_without_reservation_panics() {
        let _ = ValueBuilders.map(false).insert(String::new(), Value::Null);
    }

    #[test]
    fn test_sequence() {
        let value = ValueBuilders
            .sequence(false)
            .push(0, Value::from(1))
            .push(1, Value::Null)
            .finish();
        assert_eq!(value, Value::from(vec![Value::from(1), Value::Null]));
    }
}
