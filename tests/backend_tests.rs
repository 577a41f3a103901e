//! Custom builder back ends and comment hooks.

use serde_pleat::{
    decode_with, value, Builders, Collection, Commentator, DecodeOptions,
    MapBuilder, NoComments, SequenceBuilder, Value, ValueBuilders,
};
use std::rc::Rc;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Copy-on-write maps with sorted keys, and sequences that come out reversed.
#[derive(Default)]
struct SortedBuilders;

#[derive(Clone, Default)]
struct SortedMap(Rc<Vec<(String, Value)>>);

impl MapBuilder for SortedMap {
    fn insert(self, key: String, value: Value) -> Self {
        let mut entries = (*self.0).clone();
        entries.retain(|(existing, _)| *existing != key);
        entries.push((key, value));
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        SortedMap(Rc::new(entries))
    }

    fn finish(self) -> Value {
        Value::Object(self.0.iter().cloned().collect())
    }
}

#[derive(Clone, Default)]
struct ReversedSequence(Vec<Value>);

impl SequenceBuilder for ReversedSequence {
    fn push(mut self, index: usize, value: Value) -> Self {
        assert_eq!(index, self.0.len());
        self.0.push(value);
        self
    }

    fn finish(mut self) -> Value {
        self.0.reverse();
        Value::Array(self.0)
    }
}

impl Builders for SortedBuilders {
    type Map = SortedMap;
    type Sequence = ReversedSequence;

    fn map(&self, _reserve_comment_slot: bool) -> SortedMap {
        SortedMap::default()
    }

    fn sequence(&self, _reserve_comment_slot: bool) -> ReversedSequence {
        ReversedSequence::default()
    }
}

#[test]
fn test_custom_builders() {
    init_logger();
    let (value, _) = decode_with(
        "zeta: [1, 2]\nalpha:\n  - 3\n  - 4",
        &DecodeOptions::default(),
        SortedBuilders,
        NoComments,
    )
    .unwrap();
    let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["alpha:", "zeta:"]);
    assert_eq!(value["zeta:"], value!([2, 1]));
    assert_eq!(value["alpha:"], value!([4, 3]));
}

#[derive(Default)]
struct Recorder {
    text: String,
    events: Vec<String>,
}

impl Commentator for Recorder {
    fn reserve_slot(&self) -> bool {
        true
    }

    fn on_key_decoded(&mut self, key: &str) {
        self.events.push(format!("key {key:?}"));
    }

    fn on_scalar_value(&mut self) {
        self.events.push("value".to_string());
    }

    fn on_collection_begin(&mut self, collection: Collection) {
        self.events.push(format!(
            "begin {:?} depth {} at {}",
            collection.kind, collection.depth, collection.pos
        ));
    }

    fn on_collection_end(&mut self) {
        self.events.push("end".to_string());
    }

    fn on_blank_line(&mut self) {
        self.events.push("blank".to_string());
    }

    fn write(&mut self, ch: char) {
        self.text.push(ch);
    }
}

#[test]
fn test_comment_events() {
    init_logger();
    let doc = "# header\n\nlist: # inline\n  - 1\n# footer";
    let (value, recorder) =
        decode_with(doc, &DecodeOptions::default(), ValueBuilders, Recorder::default()).unwrap();

    // Reserved comment slots that stay empty are dropped.
    assert_eq!(value, value!({ "list:": [1] }));
    assert_eq!(recorder.text, "# header\n# inline\n# footer\n");
    assert_eq!(
        recorder.events,
        vec![
            "blank",
            "begin Map depth 0 at line 3, column 1",
            "key \"list:\"",
            "begin Sequence depth 1 at line 4, column 3",
            "key \"\"",
            "value",
            "end",
            "end",
        ]
    );
}

#[test]
fn test_inline_array_events() {
    let (_, recorder) =
        decode_with("[1, 2]", &DecodeOptions::default(), ValueBuilders, Recorder::default())
            .unwrap();
    assert_eq!(
        recorder.events,
        vec!["begin InlineArray depth 0 at line 1, column 1", "value", "value", "end"]
    );
}
