use serde_pleat::{decode_str, value, Map, Number, Value};

#[test]
fn test_value_macro_scalars() {
    assert_eq!(value!(null), Value::Null);
    assert_eq!(value!(false), Value::Bool(false));
    assert_eq!(value!(-123), Value::Number(Number::Integer(-123)));
    assert_eq!(value!(u64::MAX), Value::Number(Number::Unsigned(u64::MAX)));
    assert_eq!(value!(""), Value::String(String::new()));
}

#[test]
fn test_value_macro_mixed_array() {
    assert_eq!(
        value!([1, "hello", true, null]),
        Value::Array(vec![
            Value::Number(Number::Integer(1)),
            Value::String("hello".to_string()),
            Value::Bool(true),
            Value::Null,
        ])
    );
}

#[test]
fn test_value_macro_keeps_key_order() {
    let obj = value!({ "z:": 1, "a:": 2, "m:": 3 });
    let keys: Vec<_> = obj.as_object().map(Map::keys).unwrap().cloned().collect();
    assert_eq!(keys, vec!["z:", "a:", "m:"]);
}

#[test]
fn test_value_macro_matches_decoded_document() {
    let doc = "\
player:
  name: \"Ken Griffey\"
  hr: 56
  positions: [\"CF\", \"DH\"]
  retired: true";
    assert_eq!(
        decode_str(doc).unwrap(),
        value!({
            "player:": {
                "name:": "Ken Griffey",
                "hr:": 56,
                "positions:": ["CF", "DH"],
                "retired:": true
            }
        })
    );
}
