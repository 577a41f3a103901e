/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// Map keys are written the way pleat stores them, colon included.
///
/// ```rust
/// use serde_pleat::{decode_str, value};
///
/// let expected = value!({ "hr:": 63, "teams:": ["Cubs", null] });
/// assert_eq!(decode_str("hr: 63\nteams: [\"Cubs\",]").unwrap(), expected);
/// ```
#[macro_export]
macro_rules! value {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::value!($elem)),*])
    };

    ({}) => {
        $crate::Value::Object($crate::Map::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::Map::new();
        $(
            object.insert($key.to_string(), $crate::value!($value));
        )*
        $crate::Value::Object(object)
    }};

    // Scalars and anything else convertible with `From`.
    ($s:expr) => {
        $crate::Value::from($s)
    };
}
