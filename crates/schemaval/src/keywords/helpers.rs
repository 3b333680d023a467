use num_cmp::NumCmp;
use serde_json::{Map, Number, Value};

macro_rules! with_right {
    ($method:ident, $left:expr, $right:expr) => {
        if let Some(b) = $right.as_u64() {
            NumCmp::$method($left, b)
        } else if let Some(b) = $right.as_i64() {
            NumCmp::$method($left, b)
        } else if let Some(b) = $right.as_f64() {
            NumCmp::$method($left, b)
        } else {
            false
        }
    };
}

macro_rules! compare {
    ($name:ident, $method:ident) => {
        #[inline]
        pub(crate) fn $name(left: &Number, right: &Number) -> bool {
            if let Some(a) = left.as_u64() {
                with_right!($method, a, right)
            } else if let Some(a) = left.as_i64() {
                with_right!($method, a, right)
            } else if let Some(a) = left.as_f64() {
                with_right!($method, a, right)
            } else {
                false
            }
        }
    };
}

compare!(num_eq, num_eq);
compare!(num_lt, num_lt);
compare!(num_le, num_le);
compare!(num_gt, num_gt);
compare!(num_ge, num_ge);

/// Structural equality over JSON values: numbers by mathematical value,
/// objects member-wise ignoring member order.
#[inline]
pub(crate) fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(left), Value::String(right)) => left == right,
        (Value::Bool(left), Value::Bool(right)) => left == right,
        (Value::Null, Value::Null) => true,
        (Value::Number(left), Value::Number(right)) => num_eq(left, right),
        (Value::Array(left), Value::Array(right)) => equal_arrays(left, right),
        (Value::Object(left), Value::Object(right)) => equal_objects(left, right),
        (_, _) => false,
    }
}

#[inline]
pub(crate) fn equal_arrays(left: &[Value], right: &[Value]) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(a, b)| equal(a, b))
}

#[inline]
pub(crate) fn equal_objects(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .all(|(key, a)| right.get(key).is_some_and(|b| equal(a, b)))
}

/// Whether a number is mathematically an integer; `1.0` qualifies.
#[inline]
pub(crate) fn is_integer(number: &Number) -> bool {
    number.is_u64()
        || number.is_i64()
        || number.as_f64().is_some_and(|value| value.fract() == 0.)
}

/// A keyword value that must be a non-negative integer bound.
#[inline]
pub(crate) fn parse_bound(value: &Value) -> Option<u64> {
    if let Some(bound) = value.as_u64() {
        return Some(bound);
    }
    match value.as_f64() {
        Some(bound) if bound >= 0. && bound.trunc() == bound => Some(bound as u64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{equal, is_integer, parse_bound};
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!(1), &json!(1.0), true; "positive integer equals float")]
    #[test_case(&json!(0), &json!(0.0), true)]
    #[test_case(&json!(1), &json!(1.5), false)]
    #[test_case(&json!(-1), &json!(-1.0), true; "negative integer equals float")]
    #[test_case(&json!([2]), &json!([2.0]), true)]
    #[test_case(&json!({"a": 1}), &json!({"a": 1.0}), true)]
    #[test_case(&json!({"a": 1, "b": 2}), &json!({"b": 2, "a": 1}), true; "member order is ignored")]
    #[test_case(&json!({"a": 1}), &json!({"a": 1, "b": 2}), false)]
    #[test_case(&json!(null), &json!(null), true)]
    #[test_case(&json!(null), &json!(0), false)]
    #[test_case(&json!("1"), &json!(1), false)]
    fn equality(left: &Value, right: &Value, expected: bool) {
        assert_eq!(equal(left, right), expected);
        assert_eq!(equal(right, left), expected);
    }

    #[test]
    fn integers() {
        assert!(is_integer(json!(1).as_number().expect("A number")));
        assert!(is_integer(json!(1.0).as_number().expect("A number")));
        assert!(!is_integer(json!(1.5).as_number().expect("A number")));
    }

    #[test]
    fn bounds() {
        assert_eq!(parse_bound(&json!(3)), Some(3));
        assert_eq!(parse_bound(&json!(3.0)), Some(3));
        assert_eq!(parse_bound(&json!(3.5)), None);
        assert_eq!(parse_bound(&json!(-1)), None);
        assert_eq!(parse_bound(&json!("3")), None);
    }
}
