use std::hash::{Hash, Hasher};

use ahash::{AHashSet, AHasher};
use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{helpers, CompilationResult, Evaluate},
};

/// A JSON value hashed consistently with [`helpers::equal`]: numbers by
/// mathematical value, objects independent of member order.
pub(crate) struct HashedValue<'a>(&'a Value);

impl PartialEq for HashedValue<'_> {
    fn eq(&self, other: &Self) -> bool {
        helpers::equal(self.0, other.0)
    }
}

impl Eq for HashedValue<'_> {}

impl Hash for HashedValue<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.0 {
            Value::Null => state.write_u32(3_221_225_473), // chosen randomly
            Value::Bool(item) => item.hash(state),
            Value::Number(item) => {
                // `1` and `1.0` must collide, so integers hash through `f64`
                // where the value fits.
                if let Some(number) = item.as_f64() {
                    number.to_bits().hash(state);
                } else if let Some(number) = item.as_u64() {
                    number.hash(state);
                } else if let Some(number) = item.as_i64() {
                    number.hash(state);
                }
            }
            Value::String(item) => item.hash(state),
            Value::Array(items) => {
                for item in items {
                    HashedValue(item).hash(state);
                }
            }
            Value::Object(items) => {
                let mut hash = 0;
                for (key, value) in items {
                    // There is no way of building a new hasher of type `H`,
                    // so member hashes are combined order-independently with
                    // a fixed hasher.
                    let mut item_hasher = AHasher::default();
                    key.hash(&mut item_hasher);
                    HashedValue(value).hash(&mut item_hasher);
                    hash ^= item_hasher.finish();
                }
                state.write_u64(hash);
            }
        }
    }
}

// Empirically chosen threshold after which the evaluator resorts to hashing.
const ITEMS_SIZE_THRESHOLD: usize = 15;

#[inline]
pub(crate) fn is_unique(items: &[Value]) -> bool {
    let size = items.len();
    if size <= 1 {
        true
    } else if let [first, second] = items {
        !helpers::equal(first, second)
    } else if size <= ITEMS_SIZE_THRESHOLD {
        // Pairwise comparison beats hashing for small arrays even though it
        // is quadratic.
        for (idx, item) in items.iter().enumerate() {
            for other in &items[idx + 1..] {
                if helpers::equal(item, other) {
                    return false;
                }
            }
        }
        true
    } else {
        let mut seen = AHashSet::with_capacity(size);
        items.iter().map(HashedValue).all(move |item| seen.insert(item))
    }
}

pub(crate) struct UniqueItemsEvaluator;

impl Evaluate for UniqueItemsEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if let Value::Array(items) = instance {
            if !is_unique(items) {
                ctx.error(format!("{instance} has non-unique elements"));
            }
        }
        Ok(())
    }
}

#[inline]
pub(crate) fn compile(
    _: &compiler::Context,
    _: &Map<String, Value>,
    value: &Value,
) -> Option<CompilationResult> {
    match value {
        Value::Bool(true) => Some(Ok(Box::new(UniqueItemsEvaluator))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{is_unique, ITEMS_SIZE_THRESHOLD};
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&[] => true; "empty array")]
    #[test_case(&[json!(1)] => true; "one element")]
    #[test_case(&[json!(1), json!(2)] => true; "two unique elements")]
    #[test_case(&[json!(1), json!(1.0)] => false; "mathematically equal numbers")]
    #[test_case(&[json!(1), json!(2), json!(1)] => false; "three elements with a duplicate")]
    #[test_case(&[json!(1), json!("1")] => true; "a number is not its string form")]
    #[test_case(&[json!({"a": 1, "b": 2}), json!({"b": 2, "a": 1})] => false; "member order is ignored")]
    #[test_case(&[json!(null), json!(0), json!(false), json!("")] => true; "falsy values are distinct")]
    fn uniqueness(items: &[Value]) -> bool {
        is_unique(items)
    }

    #[test_case(ITEMS_SIZE_THRESHOLD)]
    #[test_case(ITEMS_SIZE_THRESHOLD + 1)]
    fn around_the_hashing_threshold(size: usize) {
        let unique: Vec<_> = (1..=size).map(|i| json!(i)).collect();
        assert!(is_unique(&unique));
        let mut duplicated = unique;
        duplicated[size - 1] = json!(1);
        assert!(!is_unique(&duplicated));
    }

    #[test]
    fn error_message() {
        tests_util::expect_error_message(
            &json!({"uniqueItems": true}),
            &json!([1, 1]),
            "[1,1] has non-unique elements",
        );
    }

    #[test]
    fn disabled_unique_items_accepts_duplicates() {
        tests_util::is_valid(&json!({"uniqueItems": false}), &json!([1, 1]));
    }
}
