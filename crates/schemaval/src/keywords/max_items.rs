use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{helpers, CompilationResult, Evaluate},
};

pub(crate) struct MaxItemsEvaluator {
    limit: u64,
}

impl Evaluate for MaxItemsEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if let Value::Array(items) = instance {
            if items.len() as u64 > self.limit {
                ctx.error(format!(
                    "{instance} has more than {} item{}",
                    self.limit,
                    if self.limit == 1 { "" } else { "s" }
                ));
            }
        }
        Ok(())
    }
}

#[inline]
pub(crate) fn compile(
    ctx: &compiler::Context,
    _: &Map<String, Value>,
    value: &Value,
) -> Option<CompilationResult> {
    match helpers::parse_bound(value) {
        Some(limit) => Some(Ok(Box::new(MaxItemsEvaluator { limit }))),
        None => Some(Err(ctx.malformed(
            "the value of 'maxItems' must be a non-negative integer",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"maxItems": 2}), &json!([1, 2]))]
    #[test_case(&json!({"maxItems": 2}), &json!("ab"); "not an array")]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"maxItems": 2}), &json!([1, 2, 3]), "[1,2,3] has more than 2 items")]
    #[test_case(&json!({"maxItems": 1}), &json!([1, 2]), "[1,2] has more than 1 item")]
    fn error_message(schema: &Value, instance: &Value, expected: &str) {
        tests_util::expect_error_message(schema, instance, expected);
    }
}
