use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{helpers, CompilationResult, Evaluate},
};

pub(crate) struct MinItemsEvaluator {
    limit: u64,
}

impl Evaluate for MinItemsEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if let Value::Array(items) = instance {
            if (items.len() as u64) < self.limit {
                ctx.error(format!(
                    "{instance} has less than {} item{}",
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
        Some(limit) => Some(Ok(Box::new(MinItemsEvaluator { limit }))),
        None => Some(Err(ctx.malformed(
            "the value of 'minItems' must be a non-negative integer",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"minItems": 1}), &json!([1]))]
    #[test_case(&json!({"minItems": 1}), &json!({}); "not an array")]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"minItems": 1}), &json!([]), "[] has less than 1 item")]
    #[test_case(&json!({"minItems": 2}), &json!([1]), "[1] has less than 2 items")]
    fn error_message(schema: &Value, instance: &Value, expected: &str) {
        tests_util::expect_error_message(schema, instance, expected);
    }
}
