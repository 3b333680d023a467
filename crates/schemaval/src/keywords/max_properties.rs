use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{helpers, CompilationResult, Evaluate},
};

pub(crate) struct MaxPropertiesEvaluator {
    limit: u64,
}

impl Evaluate for MaxPropertiesEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if let Value::Object(item) = instance {
            if item.len() as u64 > self.limit {
                ctx.error(format!(
                    "{instance} has more than {} propert{}",
                    self.limit,
                    if self.limit == 1 { "y" } else { "ies" }
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
        Some(limit) => Some(Ok(Box::new(MaxPropertiesEvaluator { limit }))),
        None => Some(Err(ctx.malformed(
            "the value of 'maxProperties' must be a non-negative integer",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"maxProperties": 2}), &json!({"a": 1, "b": 2}))]
    #[test_case(&json!({"maxProperties": 0}), &json!([1, 2, 3]); "not an object")]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"maxProperties": 1}), &json!({"a": 1, "b": 2}), r#"{"a":1,"b":2} has more than 1 property"#)]
    fn error_message(schema: &Value, instance: &Value, expected: &str) {
        tests_util::expect_error_message(schema, instance, expected);
    }
}
