use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{helpers, CompilationResult, Evaluate},
};

pub(crate) struct MinPropertiesEvaluator {
    limit: u64,
}

impl Evaluate for MinPropertiesEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if let Value::Object(item) = instance {
            if (item.len() as u64) < self.limit {
                ctx.error(format!(
                    "{instance} has less than {} propert{}",
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
        Some(limit) => Some(Ok(Box::new(MinPropertiesEvaluator { limit }))),
        None => Some(Err(ctx.malformed(
            "the value of 'minProperties' must be a non-negative integer",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"minProperties": 1}), &json!({"a": 1}))]
    #[test_case(&json!({"minProperties": 1}), &json!([]); "not an object")]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"minProperties": 1}), &json!({}), "{} has less than 1 property")]
    #[test_case(&json!({"minProperties": 2}), &json!({"a": 1}), r#"{"a":1} has less than 2 properties"#)]
    fn error_message(schema: &Value, instance: &Value, expected: &str) {
        tests_util::expect_error_message(schema, instance, expected);
    }
}
