use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{helpers, CompilationResult, Evaluate},
};

pub(crate) struct ConstEvaluator {
    expected: Value,
}

impl Evaluate for ConstEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if !helpers::equal(&self.expected, instance) {
            ctx.error(format!("{} was expected", self.expected));
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
    Some(Ok(Box::new(ConstEvaluator {
        expected: value.clone(),
    })))
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"const": 1}), &json!(1))]
    #[test_case(&json!({"const": 1}), &json!(1.0); "mathematical equality")]
    #[test_case(&json!({"const": null}), &json!(null))]
    #[test_case(&json!({"const": {"a": [1]}}), &json!({"a": [1.0]}))]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"const": 2}), &json!(5), "2 was expected")]
    #[test_case(&json!({"const": null}), &json!(0), "null was expected")]
    fn error_message(schema: &Value, instance: &Value, expected: &str) {
        tests_util::expect_error_message(schema, instance, expected);
    }
}
