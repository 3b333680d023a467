use serde_json::{Map, Number, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{helpers, CompilationResult, Evaluate},
};

pub(crate) struct MaximumEvaluator {
    limit: Number,
}

impl Evaluate for MaximumEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if let Value::Number(number) = instance {
            if helpers::num_gt(number, &self.limit) {
                ctx.error(format!(
                    "{instance} is greater than the maximum of {}",
                    self.limit
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
    let Value::Number(limit) = value else {
        return Some(Err(ctx.malformed("the value of 'maximum' must be a number")));
    };
    Some(Ok(Box::new(MaximumEvaluator {
        limit: limit.clone(),
    })))
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"maximum": 3}), &json!(3))]
    #[test_case(&json!({"maximum": 3}), &json!(2.9))]
    #[test_case(&json!({"maximum": 3}), &json!(null))]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"maximum": 3}), &json!(3.5), "3.5 is greater than the maximum of 3")]
    #[test_case(&json!({"maximum": 3.0}), &json!(3.5), "3.5 is greater than the maximum of 3.0")]
    fn error_message(schema: &Value, instance: &Value, expected: &str) {
        tests_util::expect_error_message(schema, instance, expected);
    }
}
