use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{helpers, CompilationResult, Evaluate},
};

pub(crate) struct MaxLengthEvaluator {
    limit: u64,
}

impl Evaluate for MaxLengthEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if let Value::String(item) = instance {
            if bytecount::num_chars(item.as_bytes()) as u64 > self.limit {
                ctx.error(format!(
                    "{instance} is longer than {} character{}",
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
        Some(limit) => Some(Ok(Box::new(MaxLengthEvaluator { limit }))),
        None => Some(Err(ctx.malformed(
            "the value of 'maxLength' must be a non-negative integer",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"maxLength": 2}), &json!("ab"))]
    #[test_case(&json!({"maxLength": 2}), &json!("áé"); "characters, not bytes")]
    #[test_case(&json!({"maxLength": 0}), &json!(""))]
    #[test_case(&json!({"maxLength": 2}), &json!(12345); "not a string")]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"maxLength": 2}), &json!("foo"), r#""foo" is longer than 2 characters"#)]
    #[test_case(&json!({"maxLength": 1}), &json!("fo"), r#""fo" is longer than 1 character"#)]
    fn error_message(schema: &Value, instance: &Value, expected: &str) {
        tests_util::expect_error_message(schema, instance, expected);
    }

    #[test]
    fn malformed() {
        tests_util::expect_malformed(&json!({"maxLength": -1}));
    }
}
