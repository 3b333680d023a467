use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{helpers, CompilationResult, Evaluate},
};

pub(crate) struct MinLengthEvaluator {
    limit: u64,
}

impl Evaluate for MinLengthEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if let Value::String(item) = instance {
            if (bytecount::num_chars(item.as_bytes()) as u64) < self.limit {
                ctx.error(format!(
                    "{instance} is shorter than {} character{}",
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
        Some(limit) => Some(Ok(Box::new(MinLengthEvaluator { limit }))),
        None => Some(Err(ctx.malformed(
            "the value of 'minLength' must be a non-negative integer",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"minLength": 2}), &json!("ab"))]
    #[test_case(&json!({"minLength": 2}), &json!(1); "not a string")]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"minLength": 2}), &json!("f"), r#""f" is shorter than 2 characters"#)]
    #[test_case(&json!({"minLength": 1}), &json!(""), r#""" is shorter than 1 character"#)]
    fn error_message(schema: &Value, instance: &Value, expected: &str) {
        tests_util::expect_error_message(schema, instance, expected);
    }
}
