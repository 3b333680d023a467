use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{helpers, CompilationResult, Evaluate},
};

pub(crate) struct EnumEvaluator {
    options: Vec<Value>,
    value: Value,
}

impl Evaluate for EnumEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if !self
            .options
            .iter()
            .any(|option| helpers::equal(option, instance))
        {
            ctx.error(format!("{instance} is not one of {}", self.value));
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
    let Value::Array(options) = value else {
        return Some(Err(ctx.malformed("the value of 'enum' must be an array")));
    };
    Some(Ok(Box::new(EnumEvaluator {
        options: options.clone(),
        value: value.clone(),
    })))
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"enum": [1, 2, 3]}), &json!(2))]
    #[test_case(&json!({"enum": [1.0]}), &json!(1); "mathematical equality")]
    #[test_case(&json!({"enum": [[1], "x"]}), &json!([1]))]
    fn cases(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"enum": [1, 2, 3]}), &json!(4), "4 is not one of [1,2,3]")]
    #[test_case(&json!({"enum": []}), &json!(1), "1 is not one of []"; "empty enum rejects everything")]
    fn error_message(schema: &Value, instance: &Value, expected: &str) {
        tests_util::expect_error_message(schema, instance, expected);
    }

    #[test]
    fn malformed() {
        tests_util::expect_malformed(&json!({"enum": 3}));
    }
}
