use fancy_regex::Regex;
use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{CompilationResult, Evaluate},
};

pub(crate) struct PatternEvaluator {
    original: String,
    pattern: Regex,
}

impl Evaluate for PatternEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if let Value::String(item) = instance {
            // Backtracking limits surface as match errors; treat them as
            // non-matches rather than aborting the whole evaluation.
            if !self.pattern.is_match(item).unwrap_or(false) {
                ctx.error(format!("{instance} does not match \"{}\"", self.original));
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
    let Value::String(pattern) = value else {
        return Some(Err(ctx.malformed("the value of 'pattern' must be a string")));
    };
    match Regex::new(pattern) {
        Ok(compiled) => Some(Ok(Box::new(PatternEvaluator {
            original: pattern.clone(),
            pattern: compiled,
        }))),
        Err(error) => Some(Err(
            ctx.malformed(format!("'{pattern}' is not a valid regular expression: {error}"))
        )),
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"pattern": "^a*$"}), &json!("aaa"))]
    #[test_case(&json!({"pattern": "a+"}), &json!("xxaxx"); "unanchored match")]
    #[test_case(&json!({"pattern": "^(?!not)"}), &json!("this"); "lookahead support")]
    #[test_case(&json!({"pattern": "^a*$"}), &json!(5); "not a string")]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"pattern": "^a*$"}), &json!("abc"), r#""abc" does not match "^a*$""#)]
    fn error_message(schema: &Value, instance: &Value, expected: &str) {
        tests_util::expect_error_message(schema, instance, expected);
    }

    #[test]
    fn malformed() {
        tests_util::expect_malformed(&json!({"pattern": "(unclosed"}));
        tests_util::expect_malformed(&json!({"pattern": 1}));
    }
}
