use fancy_regex::Regex;
use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{CompilationResult, Evaluate},
    node::SchemaNode,
    paths::PathChunk,
};

pub(crate) struct PatternPropertiesEvaluator {
    patterns: Vec<(String, Regex, SchemaNode)>,
}

impl Evaluate for PatternPropertiesEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        let Value::Object(item) = instance else {
            return Ok(());
        };
        let mut matched = Vec::new();
        let mut all_valid = true;
        for (name, child) in item {
            let mut name_matched = false;
            for (pattern, regex, node) in &self.patterns {
                if !regex.is_match(name).unwrap_or(false) {
                    continue;
                }
                name_matched = true;
                let valid = ctx.apply(
                    node,
                    &[
                        PathChunk::Keyword("patternProperties"),
                        PathChunk::Property(pattern.clone().into_boxed_str()),
                    ],
                    child,
                    Some(PathChunk::Property(name.clone().into_boxed_str())),
                )?;
                all_valid &= valid;
            }
            if name_matched {
                matched.push(Value::String(name.clone()));
            }
            if !all_valid && ctx.applies_optimizations() {
                break;
            }
        }
        if all_valid {
            ctx.annotate(Value::Array(matched));
        } else {
            ctx.invalidate();
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
    let Value::Object(map) = value else {
        return Some(Err(
            ctx.malformed("the value of 'patternProperties' must be an object")
        ));
    };
    let mut patterns = Vec::with_capacity(map.len());
    for (pattern, subschema) in map {
        let regex = match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(error) => {
                return Some(Err(ctx.malformed(format!(
                    "'{pattern}' is not a valid regular expression: {error}"
                ))))
            }
        };
        let node = match ctx.subschema(
            subschema,
            &[
                PathChunk::Keyword("patternProperties"),
                PathChunk::Property(pattern.clone().into_boxed_str()),
            ],
        ) {
            Ok(node) => node,
            Err(error) => return Some(Err(error)),
        };
        patterns.push((pattern.clone(), regex, node));
    }
    Some(Ok(Box::new(PatternPropertiesEvaluator { patterns })))
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"patternProperties": {"^f": {"type": "integer"}}}), &json!({"foo": 1, "bar": "x"}))]
    #[test_case(&json!({"patternProperties": {"^f": {}}}), &json!(12); "not an object")]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"patternProperties": {"^f": {"type": "integer"}}}), &json!({"foo": "x"}))]
    fn is_not_valid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn annotation_lists_matched_names() {
        let result = tests_util::evaluate(
            &json!({"patternProperties": {"^f": {}, "o$": {}}}),
            &json!({"foo": 1, "bar": 2}),
        );
        assert_eq!(
            result.root().annotation("patternProperties"),
            Some(&json!(["foo"]))
        );
    }

    #[test]
    fn malformed_pattern() {
        tests_util::expect_malformed(&json!({"patternProperties": {"(": {}}}));
    }
}
