use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{CompilationResult, Evaluate},
    node::SchemaNode,
    paths::PathChunk,
};

pub(crate) struct PropertiesEvaluator {
    properties: Vec<(String, SchemaNode)>,
}

impl Evaluate for PropertiesEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        let Value::Object(item) = instance else {
            return Ok(());
        };
        let mut matched = Vec::new();
        let mut all_valid = true;
        for (name, node) in &self.properties {
            let Some(child) = item.get(name) else {
                continue;
            };
            let valid = ctx.apply(
                node,
                &[
                    PathChunk::Keyword("properties"),
                    PathChunk::Property(name.clone().into_boxed_str()),
                ],
                child,
                Some(PathChunk::Property(name.clone().into_boxed_str())),
            )?;
            all_valid &= valid;
            matched.push(Value::String(name.clone()));
            if !valid && ctx.applies_optimizations() {
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
        return Some(Err(ctx.malformed("the value of 'properties' must be an object")));
    };
    let mut properties = Vec::with_capacity(map.len());
    for (name, subschema) in map {
        let node = match ctx.subschema(
            subschema,
            &[
                PathChunk::Keyword("properties"),
                PathChunk::Property(name.clone().into_boxed_str()),
            ],
        ) {
            Ok(node) => node,
            Err(error) => return Some(Err(error)),
        };
        properties.push((name.clone(), node));
    }
    Some(Ok(Box::new(PropertiesEvaluator { properties })))
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"properties": {"a": {"type": "integer"}}}), &json!({"a": 1}))]
    #[test_case(&json!({"properties": {"a": {"type": "integer"}}}), &json!({"b": "x"}); "unmatched members are ignored")]
    #[test_case(&json!({"properties": {"a": false}}), &json!({}); "false subschema never applied")]
    #[test_case(&json!({"properties": {"a": {}}}), &json!("str"); "not an object")]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"properties": {"a": {"type": "integer"}}}), &json!({"a": "x"}))]
    #[test_case(&json!({"properties": {"a": false}}), &json!({"a": 1}))]
    fn is_not_valid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn annotation_lists_matched_names() {
        let result = tests_util::evaluate(
            &json!({"properties": {"a": {}, "b": {}}}),
            &json!({"a": 1, "c": 2}),
        );
        assert_eq!(result.root().annotation("properties"), Some(&json!(["a"])));
    }

    #[test]
    fn error_location() {
        tests_util::assert_error_at(
            &json!({"properties": {"a": {"type": "integer"}}}),
            &json!({"a": "x"}),
            "/properties/a",
            "type",
            "/a",
        );
    }
}
