use ahash::AHashSet;
use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{CompilationResult, Evaluate},
    node::{NodeKind, SchemaNode},
    paths::PathChunk,
};

/// Producers whose annotations mark object members as evaluated. Gathering
/// walks the whole same-location subtree, so members claimed inside `allOf`,
/// `$ref` and friends count too.
const PRODUCERS: &[&str] = &[
    "additionalProperties",
    "patternProperties",
    "properties",
    "unevaluatedProperties",
];

pub(crate) struct UnevaluatedPropertiesEvaluator {
    node: SchemaNode,
}

impl Evaluate for UnevaluatedPropertiesEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        let Value::Object(item) = instance else {
            return Ok(());
        };
        let evaluated: AHashSet<String> = ctx
            .gathered_annotations(PRODUCERS)
            .into_iter()
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        if matches!(self.node.kind(), NodeKind::Boolean(false)) {
            let unevaluated: Vec<&str> = item
                .keys()
                .filter(|name| !evaluated.contains(name.as_str()))
                .map(String::as_str)
                .collect();
            if unevaluated.is_empty() {
                ctx.annotate(Value::Array(Vec::new()));
            } else {
                let names = unevaluated
                    .iter()
                    .map(|name| format!("'{name}'"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let verb = if unevaluated.len() == 1 { "was" } else { "were" };
                ctx.error(format!(
                    "Unevaluated properties are not allowed ({names} {verb} unexpected)"
                ));
            }
            return Ok(());
        }
        let mut applied = Vec::new();
        let mut all_valid = true;
        for (name, child) in item {
            if evaluated.contains(name.as_str()) {
                continue;
            }
            let valid = ctx.apply(
                &self.node,
                &[PathChunk::Keyword("unevaluatedProperties")],
                child,
                Some(PathChunk::Property(name.clone().into_boxed_str())),
            )?;
            all_valid &= valid;
            applied.push(Value::String(name.clone()));
        }
        if all_valid {
            ctx.annotate(Value::Array(applied));
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
    match ctx.subschema(value, &[PathChunk::Keyword("unevaluatedProperties")]) {
        Ok(node) => Some(Ok(Box::new(UnevaluatedPropertiesEvaluator { node }))),
        Err(error) => Some(Err(error)),
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(
        &json!({"properties": {"a": {}}, "unevaluatedProperties": false}),
        &json!({"a": 1})
    )]
    #[test_case(
        &json!({"allOf": [{"properties": {"a": {}}}], "unevaluatedProperties": false}),
        &json!({"a": 1});
        "members claimed inside allOf count"
    )]
    #[test_case(
        &json!({"patternProperties": {"^x": {}}, "unevaluatedProperties": {"type": "integer"}}),
        &json!({"xa": "anything", "other": 3})
    )]
    #[test_case(
        &json!({"unevaluatedProperties": false}),
        &json!("no object");
        "not an object"
    )]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(
        &json!({"properties": {"a": {}}, "unevaluatedProperties": false}),
        &json!({"a": 1, "b": 2}),
        "Unevaluated properties are not allowed ('b' was unexpected)"
    )]
    fn error_message(schema: &Value, instance: &Value, expected: &str) {
        tests_util::expect_error_message(schema, instance, expected);
    }

    #[test]
    fn failed_branches_leave_members_unevaluated() {
        // The anyOf branch that mentions "b" fails, so its annotation is
        // invisible and "b" stays unevaluated.
        tests_util::is_not_valid(
            &json!({
                "anyOf": [
                    {"properties": {"a": {"type": "integer"}}, "required": ["a"]},
                    {"properties": {"b": {"type": "string"}}, "required": ["b"]}
                ],
                "unevaluatedProperties": false
            }),
            &json!({"a": 1, "b": 2}),
        );
    }
}
