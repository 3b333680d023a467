use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{CompilationResult, Evaluate},
    node::SchemaNode,
    paths::PathChunk,
};

/// `if`/`then`/`else` compile as one unit registered under `if`; a bare
/// `then` or `else` has nothing to condition on and is inert.
pub(crate) struct IfEvaluator {
    condition: SchemaNode,
    then_schema: Option<SchemaNode>,
    else_schema: Option<SchemaNode>,
}

impl Evaluate for IfEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        // The condition asserts nothing; its annotations still count when it
        // holds, which is why it runs through a regular child frame.
        let condition_holds =
            ctx.apply(&self.condition, &[PathChunk::Keyword("if")], instance, None)?;
        let branch = if condition_holds {
            self.then_schema.as_ref().map(|node| (node, "then"))
        } else {
            self.else_schema.as_ref().map(|node| (node, "else"))
        };
        if let Some((node, keyword)) = branch {
            if !ctx.apply(node, &[PathChunk::Keyword(keyword)], instance, None)? {
                ctx.invalidate();
            }
        }
        Ok(())
    }
}

#[inline]
pub(crate) fn compile(
    ctx: &compiler::Context,
    parent: &Map<String, Value>,
    value: &Value,
) -> Option<CompilationResult> {
    let condition = match ctx.subschema(value, &[PathChunk::Keyword("if")]) {
        Ok(node) => node,
        Err(error) => return Some(Err(error)),
    };
    let then_schema = match parent.get("then") {
        Some(subschema) => match ctx.subschema(subschema, &[PathChunk::Keyword("then")]) {
            Ok(node) => Some(node),
            Err(error) => return Some(Err(error)),
        },
        None => None,
    };
    let else_schema = match parent.get("else") {
        Some(subschema) => match ctx.subschema(subschema, &[PathChunk::Keyword("else")]) {
            Ok(node) => Some(node),
            Err(error) => return Some(Err(error)),
        },
        None => None,
    };
    Some(Ok(Box::new(IfEvaluator {
        condition,
        then_schema,
        else_schema,
    })))
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"if": {"minimum": 0}, "then": {"multipleOf": 2}}), &json!(4))]
    #[test_case(&json!({"if": {"minimum": 0}, "then": {"multipleOf": 2}}), &json!(-3); "failed condition without else")]
    #[test_case(&json!({"if": {"minimum": 0}, "else": {"multipleOf": 2}}), &json!(-4))]
    #[test_case(&json!({"then": {"multipleOf": 2}}), &json!(3); "bare then is inert")]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"if": {"minimum": 0}, "then": {"multipleOf": 2}}), &json!(3), "/then", "multipleOf", "")]
    #[test_case(&json!({"if": {"minimum": 0}, "else": {"multipleOf": 2}}), &json!(-1), "/else", "multipleOf", "")]
    fn error_location(
        schema: &Value,
        instance: &Value,
        evaluation_path: &str,
        keyword: &str,
        instance_location: &str,
    ) {
        tests_util::assert_error_at(schema, instance, evaluation_path, keyword, instance_location);
    }

    #[test]
    fn condition_annotations_survive() {
        let result = tests_util::evaluate(
            &json!({"if": {"properties": {"a": {}}}, "then": {"type": "object"}}),
            &json!({"a": 1}),
        );
        assert!(result.valid());
        let condition = &result.root().children()[0];
        assert_eq!(condition.annotation("properties"), Some(&json!(["a"])));
    }
}
