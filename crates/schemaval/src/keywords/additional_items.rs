use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{CompilationResult, Evaluate},
    node::SchemaNode,
    paths::PathChunk,
};

/// Pre-2020 `additionalItems`: constrains the elements past the prefix
/// established by array-form `items`, read from its annotation.
pub(crate) struct AdditionalItemsEvaluator {
    node: SchemaNode,
}

impl Evaluate for AdditionalItemsEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        let Value::Array(items) = instance else {
            return Ok(());
        };
        let offset = match ctx.annotation("items") {
            Some(Value::Number(n)) => n.as_u64().map_or(0, |n| n as usize + 1),
            // Schema-form `items` (or a failed sibling) leaves nothing here.
            _ => return Ok(()),
        };
        let mut all_valid = true;
        for (idx, child) in items.iter().enumerate().skip(offset) {
            let valid = ctx.apply(
                &self.node,
                &[PathChunk::Keyword("additionalItems")],
                child,
                Some(PathChunk::Index(idx)),
            )?;
            all_valid &= valid;
            if !valid && ctx.applies_optimizations() {
                break;
            }
        }
        if all_valid {
            ctx.annotate(Value::Bool(true));
        } else {
            ctx.invalidate();
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
    // Only meaningful next to array-form `items`.
    if !parent.get("items").is_some_and(Value::is_array) {
        return None;
    }
    match ctx.subschema(value, &[PathChunk::Keyword("additionalItems")]) {
        Ok(node) => Some(Ok(Box::new(AdditionalItemsEvaluator { node }))),
        Err(error) => Some(Err(error)),
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    fn draft7(schema: Value) -> Value {
        let mut schema = schema;
        schema["$schema"] = json!("http://json-schema.org/draft-07/schema#");
        schema
    }

    #[test_case(json!({"items": [{}], "additionalItems": {"type": "integer"}}), json!([null, 1, 2]))]
    #[test_case(json!({"items": [{}], "additionalItems": false}), json!([null]); "nothing past the prefix")]
    #[test_case(json!({"items": {}, "additionalItems": false}), json!([1, 2]); "ignored next to schema-form items")]
    #[test_case(json!({"additionalItems": false}), json!([1, 2]); "ignored without items")]
    fn is_valid(schema: Value, instance: Value) {
        tests_util::is_valid(&draft7(schema), &instance);
    }

    #[test_case(json!({"items": [{}], "additionalItems": {"type": "integer"}}), json!([null, "x"]))]
    #[test_case(json!({"items": [{}, {}, {}], "additionalItems": false}), json!([1, 2, 3, 4]))]
    fn is_not_valid(schema: Value, instance: Value) {
        tests_util::is_not_valid(&draft7(schema), &instance);
    }
}
