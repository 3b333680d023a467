use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{CompilationResult, Evaluate},
    node::SchemaNode,
    paths::PathChunk,
};

pub(crate) struct PropertyNamesEvaluator {
    node: SchemaNode,
}

impl Evaluate for PropertyNamesEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        let Value::Object(item) = instance else {
            return Ok(());
        };
        let mut all_valid = true;
        for name in item.keys() {
            // The instance under evaluation is the member *name* itself.
            let name_value = Value::String(name.clone());
            let valid = ctx.apply(
                &self.node,
                &[PathChunk::Keyword("propertyNames")],
                &name_value,
                None,
            )?;
            all_valid &= valid;
            if !valid && ctx.applies_optimizations() {
                break;
            }
        }
        if !all_valid {
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
    match ctx.subschema(value, &[PathChunk::Keyword("propertyNames")]) {
        Ok(node) => Some(Ok(Box::new(PropertyNamesEvaluator { node }))),
        Err(error) => Some(Err(error)),
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"propertyNames": {"maxLength": 3}}), &json!({"ab": 1, "abc": 2}))]
    #[test_case(&json!({"propertyNames": {"maxLength": 3}}), &json!([1, 2]); "not an object")]
    #[test_case(&json!({"propertyNames": false}), &json!({}); "false allows no names at all")]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"propertyNames": {"maxLength": 3}}), &json!({"abcd": 1}))]
    #[test_case(&json!({"propertyNames": false}), &json!({"a": 1}))]
    fn is_not_valid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }
}
