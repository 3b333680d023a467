use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{CompilationResult, Evaluate},
    node::SchemaNode,
    paths::PathChunk,
};

pub(crate) struct PrefixItemsEvaluator {
    nodes: Vec<SchemaNode>,
}

impl Evaluate for PrefixItemsEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        let Value::Array(items) = instance else {
            return Ok(());
        };
        if self.nodes.is_empty() {
            return Ok(());
        }
        let mut all_valid = true;
        for (idx, (node, child)) in self.nodes.iter().zip(items).enumerate() {
            let valid = ctx.apply(
                node,
                &[PathChunk::Keyword("prefixItems"), PathChunk::Index(idx)],
                child,
                Some(PathChunk::Index(idx)),
            )?;
            all_valid &= valid;
            if !valid && ctx.applies_optimizations() {
                break;
            }
        }
        if all_valid {
            if self.nodes.len() >= items.len() {
                ctx.annotate(Value::Bool(true));
            } else {
                ctx.annotate(Value::from(self.nodes.len() - 1));
            }
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
    let Value::Array(subschemas) = value else {
        return Some(Err(
            ctx.malformed("the value of 'prefixItems' must be an array of schemas")
        ));
    };
    let mut nodes = Vec::with_capacity(subschemas.len());
    for (idx, subschema) in subschemas.iter().enumerate() {
        match ctx.subschema(
            subschema,
            &[PathChunk::Keyword("prefixItems"), PathChunk::Index(idx)],
        ) {
            Ok(node) => nodes.push(node),
            Err(error) => return Some(Err(error)),
        }
    }
    Some(Ok(Box::new(PrefixItemsEvaluator { nodes })))
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"prefixItems": [{"type": "string"}, {"type": "integer"}]}), &json!(["x", 1]))]
    #[test_case(&json!({"prefixItems": [{"type": "string"}]}), &json!([]); "shorter array")]
    #[test_case(&json!({"prefixItems": [{"type": "string"}]}), &json!(["x", 999]); "extra elements are unconstrained")]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"prefixItems": [{"type": "string"}]}), &json!([1]))]
    fn is_not_valid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn annotation_reports_largest_index() {
        let result = tests_util::evaluate(&json!({"prefixItems": [{}, {}]}), &json!([1, 2, 3]));
        assert_eq!(result.root().annotation("prefixItems"), Some(&json!(1)));
        let result = tests_util::evaluate(&json!({"prefixItems": [{}, {}]}), &json!([1, 2]));
        assert_eq!(result.root().annotation("prefixItems"), Some(&json!(true)));
    }
}
