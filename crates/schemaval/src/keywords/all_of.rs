use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{CompilationResult, Evaluate},
    node::SchemaNode,
    paths::PathChunk,
};

pub(crate) struct AllOfEvaluator {
    nodes: Vec<SchemaNode>,
}

impl Evaluate for AllOfEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        let mut all_valid = true;
        for (idx, node) in self.nodes.iter().enumerate() {
            let valid = ctx.apply(
                node,
                &[PathChunk::Keyword("allOf"), PathChunk::Index(idx)],
                instance,
                None,
            )?;
            all_valid &= valid;
            if !valid && ctx.applies_optimizations() {
                break;
            }
        }
        if !all_valid {
            ctx.error(format!(
                "{instance} is not valid under all of the schemas listed in the 'allOf' keyword"
            ));
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
            ctx.malformed("the value of 'allOf' must be an array of schemas")
        ));
    };
    let mut nodes = Vec::with_capacity(subschemas.len());
    for (idx, subschema) in subschemas.iter().enumerate() {
        match ctx.subschema(
            subschema,
            &[PathChunk::Keyword("allOf"), PathChunk::Index(idx)],
        ) {
            Ok(node) => nodes.push(node),
            Err(error) => return Some(Err(error)),
        }
    }
    Some(Ok(Box::new(AllOfEvaluator { nodes })))
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"allOf": [{"type": "integer"}, {"minimum": 0}]}), &json!(3))]
    #[test_case(&json!({"allOf": []}), &json!(3); "empty allOf")]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"allOf": [{"type": "integer"}, {"minimum": 0}]}), &json!(-3))]
    #[test_case(&json!({"allOf": [{"type": "integer"}, {"minimum": 0}]}), &json!("x"))]
    fn is_not_valid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn every_branch_leaves_a_child_result() {
        let result = tests_util::evaluate(
            &json!({"allOf": [{"type": "integer"}, {"minimum": 0}]}),
            &json!(-3),
        );
        assert!(!result.valid());
        let children = result.root().children();
        assert_eq!(children.len(), 2);
        assert!(children[0].valid());
        assert!(!children[1].valid());
    }
}
