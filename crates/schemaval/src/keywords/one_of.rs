use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{CompilationResult, Evaluate},
    node::SchemaNode,
    paths::PathChunk,
};

pub(crate) struct OneOfEvaluator {
    nodes: Vec<SchemaNode>,
}

impl Evaluate for OneOfEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        let mut valid_count = 0usize;
        for (idx, node) in self.nodes.iter().enumerate() {
            if ctx.apply(
                node,
                &[PathChunk::Keyword("oneOf"), PathChunk::Index(idx)],
                instance,
                None,
            )? {
                valid_count += 1;
            }
            if valid_count > 1 && ctx.applies_optimizations() {
                break;
            }
        }
        match valid_count {
            1 => {}
            0 => ctx.error(format!(
                "{instance} is not valid under any of the schemas listed in the 'oneOf' keyword"
            )),
            _ => ctx.error(format!(
                "{instance} is valid under more than one of the schemas listed in the 'oneOf' keyword"
            )),
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
            ctx.malformed("the value of 'oneOf' must be an array of schemas")
        ));
    };
    let mut nodes = Vec::with_capacity(subschemas.len());
    for (idx, subschema) in subschemas.iter().enumerate() {
        match ctx.subschema(
            subschema,
            &[PathChunk::Keyword("oneOf"), PathChunk::Index(idx)],
        ) {
            Ok(node) => nodes.push(node),
            Err(error) => return Some(Err(error)),
        }
    }
    Some(Ok(Box::new(OneOfEvaluator { nodes })))
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]}), &json!(1))]
    #[test_case(&json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]}), &json!(2.5))]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(
        &json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]}),
        &json!(1.1),
        "1.1 is not valid under any of the schemas listed in the 'oneOf' keyword"
    )]
    #[test_case(
        &json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]}),
        &json!(3),
        "3 is valid under more than one of the schemas listed in the 'oneOf' keyword"
    )]
    fn error_message(schema: &Value, instance: &Value, expected: &str) {
        tests_util::expect_error_message(schema, instance, expected);
    }
}
