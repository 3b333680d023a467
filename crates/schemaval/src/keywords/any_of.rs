use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{CompilationResult, Evaluate},
    node::SchemaNode,
    paths::PathChunk,
};

pub(crate) struct AnyOfEvaluator {
    nodes: Vec<SchemaNode>,
}

impl Evaluate for AnyOfEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        let mut any_valid = false;
        for (idx, node) in self.nodes.iter().enumerate() {
            let valid = ctx.apply(
                node,
                &[PathChunk::Keyword("anyOf"), PathChunk::Index(idx)],
                instance,
                None,
            )?;
            any_valid |= valid;
            // Annotation collection needs every branch; without it the first
            // success settles the verdict.
            if valid && ctx.applies_optimizations() {
                break;
            }
        }
        if !any_valid {
            ctx.error(format!(
                "{instance} is not valid under any of the schemas listed in the 'anyOf' keyword"
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
            ctx.malformed("the value of 'anyOf' must be an array of schemas")
        ));
    };
    let mut nodes = Vec::with_capacity(subschemas.len());
    for (idx, subschema) in subschemas.iter().enumerate() {
        match ctx.subschema(
            subschema,
            &[PathChunk::Keyword("anyOf"), PathChunk::Index(idx)],
        ) {
            Ok(node) => nodes.push(node),
            Err(error) => return Some(Err(error)),
        }
    }
    Some(Ok(Box::new(AnyOfEvaluator { nodes })))
}
