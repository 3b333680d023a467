use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{helpers, CompilationResult, Evaluate},
    node::SchemaNode,
    paths::PathChunk,
};

/// `contains`, parameterized by `minContains`/`maxContains` where the
/// dialect supports them (a `minContains` of zero makes an empty match set
/// acceptable).
pub(crate) struct ContainsEvaluator {
    node: SchemaNode,
    min_contains: u64,
    max_contains: Option<u64>,
}

impl Evaluate for ContainsEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        let Value::Array(items) = instance else {
            return Ok(());
        };
        let mut matched = Vec::new();
        for (idx, child) in items.iter().enumerate() {
            let valid = ctx.apply(
                &self.node,
                &[PathChunk::Keyword("contains")],
                child,
                Some(PathChunk::Index(idx)),
            )?;
            if valid {
                matched.push(idx);
            }
            if ctx.applies_optimizations()
                && self.max_contains.is_none()
                && matched.len() as u64 >= self.min_contains
            {
                break;
            }
        }
        let count = matched.len() as u64;
        if count < self.min_contains {
            if count == 0 && self.min_contains == 1 {
                ctx.error(format!("None of {instance} are valid under the given schema"));
            } else {
                ctx.error(format!(
                    "{instance} contains fewer than {} matching items",
                    self.min_contains
                ));
            }
            return Ok(());
        }
        if let Some(max_contains) = self.max_contains {
            if count > max_contains {
                ctx.error(format!(
                    "{instance} contains more than {max_contains} matching items"
                ));
                return Ok(());
            }
        }
        if matched.len() == items.len() {
            ctx.annotate(Value::Bool(true));
        } else {
            ctx.annotate(Value::Array(matched.into_iter().map(Value::from).collect()));
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
    let node = match ctx.subschema(value, &[PathChunk::Keyword("contains")]) {
        Ok(node) => node,
        Err(error) => return Some(Err(error)),
    };
    let mut min_contains = 1;
    let mut max_contains = None;
    if ctx.draft() >= referencing::Draft::Draft201909 {
        if let Some(value) = parent.get("minContains") {
            match helpers::parse_bound(value) {
                Some(bound) => min_contains = bound,
                None => {
                    return Some(Err(ctx.malformed(
                        "the value of 'minContains' must be a non-negative integer",
                    )))
                }
            }
        }
        if let Some(value) = parent.get("maxContains") {
            match helpers::parse_bound(value) {
                Some(bound) => max_contains = Some(bound),
                None => {
                    return Some(Err(ctx.malformed(
                        "the value of 'maxContains' must be a non-negative integer",
                    )))
                }
            }
        }
    }
    Some(Ok(Box::new(ContainsEvaluator {
        node,
        min_contains,
        max_contains,
    })))
}
