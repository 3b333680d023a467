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

const PRODUCERS: &[&str] = &[
    "additionalItems",
    "contains",
    "items",
    "prefixItems",
    "unevaluatedItems",
];

/// Which elements the sibling (and nested same-location) applicators already
/// evaluated: a covered prefix plus individual indices from `contains`.
struct Coverage {
    all: bool,
    prefix: usize,
    indices: AHashSet<usize>,
}

fn coverage(ctx: &EvalContext<'_>) -> Coverage {
    let mut all = false;
    let mut prefix = 0usize;
    let mut indices = AHashSet::new();
    for value in ctx.gathered_annotations(PRODUCERS) {
        match value {
            Value::Bool(true) => all = true,
            Value::Number(n) => {
                if let Some(n) = n.as_u64() {
                    prefix = prefix.max(n as usize + 1);
                }
            }
            Value::Array(items) => {
                indices.extend(items.iter().filter_map(Value::as_u64).map(|idx| idx as usize));
            }
            _ => {}
        }
    }
    Coverage {
        all,
        prefix,
        indices,
    }
}

pub(crate) struct UnevaluatedItemsEvaluator {
    node: SchemaNode,
}

impl Evaluate for UnevaluatedItemsEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        let Value::Array(items) = instance else {
            return Ok(());
        };
        let coverage = coverage(ctx);
        if coverage.all {
            ctx.annotate(Value::Bool(true));
            return Ok(());
        }
        if matches!(self.node.kind(), NodeKind::Boolean(false)) {
            let unevaluated: Vec<usize> = (coverage.prefix..items.len())
                .filter(|idx| !coverage.indices.contains(idx))
                .collect();
            if unevaluated.is_empty() {
                ctx.annotate(Value::Bool(true));
            } else {
                ctx.error(format!(
                    "Unevaluated items are not allowed ({} {} unexpected)",
                    unevaluated
                        .iter()
                        .map(|idx| items[*idx].to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    if unevaluated.len() == 1 { "was" } else { "were" }
                ));
            }
            return Ok(());
        }
        let mut all_valid = true;
        for (idx, child) in items.iter().enumerate().skip(coverage.prefix) {
            if coverage.indices.contains(&idx) {
                continue;
            }
            let valid = ctx.apply(
                &self.node,
                &[PathChunk::Keyword("unevaluatedItems")],
                child,
                Some(PathChunk::Index(idx)),
            )?;
            all_valid &= valid;
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
    _: &Map<String, Value>,
    value: &Value,
) -> Option<CompilationResult> {
    match ctx.subschema(value, &[PathChunk::Keyword("unevaluatedItems")]) {
        Ok(node) => Some(Ok(Box::new(UnevaluatedItemsEvaluator { node }))),
        Err(error) => Some(Err(error)),
    }
}
