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

pub(crate) struct AdditionalPropertiesEvaluator {
    node: SchemaNode,
}

/// Property names already claimed by `properties` and `patternProperties`,
/// read from their annotations on the current frame. A failed sibling
/// publishes nothing, so its members fall through to this keyword.
fn claimed_names(ctx: &EvalContext<'_>) -> AHashSet<String> {
    let mut claimed = AHashSet::new();
    for producer in ["properties", "patternProperties"] {
        if let Some(Value::Array(names)) = ctx.annotation(producer) {
            claimed.extend(names.iter().filter_map(Value::as_str).map(str::to_string));
        }
    }
    claimed
}

fn unexpected_message(unexpected: &[&str]) -> String {
    let names = unexpected
        .iter()
        .map(|name| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(", ");
    if unexpected.len() == 1 {
        format!("Additional properties are not allowed ({names} was unexpected)")
    } else {
        format!("Additional properties are not allowed ({names} were unexpected)")
    }
}

impl Evaluate for AdditionalPropertiesEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        let Value::Object(item) = instance else {
            return Ok(());
        };
        let claimed = claimed_names(ctx);
        // `additionalProperties: false` reports the offending names in one
        // message instead of a child result per member.
        if matches!(self.node.kind(), NodeKind::Boolean(false)) {
            let unexpected: Vec<&str> = item
                .keys()
                .filter(|name| !claimed.contains(name.as_str()))
                .map(String::as_str)
                .collect();
            if unexpected.is_empty() {
                ctx.annotate(Value::Array(Vec::new()));
            } else {
                ctx.error(unexpected_message(&unexpected));
            }
            return Ok(());
        }
        let mut applied = Vec::new();
        let mut all_valid = true;
        for (name, child) in item {
            if claimed.contains(name.as_str()) {
                continue;
            }
            let valid = ctx.apply(
                &self.node,
                &[PathChunk::Keyword("additionalProperties")],
                child,
                Some(PathChunk::Property(name.clone().into_boxed_str())),
            )?;
            all_valid &= valid;
            applied.push(Value::String(name.clone()));
            if !valid && ctx.applies_optimizations() {
                break;
            }
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
    match ctx.subschema(value, &[PathChunk::Keyword("additionalProperties")]) {
        Ok(node) => Some(Ok(Box::new(AdditionalPropertiesEvaluator { node }))),
        Err(error) => Some(Err(error)),
    }
}
