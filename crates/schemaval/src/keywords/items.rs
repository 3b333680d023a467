use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{CompilationResult, Evaluate},
    node::SchemaNode,
    paths::PathChunk,
};

/// Schema-form `items`: applies one subschema to every element past the
/// prefix established by `prefixItems` (2020-12 and later; earlier dialects
/// have no prefix, so it starts at the first element).
pub(crate) struct ItemsEvaluator {
    node: SchemaNode,
}

impl ItemsEvaluator {
    fn offset(ctx: &EvalContext<'_>) -> Option<usize> {
        match ctx.annotation("prefixItems") {
            Some(Value::Bool(true)) => None,
            Some(Value::Number(n)) => Some(n.as_u64().map_or(0, |n| n as usize + 1)),
            _ => Some(0),
        }
    }

    fn apply_sequential(
        &self,
        ctx: &mut EvalContext<'_>,
        items: &[Value],
        offset: usize,
    ) -> Result<bool, EvaluationError> {
        let mut all_valid = true;
        for (idx, child) in items.iter().enumerate().skip(offset) {
            let valid = ctx.apply(
                &self.node,
                &[PathChunk::Keyword("items")],
                child,
                Some(PathChunk::Index(idx)),
            )?;
            all_valid &= valid;
            if !valid && ctx.applies_optimizations() {
                break;
            }
        }
        Ok(all_valid)
    }

    /// Fan element evaluation out over a thread pool. Each branch owns a
    /// forked context; results merge in index order, so the result tree is
    /// identical to the sequential one.
    #[cfg(feature = "parallel")]
    fn apply_parallel(
        &self,
        ctx: &mut EvalContext<'_>,
        items: &[Value],
        offset: usize,
    ) -> Result<bool, EvaluationError> {
        use rayon::prelude::*;

        let shared = &*ctx;
        let branches: Vec<Result<(bool, crate::result::EvaluationNode), EvaluationError>> = items
            [offset..]
            .par_iter()
            .enumerate()
            .map(|(idx, child)| {
                let mut fork = shared.fork(&self.node);
                let valid = fork.apply(
                    &self.node,
                    &[PathChunk::Keyword("items")],
                    child,
                    Some(PathChunk::Index(offset + idx)),
                )?;
                let mut children = fork.into_branch_result().into_children();
                Ok((valid, children.pop().expect("The branch applied one subschema")))
            })
            .collect();

        let mut all_valid = true;
        for branch in branches {
            let (valid, child) = branch?;
            all_valid &= valid;
            ctx.push_child_result(child);
        }
        Ok(all_valid)
    }
}

impl Evaluate for ItemsEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        let Value::Array(items) = instance else {
            return Ok(());
        };
        let Some(offset) = Self::offset(ctx) else {
            // The prefix already covered the whole array.
            ctx.annotate(Value::Bool(true));
            return Ok(());
        };
        #[cfg(feature = "parallel")]
        let all_valid = if ctx.applies_optimizations() {
            self.apply_sequential(ctx, items, offset)?
        } else {
            self.apply_parallel(ctx, items, offset)?
        };
        #[cfg(not(feature = "parallel"))]
        let all_valid = self.apply_sequential(ctx, items, offset)?;
        if all_valid {
            ctx.annotate(Value::Bool(true));
        } else {
            ctx.invalidate();
        }
        Ok(())
    }
}

/// Array-form `items` from the pre-2020 dialects: one subschema per index.
/// The annotation is the largest applied index, or `true` when the whole
/// array was covered.
pub(crate) struct LegacyItemsEvaluator {
    nodes: Vec<SchemaNode>,
}

impl Evaluate for LegacyItemsEvaluator {
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
                &[PathChunk::Keyword("items"), PathChunk::Index(idx)],
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
    if value.is_array() {
        return Some(Err(ctx.malformed(
            "array-form 'items' was replaced by 'prefixItems' in this dialect",
        )));
    }
    match ctx.subschema(value, &[PathChunk::Keyword("items")]) {
        Ok(node) => Some(Ok(Box::new(ItemsEvaluator { node }))),
        Err(error) => Some(Err(error)),
    }
}

#[inline]
pub(crate) fn compile_legacy(
    ctx: &compiler::Context,
    _: &Map<String, Value>,
    value: &Value,
) -> Option<CompilationResult> {
    match value {
        Value::Array(subschemas) => {
            let mut nodes = Vec::with_capacity(subschemas.len());
            for (idx, subschema) in subschemas.iter().enumerate() {
                match ctx.subschema(
                    subschema,
                    &[PathChunk::Keyword("items"), PathChunk::Index(idx)],
                ) {
                    Ok(node) => nodes.push(node),
                    Err(error) => return Some(Err(error)),
                }
            }
            Some(Ok(Box::new(LegacyItemsEvaluator { nodes })))
        }
        _ => match ctx.subschema(value, &[PathChunk::Keyword("items")]) {
            Ok(node) => Some(Ok(Box::new(ItemsEvaluator { node }))),
            Err(error) => Some(Err(error)),
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"items": {"type": "integer"}}), &json!([1, 2, 3]))]
    #[test_case(&json!({"items": {"type": "integer"}}), &json!([]))]
    #[test_case(&json!({"items": {"type": "integer"}}), &json!({"0": "x"}); "not an array")]
    #[test_case(&json!({"prefixItems": [{"type": "string"}], "items": {"type": "integer"}}), &json!(["x", 1, 2]))]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"items": {"type": "integer"}}), &json!([1, "x"]))]
    #[test_case(&json!({"prefixItems": [{}], "items": false}), &json!([1, 2]))]
    fn is_not_valid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn error_location_points_to_the_failing_element() {
        tests_util::assert_error_at(
            &json!({"items": {"type": "integer"}}),
            &json!([1, 2, "x"]),
            "/items",
            "type",
            "/2",
        );
    }

    #[test]
    fn legacy_array_form() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "items": [{"type": "string"}, {"type": "integer"}]
        });
        tests_util::is_valid(&schema, &json!(["x", 1]));
        tests_util::is_valid(&schema, &json!(["x", 1, "anything"]));
        tests_util::is_not_valid(&schema, &json!([1, 1]));
    }

    #[test]
    fn array_form_is_rejected_in_2020_12() {
        tests_util::expect_malformed(&json!({"items": [{"type": "string"}]}));
    }

    #[test]
    fn annotation_reports_full_coverage() {
        let result = tests_util::evaluate(&json!({"items": {}}), &json!([1, 2]));
        assert_eq!(result.root().annotation("items"), Some(&json!(true)));
    }
}
