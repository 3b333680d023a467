use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{CompilationResult, Evaluate},
    node::NodeId,
    paths::PathChunk,
};

/// Apply an interned reference target in a child frame, guarding against
/// schema-level cycles: re-entering the same target at the same instance
/// location means no instance structure was consumed in between.
fn apply_target(
    ctx: &mut EvalContext<'_>,
    target: NodeId,
    keyword: &'static str,
    instance: &Value,
) -> Result<(), EvaluationError> {
    ctx.check_cancelled()?;
    if !ctx.enter_ref(target) {
        return Err(EvaluationError::reference_cycle(
            ctx.node(target).absolute().as_str(),
            ctx.instance_location().to_string(),
        ));
    }
    let node = ctx.node(target);
    let outcome = ctx.apply(node, &[PathChunk::Keyword(keyword)], instance, None);
    ctx.exit_ref(target);
    if !outcome? {
        ctx.invalidate();
    }
    Ok(())
}

pub(crate) struct RefEvaluator {
    target: NodeId,
}

impl Evaluate for RefEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        apply_target(ctx, self.target, "$ref", instance)
    }
}

/// Draft 2019-09 `$recursiveRef`: binds at scope entry. The outermost
/// dynamic scope whose resource root carries `$recursiveAnchor: true` wins;
/// without one, the lexical `#` target applies.
pub(crate) struct RecursiveRefEvaluator {
    fallback: NodeId,
}

impl Evaluate for RecursiveRefEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        let target = ctx.find_recursive_root().unwrap_or(self.fallback);
        if target != self.fallback {
            ctx.narrate(&format!(
                "$recursiveRef reparented to {}",
                ctx.node(target).absolute().as_str()
            ));
        }
        apply_target(ctx, target, "$recursiveRef", instance)
    }
}

/// `$dynamicRef`: reparents to the outermost dynamic scope declaring a
/// matching `$dynamicAnchor`; with no match anywhere it behaves as `$ref`.
pub(crate) struct DynamicRefEvaluator {
    anchor: Option<Box<str>>,
    fallback: NodeId,
}

impl Evaluate for DynamicRefEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        let target = self
            .anchor
            .as_deref()
            .and_then(|name| ctx.find_dynamic_anchor(name))
            .unwrap_or(self.fallback);
        if target != self.fallback {
            ctx.narrate(&format!(
                "$dynamicRef reparented to {}",
                ctx.node(target).absolute().as_str()
            ));
        }
        apply_target(ctx, target, "$dynamicRef", instance)
    }
}

fn reference_of<'s>(
    ctx: &compiler::Context,
    keyword: &str,
    value: &'s Value,
) -> Result<&'s str, EvaluationError> {
    value
        .as_str()
        .ok_or_else(|| ctx.malformed(format!("the value of '{keyword}' must be a string")))
}

#[inline]
pub(crate) fn compile_ref(
    ctx: &compiler::Context,
    _: &Map<String, Value>,
    value: &Value,
) -> Option<CompilationResult> {
    Some(
        reference_of(ctx, "$ref", value)
            .and_then(|reference| ctx.resolve_target(reference))
            .map(|target| Box::new(RefEvaluator { target }) as _),
    )
}

#[inline]
pub(crate) fn compile_recursive_ref(
    ctx: &compiler::Context,
    _: &Map<String, Value>,
    value: &Value,
) -> Option<CompilationResult> {
    Some(
        reference_of(ctx, "$recursiveRef", value)
            .and_then(|reference| {
                if reference != "#" {
                    return Err(
                        ctx.malformed("the value of '$recursiveRef' must be the fragment '#'")
                    );
                }
                ctx.resolve_target(reference)
            })
            .map(|fallback| Box::new(RecursiveRefEvaluator { fallback }) as _),
    )
}

#[inline]
pub(crate) fn compile_dynamic_ref(
    ctx: &compiler::Context,
    _: &Map<String, Value>,
    value: &Value,
) -> Option<CompilationResult> {
    Some(
        reference_of(ctx, "$dynamicRef", value)
            .and_then(|reference| {
                let anchor = reference
                    .split_once('#')
                    .map(|(_, fragment)| fragment)
                    .filter(|fragment| !fragment.is_empty() && !fragment.starts_with('/'))
                    .map(Box::from);
                let fallback = ctx.resolve_target(reference)?;
                Ok(Box::new(DynamicRefEvaluator { anchor, fallback }) as _)
            }),
    )
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(
        &json!({"$ref": "#/$defs/x", "$defs": {"x": {"type": "string"}}}),
        &json!("hi")
    )]
    #[test_case(
        &json!({"properties": {"a": {"$ref": "#/$defs/positive"}}, "$defs": {"positive": {"minimum": 0}}}),
        &json!({"a": 3})
    )]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test]
    fn ref_error_location() {
        tests_util::assert_error_at(
            &json!({
                "properties": {"foo": {"$ref": "#/$defs/foo"}},
                "$defs": {"foo": {"type": "string"}}
            }),
            &json!({"foo": 42}),
            "/properties/foo/$ref",
            "type",
            "/foo",
        );
    }

    #[test]
    fn recursive_schema_over_recursive_data_terminates() {
        let schema = json!({
            "type": "object",
            "properties": {
                "child": {"$ref": "#"}
            }
        });
        tests_util::is_valid(&schema, &json!({"child": {"child": {}}}));
        tests_util::is_not_valid(&schema, &json!({"child": {"child": 1}}));
    }

    #[test]
    fn pure_schema_cycle_is_an_error() {
        let schema = json!({"$ref": "#"});
        let error = crate::options()
            .build(&schema)
            .expect("The cycle is dynamic, not lexical")
            .evaluate(&json!(1))
            .expect_err("A cycle without instance progress");
        assert!(matches!(error, crate::EvaluationError::ReferenceCycle { .. }));
    }

    #[test]
    fn unresolvable_reference() {
        let error = crate::options()
            .build(&json!({"$ref": "#/$defs/missing"}))
            .expect_err("The target does not exist");
        assert!(matches!(
            error,
            crate::EvaluationError::ReferenceResolution { .. }
        ));
    }

    #[test]
    fn dynamic_ref_falls_back_to_plain_ref() {
        let schema = json!({
            "$id": "https://example.com/fallback",
            "$dynamicRef": "#items",
            "$defs": {
                "items": {"$dynamicAnchor": "items", "type": "integer"}
            }
        });
        tests_util::is_valid(&schema, &json!(1));
        tests_util::is_not_valid(&schema, &json!("x"));
    }

    #[test]
    fn dynamic_ref_reparents_to_the_outermost_scope() {
        // The classic tree/strict-tree pair: the outer document redefines
        // the "node" anchor, and the inner $dynamicRef must see it.
        let schema = json!({
            "$id": "https://example.com/strict-tree",
            "$dynamicAnchor": "node",
            "$ref": "https://example.com/tree",
            "unevaluatedProperties": false
        });
        let tree = json!({
            "$id": "https://example.com/tree",
            "$dynamicAnchor": "node",
            "type": "object",
            "properties": {
                "data": true,
                "children": {
                    "type": "array",
                    "items": {"$dynamicRef": "#node"}
                }
            }
        });
        let evaluator = crate::options()
            .with_resource(
                "https://example.com/tree",
                referencing::Draft::Draft202012.create_resource(tree),
            )
            .build(&schema)
            .expect("Valid schema");
        assert!(evaluator
            .evaluate(&json!({"children": [{"data": 1}]}))
            .expect("Evaluates")
            .valid());
        // "daat" is unevaluated in the strict tree, so the reparented
        // subtree must reject it.
        assert!(!evaluator
            .evaluate(&json!({"children": [{"daat": 1}]}))
            .expect("Evaluates")
            .valid());
    }

    #[test]
    fn recursive_ref_reparents_through_recursive_anchors() {
        let extension = json!({
            "$schema": "https://json-schema.org/draft/2019-09/schema",
            "$id": "https://example.com/strict-extension",
            "$recursiveAnchor": true,
            "$ref": "https://example.com/base",
            "unevaluatedProperties": false
        });
        let base = json!({
            "$schema": "https://json-schema.org/draft/2019-09/schema",
            "$id": "https://example.com/base",
            "$recursiveAnchor": true,
            "type": "object",
            "properties": {
                "next": {"$recursiveRef": "#"}
            }
        });
        let evaluator = crate::options()
            .with_resource(
                "https://example.com/base",
                referencing::Draft::Draft201909.create_resource(base),
            )
            .build(&extension)
            .expect("Valid schema");
        assert!(evaluator
            .evaluate(&json!({"next": {"next": {}}}))
            .expect("Evaluates")
            .valid());
        assert!(!evaluator
            .evaluate(&json!({"next": {"surprise": 1}}))
            .expect("Evaluates")
            .valid());
    }
}
