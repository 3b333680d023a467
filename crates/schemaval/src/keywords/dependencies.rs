use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{CompilationResult, Evaluate},
    node::SchemaNode,
    paths::PathChunk,
};

enum Dependency {
    /// Properties that must accompany the trigger property.
    Required(Vec<String>),
    /// A subschema the whole object must satisfy when the trigger is present.
    Schema(SchemaNode),
}

pub(crate) struct DependenciesEvaluator {
    keyword: &'static str,
    dependencies: Vec<(String, Dependency)>,
}

impl Evaluate for DependenciesEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        let Value::Object(item) = instance else {
            return Ok(());
        };
        for (trigger, dependency) in &self.dependencies {
            if !item.contains_key(trigger) {
                continue;
            }
            match dependency {
                Dependency::Required(names) => {
                    for name in names {
                        if !item.contains_key(name) {
                            ctx.error(format!(
                                "\"{name}\" is required when \"{trigger}\" is present"
                            ));
                        }
                    }
                }
                Dependency::Schema(node) => {
                    let valid = ctx.apply(
                        node,
                        &[
                            PathChunk::Keyword(self.keyword),
                            PathChunk::Property(trigger.clone().into_boxed_str()),
                        ],
                        instance,
                        None,
                    )?;
                    if !valid {
                        ctx.invalidate();
                    }
                }
            }
        }
        Ok(())
    }
}

fn parse_required(
    ctx: &compiler::Context,
    keyword: &str,
    names: &[Value],
) -> Result<Vec<String>, EvaluationError> {
    names
        .iter()
        .map(|name| {
            name.as_str().map(str::to_string).ok_or_else(|| {
                ctx.malformed(format!("'{keyword}' property lists must contain strings"))
            })
        })
        .collect()
}

fn compile_impl(
    ctx: &compiler::Context,
    value: &Value,
    keyword: &'static str,
    allow_required: bool,
    allow_schemas: bool,
) -> Option<CompilationResult> {
    let Value::Object(map) = value else {
        return Some(Err(
            ctx.malformed(format!("the value of '{keyword}' must be an object"))
        ));
    };
    let mut dependencies = Vec::with_capacity(map.len());
    for (trigger, dependency) in map {
        let parsed = match dependency {
            Value::Array(names) if allow_required => {
                match parse_required(ctx, keyword, names) {
                    Ok(names) => Dependency::Required(names),
                    Err(error) => return Some(Err(error)),
                }
            }
            subschema if allow_schemas && !subschema.is_array() => {
                match ctx.subschema(
                    subschema,
                    &[
                        PathChunk::Keyword(keyword),
                        PathChunk::Property(trigger.clone().into_boxed_str()),
                    ],
                ) {
                    Ok(node) => Dependency::Schema(node),
                    Err(error) => return Some(Err(error)),
                }
            }
            _ => {
                return Some(Err(ctx.malformed(format!(
                    "'{keyword}' does not allow this dependency form"
                ))))
            }
        };
        dependencies.push((trigger.clone(), parsed));
    }
    Some(Ok(Box::new(DependenciesEvaluator {
        keyword,
        dependencies,
    })))
}

/// Draft 6/7 `dependencies`: property lists and subschemas mixed freely.
#[inline]
pub(crate) fn compile_legacy(
    ctx: &compiler::Context,
    _: &Map<String, Value>,
    value: &Value,
) -> Option<CompilationResult> {
    compile_impl(ctx, value, "dependencies", true, true)
}

#[inline]
pub(crate) fn compile_dependent_required(
    ctx: &compiler::Context,
    _: &Map<String, Value>,
    value: &Value,
) -> Option<CompilationResult> {
    compile_impl(ctx, value, "dependentRequired", true, false)
}

#[inline]
pub(crate) fn compile_dependent_schemas(
    ctx: &compiler::Context,
    _: &Map<String, Value>,
    value: &Value,
) -> Option<CompilationResult> {
    compile_impl(ctx, value, "dependentSchemas", false, true)
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"dependentRequired": {"a": ["b"]}}), &json!({"a": 1, "b": 2}))]
    #[test_case(&json!({"dependentRequired": {"a": ["b"]}}), &json!({"c": 1}); "trigger absent")]
    #[test_case(&json!({"dependentSchemas": {"a": {"minProperties": 2}}}), &json!({"a": 1, "b": 2}))]
    #[test_case(&json!({"dependentRequired": {"a": ["b"]}}), &json!(7); "not an object")]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(
        &json!({"dependentRequired": {"a": ["b"]}}),
        &json!({"a": 1}),
        r#""b" is required when "a" is present"#
    )]
    fn error_message(schema: &Value, instance: &Value, expected: &str) {
        tests_util::expect_error_message(schema, instance, expected);
    }

    #[test]
    fn legacy_dependencies_mix_forms() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "dependencies": {
                "a": ["b"],
                "c": {"minProperties": 2}
            }
        });
        tests_util::is_valid(&schema, &json!({"a": 1, "b": 2}));
        tests_util::is_not_valid(&schema, &json!({"a": 1}));
        tests_util::is_not_valid(&schema, &json!({"c": 1}));
    }

    #[test]
    fn dependent_schemas_reject_array_values() {
        tests_util::expect_malformed(&json!({"dependentSchemas": {"a": ["b"]}}));
    }
}
