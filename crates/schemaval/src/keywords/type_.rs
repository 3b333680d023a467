use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{helpers, CompilationResult, Evaluate},
    primitive_type::{PrimitiveType, PrimitiveTypesBitMap},
};

pub(crate) struct TypeEvaluator {
    types: PrimitiveTypesBitMap,
    multiple: bool,
}

impl TypeEvaluator {
    fn matches(&self, instance: &Value) -> bool {
        match instance {
            Value::Null => self.types.contains_type(PrimitiveType::Null),
            Value::Bool(_) => self.types.contains_type(PrimitiveType::Boolean),
            Value::String(_) => self.types.contains_type(PrimitiveType::String),
            Value::Array(_) => self.types.contains_type(PrimitiveType::Array),
            Value::Object(_) => self.types.contains_type(PrimitiveType::Object),
            Value::Number(number) => {
                self.types.contains_type(PrimitiveType::Number)
                    || (self.types.contains_type(PrimitiveType::Integer)
                        && helpers::is_integer(number))
            }
        }
    }

    fn message(&self, instance: &Value) -> String {
        let names: Vec<String> = self.types.iter().map(|ty| format!("\"{ty}\"")).collect();
        if self.multiple {
            format!("{instance} is not of types {}", names.join(", "))
        } else {
            format!("{instance} is not of type {}", names.join(", "))
        }
    }
}

impl Evaluate for TypeEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if !self.matches(instance) {
            ctx.error(self.message(instance));
        }
        Ok(())
    }
}

fn parse_type(ctx: &compiler::Context, value: &Value) -> Result<PrimitiveType, EvaluationError> {
    value
        .as_str()
        .and_then(|name| PrimitiveType::try_from(name).ok())
        .ok_or_else(|| ctx.malformed(format!("{value} is not a JSON type name")))
}

#[inline]
pub(crate) fn compile(
    ctx: &compiler::Context,
    _: &Map<String, Value>,
    value: &Value,
) -> Option<CompilationResult> {
    match value {
        Value::String(_) => Some(parse_type(ctx, value).map(|ty| {
            Box::new(TypeEvaluator {
                types: PrimitiveTypesBitMap::new().add_type(ty),
                multiple: false,
            }) as _
        })),
        Value::Array(values) => {
            let mut types = PrimitiveTypesBitMap::new();
            for value in values {
                match parse_type(ctx, value) {
                    Ok(ty) => types = types.add_type(ty),
                    Err(error) => return Some(Err(error)),
                }
            }
            Some(Ok(Box::new(TypeEvaluator {
                types,
                multiple: true,
            })))
        }
        _ => Some(Err(ctx.malformed(
            "the value of 'type' must be a string or an array of strings",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"type": "integer"}), &json!(1))]
    #[test_case(&json!({"type": "integer"}), &json!(1.0); "a mathematical integer")]
    #[test_case(&json!({"type": "number"}), &json!(42))]
    #[test_case(&json!({"type": ["integer", "string"]}), &json!("x"))]
    #[test_case(&json!({"type": "null"}), &json!(null))]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"type": "integer"}), &json!(1.1), r#"1.1 is not of type "integer""#)]
    #[test_case(&json!({"type": ["integer", "string"]}), &json!(null), r#"null is not of types "integer", "string""#)]
    #[test_case(&json!({"type": "object"}), &json!([]), r#"[] is not of type "object""#)]
    fn error_message(schema: &Value, instance: &Value, expected: &str) {
        tests_util::expect_error_message(schema, instance, expected);
    }

    #[test]
    fn malformed_type() {
        tests_util::expect_malformed(&json!({"type": "integr"}));
        tests_util::expect_malformed(&json!({"type": 1}));
    }
}
