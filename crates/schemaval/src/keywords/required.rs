use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{CompilationResult, Evaluate},
};

pub(crate) struct RequiredEvaluator {
    required: Vec<String>,
}

impl Evaluate for RequiredEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if let Value::Object(item) = instance {
            for name in &self.required {
                if !item.contains_key(name) {
                    ctx.error(format!("\"{name}\" is a required property"));
                }
            }
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
    let Value::Array(names) = value else {
        return Some(Err(
            ctx.malformed("the value of 'required' must be an array of strings")
        ));
    };
    let mut required = Vec::with_capacity(names.len());
    for name in names {
        match name.as_str() {
            Some(name) => required.push(name.to_string()),
            None => {
                return Some(Err(
                    ctx.malformed("the value of 'required' must be an array of strings")
                ))
            }
        }
    }
    Some(Ok(Box::new(RequiredEvaluator { required })))
}
