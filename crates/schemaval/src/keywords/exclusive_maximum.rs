use serde_json::{Map, Number, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{helpers, CompilationResult, Evaluate},
};

pub(crate) struct ExclusiveMaximumEvaluator {
    limit: Number,
}

impl Evaluate for ExclusiveMaximumEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if let Value::Number(number) = instance {
            if helpers::num_ge(number, &self.limit) {
                ctx.error(format!(
                    "{instance} is greater than or equal to the maximum of {}",
                    self.limit
                ));
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
    let Value::Number(limit) = value else {
        return Some(Err(
            ctx.malformed("the value of 'exclusiveMaximum' must be a number")
        ));
    };
    Some(Ok(Box::new(ExclusiveMaximumEvaluator {
        limit: limit.clone(),
    })))
}
