use serde_json::{Map, Number, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{helpers, CompilationResult, Evaluate},
};

pub(crate) struct ExclusiveMinimumEvaluator {
    limit: Number,
}

impl Evaluate for ExclusiveMinimumEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if let Value::Number(number) = instance {
            if helpers::num_le(number, &self.limit) {
                ctx.error(format!(
                    "{instance} is less than or equal to the minimum of {}",
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
            ctx.malformed("the value of 'exclusiveMinimum' must be a number")
        ));
    };
    Some(Ok(Box::new(ExclusiveMinimumEvaluator {
        limit: limit.clone(),
    })))
}
