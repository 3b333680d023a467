use serde_json::{Map, Number, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{helpers, CompilationResult, Evaluate},
};

pub(crate) struct MinimumEvaluator {
    limit: Number,
}

impl Evaluate for MinimumEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if let Value::Number(number) = instance {
            if helpers::num_lt(number, &self.limit) {
                ctx.error(format!("{instance} is less than the minimum of {}", self.limit));
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
        return Some(Err(ctx.malformed("the value of 'minimum' must be a number")));
    };
    Some(Ok(Box::new(MinimumEvaluator {
        limit: limit.clone(),
    })))
}
