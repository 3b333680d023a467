use serde_json::Value;

use crate::{
    context::EvalContext,
    error::EvaluationError,
    keywords::{BoxedKeyword, Evaluate},
};

/// A keyword that only publishes its raw value under its own name: the
/// meta-data keywords (`title`, `description`, ...), advisory embedded
/// `$schema`, and unknown keywords under `process_custom_keywords`.
pub(crate) struct AnnotationEvaluator {
    value: Value,
}

impl Evaluate for AnnotationEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, _: &Value) -> Result<(), EvaluationError> {
        ctx.annotate(self.value.clone());
        Ok(())
    }
}

#[inline]
pub(crate) fn compile(value: Value) -> BoxedKeyword {
    Box::new(AnnotationEvaluator { value })
}
