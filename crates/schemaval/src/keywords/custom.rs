use serde_json::{Map, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{BoxedKeyword, Evaluate},
    paths::Location,
};

/// A user-supplied keyword implementation.
///
/// Returning `Ok(Some(value))` publishes `value` as the keyword's
/// annotation; `Ok(None)` succeeds silently; `Err(message)` records a
/// validation failure on the current result node.
pub trait Keyword: Send + Sync {
    fn evaluate(&self, instance: &Value) -> Result<Option<Value>, String>;
}

impl<F> Keyword for F
where
    F: Fn(&Value) -> Result<Option<Value>, String> + Send + Sync,
{
    fn evaluate(&self, instance: &Value) -> Result<Option<Value>, String> {
        self(instance)
    }
}

/// Builds [`Keyword`] instances during compilation. `parent` is the whole
/// schema object, `value` the keyword's own value.
pub trait KeywordFactory: Send + Sync {
    /// # Errors
    ///
    /// Return an error to reject the schema as malformed.
    fn init(
        &self,
        parent: &Map<String, Value>,
        value: &Value,
        location: Location,
    ) -> Result<Box<dyn Keyword>, EvaluationError>;
}

impl<F> KeywordFactory for F
where
    F: Fn(&Map<String, Value>, &Value, Location) -> Result<Box<dyn Keyword>, EvaluationError>
        + Send
        + Sync,
{
    fn init(
        &self,
        parent: &Map<String, Value>,
        value: &Value,
        location: Location,
    ) -> Result<Box<dyn Keyword>, EvaluationError> {
        self(parent, value, location)
    }
}

pub(crate) struct CustomKeyword {
    inner: Box<dyn Keyword>,
}

impl CustomKeyword {
    pub(crate) fn compile(
        ctx: &compiler::Context,
        parent: &Map<String, Value>,
        value: &Value,
        factory: &dyn KeywordFactory,
    ) -> Result<BoxedKeyword, EvaluationError> {
        let inner = factory.init(parent, value, ctx.location().clone())?;
        Ok(Box::new(CustomKeyword { inner }))
    }
}

impl Evaluate for CustomKeyword {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        match self.inner.evaluate(instance) {
            Ok(Some(annotation)) => ctx.annotate(annotation),
            Ok(None) => {}
            Err(message) => ctx.error(message),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Keyword;
    use serde_json::{json, Map, Value};

    struct EvenNumber;

    impl Keyword for EvenNumber {
        fn evaluate(&self, instance: &Value) -> Result<Option<Value>, String> {
            match instance.as_u64() {
                Some(n) if n % 2 == 0 => Ok(Some(json!(n))),
                Some(n) => Err(format!("{n} is not even")),
                None => Err("Value must be a number".to_string()),
            }
        }
    }

    fn factory(
        _: &Map<String, Value>,
        value: &Value,
        _: crate::Location,
    ) -> Result<Box<dyn Keyword>, crate::EvaluationError> {
        if value.as_bool() == Some(true) {
            Ok(Box::new(EvenNumber))
        } else {
            Err(crate::EvaluationError::MalformedSchema {
                location: String::new(),
                reason: "the 'even-number' keyword must be set to true".to_string(),
            })
        }
    }

    #[test]
    fn custom_keyword_validates() {
        let schema = json!({"even-number": true, "type": "integer"});
        let evaluator = crate::options()
            .with_keyword("even-number", factory)
            .build(&schema)
            .expect("Valid schema");
        assert!(evaluator.evaluate(&json!(2)).expect("Evaluates").valid());
        assert!(!evaluator.evaluate(&json!(3)).expect("Evaluates").valid());
        assert!(!evaluator.evaluate(&json!("nope")).expect("Evaluates").valid());
    }

    #[test]
    fn custom_keyword_annotates() {
        let evaluator = crate::options()
            .with_keyword("even-number", factory)
            .build(&json!({"even-number": true}))
            .expect("Valid schema");
        let result = evaluator.evaluate(&json!(4)).expect("Evaluates");
        assert_eq!(result.root().annotation("even-number"), Some(&json!(4)));
    }

    #[test]
    fn factory_errors_are_malformed_schemas() {
        let error = crate::options()
            .with_keyword("even-number", factory)
            .build(&json!({"even-number": "yes"}))
            .expect_err("The factory rejects non-boolean values");
        assert!(matches!(error, crate::EvaluationError::MalformedSchema { .. }));
    }
}
