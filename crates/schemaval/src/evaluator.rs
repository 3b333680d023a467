//! The compiled evaluator and the evaluation result it produces.
use std::sync::Arc;

use referencing::Draft;
use serde_json::Value;

use crate::{
    context::EvalContext,
    error::EvaluationError,
    node::{Arena, NodeId},
    options::EvaluationOptions,
    output::{BasicOutput, DetailedOutput, FlagOutput, OutputFormat, VerboseOutput},
    result::EvaluationNode,
};

/// A compiled JSON Schema evaluator.
///
/// Construction resolves every reference reachable from the root schema and
/// orders keywords for dispatch; evaluation is then a pure traversal. An
/// evaluator is immutable and can be shared across threads; every call to
/// [`Evaluator::evaluate`] runs on its own context.
pub struct Evaluator {
    root: NodeId,
    arena: Arena,
    config: Arc<EvaluationOptions>,
}

impl Evaluator {
    pub(crate) fn new(root: NodeId, arena: Arena, config: Arc<EvaluationOptions>) -> Self {
        Evaluator {
            root,
            arena,
            config,
        }
    }

    /// Evaluate `instance` and produce the result tree.
    ///
    /// Validation failures are data in the result; an `Err` here means the
    /// evaluation could not run to completion at all (reference cycle,
    /// cancellation).
    pub fn evaluate(&self, instance: &Value) -> Result<Evaluation, EvaluationError> {
        let mut ctx = EvalContext::new(&self.arena, &self.config);
        let root = ctx.run(self.arena.get(self.root), instance)?;
        Ok(Evaluation {
            root,
            format: self.config.output_format,
        })
    }

    /// Whether `instance` conforms. Structural errors report as `false`.
    #[must_use]
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.evaluate(instance).map_or(false, |result| result.valid())
    }

    /// The dialect the root schema is evaluated under.
    #[must_use]
    pub fn draft(&self) -> Draft {
        self.arena.get(self.root).draft()
    }

    /// The options this evaluator was built with.
    #[must_use]
    pub fn config(&self) -> Arc<EvaluationOptions> {
        Arc::clone(&self.config)
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("root", &self.arena.get(self.root))
            .field("config", &self.config)
            .finish()
    }
}

/// The outcome of one evaluation: the result tree plus the requested output
/// format. All projections read the same tree; none re-evaluates.
#[derive(Debug, Clone)]
pub struct Evaluation {
    root: EvaluationNode,
    format: OutputFormat,
}

impl Evaluation {
    /// Overall validity, the same value every output format reports.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.root.valid()
    }

    /// The root of the result tree.
    ///
    /// Under flag output the tree is pruned by short-circuiting; richer
    /// projections are only complete when the evaluator was built with a
    /// richer format.
    #[must_use]
    pub fn root(&self) -> &EvaluationNode {
        &self.root
    }

    /// The output format requested through the options.
    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    #[must_use]
    pub fn flag(&self) -> FlagOutput {
        FlagOutput::new(self.root.valid())
    }

    #[must_use]
    pub fn basic(&self) -> BasicOutput<'_> {
        BasicOutput::new(&self.root)
    }

    #[must_use]
    pub fn detailed(&self) -> DetailedOutput<'_> {
        DetailedOutput::new(&self.root)
    }

    #[must_use]
    pub fn verbose(&self) -> VerboseOutput<'_> {
        VerboseOutput::new(&self.root)
    }

    /// The projection matching the requested output format.
    #[must_use]
    pub fn output(&self) -> Output<'_> {
        match self.format {
            OutputFormat::Flag => Output::Flag(self.flag()),
            OutputFormat::Basic => Output::Basic(self.basic()),
            OutputFormat::Detailed => Output::Detailed(self.detailed()),
            OutputFormat::Verbose => Output::Verbose(self.verbose()),
        }
    }
}

/// A format-erased output projection.
#[derive(Debug, Clone, Copy)]
pub enum Output<'a> {
    Flag(FlagOutput),
    Basic(BasicOutput<'a>),
    Detailed(DetailedOutput<'a>),
    Verbose(VerboseOutput<'a>),
}

impl serde::Serialize for Output<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Output::Flag(output) => output.serialize(serializer),
            Output::Basic(output) => output.serialize(serializer),
            Output::Detailed(output) => output.serialize(serializer),
            Output::Verbose(output) => output.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    #[test]
    fn evaluator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<super::Evaluator>();
    }

    #[test]
    fn evaluations_are_reusable() {
        let evaluator = crate::evaluator_for(&json!({"type": "integer"})).expect("Valid schema");
        assert!(evaluator.is_valid(&json!(1)));
        assert!(!evaluator.is_valid(&json!("x")));
        assert!(evaluator.is_valid(&json!(2)));
    }
}
