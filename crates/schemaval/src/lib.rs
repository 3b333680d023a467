//! A JSON Schema evaluation engine for Rust.
//!
//! - 📚 Dialect-aware evaluation: Draft 6, Draft 7, 2019-09, 2020-12 and `next`
//! - 🧾 Standardized output formats: `flag`, `basic`, `detailed`, `verbose`
//! - 🧩 Cross-keyword annotations, `$dynamicRef`/`$recursiveRef` reparenting
//! - 🔧 Custom keywords, custom formats and custom vocabularies
//! - 🌐 Remote reference loading (network/file)
//!
//! # Evaluation
//!
//! For one-off checks there is [`is_valid`]; for anything more, build an
//! [`Evaluator`] once and reuse it:
//!
//! ```rust
//! use serde_json::json;
//!
//! let schema = json!({"type": "string"});
//! assert!(schemaval::is_valid(&schema, &json!("Hello, world!")));
//!
//! let evaluator = schemaval::evaluator_for(&schema).expect("Invalid schema");
//! assert!(evaluator.is_valid(&json!("Hello again")));
//! assert!(!evaluator.is_valid(&json!(42)));
//! ```
//!
//! # Output formats
//!
//! Evaluation produces a result tree; the four standardized output formats
//! are pure projections of that tree.
//!
//! ```rust
//! use serde_json::json;
//!
//! let schema = json!({"type": "object", "required": ["name"]});
//! let evaluator = schemaval::evaluator_for(&schema).expect("Invalid schema");
//! let result = evaluator.evaluate(&json!({})).expect("Evaluation completes");
//!
//! assert!(!result.valid());
//! let output = serde_json::to_value(result.basic()).expect("Serializable");
//! assert_eq!(output["valid"], json!(false));
//! assert_eq!(output["details"][0]["errors"][0]["keyword"], json!("required"));
//! ```
//!
//! # Configuration
//!
//! [`EvaluationOptions`] selects the dialect, output format, format
//! strictness, external resources and more:
//!
//! ```rust
//! use schemaval::{Draft, OutputFormat};
//! use serde_json::json;
//!
//! let evaluator = schemaval::options()
//!     .with_dialect(Draft::Draft7)
//!     .with_output_format(OutputFormat::Detailed)
//!     .require_format_validation(true)
//!     .build(&json!({"format": "ipv4"}))
//!     .expect("Invalid schema");
//! assert!(!evaluator.is_valid(&json!("not an ip")));
//! ```
//!
//! # Failure semantics
//!
//! Validation failures are *data* in the result tree. Only structural
//! conditions abort evaluation and surface as [`EvaluationError`]: an
//! unresolvable reference, a reference cycle that consumes no instance
//! structure, a malformed schema, a required-but-unknown vocabulary, an
//! unknown format under strict options, a loader failure, or cancellation.
mod compiler;
mod context;
pub mod error;
mod evaluator;
mod keywords;
mod node;
pub mod options;
pub mod output;
pub mod paths;
pub mod pointer;
pub mod primitive_type;
mod result;
mod retriever;
pub mod trace;

pub use error::EvaluationError;
pub use evaluator::{Evaluation, Evaluator, Output};
pub use keywords::{
    custom::{Keyword, KeywordFactory},
    format::Format,
};
pub use options::EvaluationOptions;
pub use output::{BasicOutput, DetailedOutput, FlagOutput, OutputFormat, VerboseOutput};
pub use paths::{Location, PathChunk};
pub use pointer::{
    JsonPointer, ParsePointerError, RelativeJsonPointer, RelativePointerError, RelativeTarget,
    Target,
};
pub use referencing::{Draft, Registry, Resource, Retrieve, Uri};
pub use result::{EvaluationNode, KeywordError};
pub use retriever::DefaultRetriever;
pub use trace::EvaluationLog;

use serde_json::Value;

/// A shortcut for checking `instance` against `schema`. The dialect is
/// detected from `$schema`. Schemas that fail to compile report as invalid.
///
/// ```rust
/// use serde_json::json;
///
/// assert!(schemaval::is_valid(&json!({"maxLength": 5}), &json!("foo")));
/// ```
#[must_use]
pub fn is_valid(schema: &Value, instance: &Value) -> bool {
    evaluator_for(schema).map_or(false, |evaluator| evaluator.is_valid(instance))
}

/// Evaluate `instance` against `schema` once, with default options.
///
/// # Errors
///
/// Returns an error when the schema cannot be compiled or evaluation hits a
/// structural error.
pub fn evaluate(schema: &Value, instance: &Value) -> Result<Evaluation, EvaluationError> {
    evaluator_for(schema)?.evaluate(instance)
}

/// Create default [`EvaluationOptions`] for configuring an evaluator.
#[must_use]
pub fn options() -> EvaluationOptions {
    EvaluationOptions::default()
}

/// Build a reusable [`Evaluator`] with default options.
///
/// # Errors
///
/// Returns an error when the schema cannot be compiled.
pub fn evaluator_for(schema: &Value) -> Result<Evaluator, EvaluationError> {
    options().build(schema)
}


#[cfg(test)]
mod tests {
    use super::is_valid;
    use serde_json::json;

    #[test]
    fn one_off_validation() {
        let schema = json!({"minLength": 5});
        assert!(is_valid(&schema, &json!("foobar")));
        assert!(!is_valid(&schema, &json!("foo")));
    }

    #[test]
    fn invalid_schema_type() {
        let result = crate::evaluator_for(&json!([1]));
        assert!(matches!(
            result.expect_err("Arrays are not schemas"),
            crate::EvaluationError::MalformedSchema { .. }
        ));
    }

    #[test]
    fn boolean_schemas() {
        assert!(is_valid(&json!(true), &json!({"anything": [1, 2, 3]})));
        assert!(!is_valid(&json!(false), &json!(null)));
    }
}
