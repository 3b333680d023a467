//! Evaluator configuration.
use core::fmt;
use std::sync::{atomic::AtomicBool, Arc};

use ahash::{AHashMap, AHashSet};
use referencing::{Draft, Registry, Resource, Retrieve};
use serde_json::Value;

use crate::{
    error::EvaluationError,
    evaluator::Evaluator,
    keywords::{custom::KeywordFactory, format::Format},
    output::OutputFormat,
    trace::{EvaluationLog, TracingLog},
};

/// Configuration for building an [`Evaluator`].
///
/// ```rust
/// use schemaval::{Draft, OutputFormat};
/// use serde_json::json;
///
/// let schema = json!({"type": "string"});
/// let evaluator = schemaval::options()
///     .with_dialect(Draft::Draft7)
///     .with_output_format(OutputFormat::Verbose)
///     .build(&schema)
///     .expect("Valid schema");
/// assert!(evaluator.evaluate(&json!("hello")).expect("Evaluates").valid());
/// ```
#[derive(Clone)]
pub struct EvaluationOptions {
    pub(crate) output_format: OutputFormat,
    pub(crate) dialect: Option<Draft>,
    pub(crate) default_base_uri: Option<String>,
    pub(crate) registry: Option<Registry>,
    pub(crate) resources: Vec<(String, Resource)>,
    pub(crate) retriever: Arc<dyn Retrieve>,
    /// Custom vocabulary URI → keyword names it contributes.
    pub(crate) vocabularies: AHashMap<String, AHashSet<String>>,
    pub(crate) process_custom_keywords: bool,
    pub(crate) validate_formats: Option<bool>,
    pub(crate) ignore_unknown_formats: bool,
    formats: AHashMap<String, Arc<dyn Format>>,
    keywords: AHashMap<String, Arc<dyn KeywordFactory>>,
    pub(crate) logger: Arc<dyn EvaluationLog>,
    pub(crate) cancellation: Option<Arc<AtomicBool>>,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        EvaluationOptions {
            output_format: OutputFormat::default(),
            dialect: None,
            default_base_uri: None,
            registry: None,
            resources: Vec::new(),
            retriever: Arc::new(crate::retriever::DefaultRetriever),
            vocabularies: AHashMap::new(),
            process_custom_keywords: false,
            validate_formats: None,
            ignore_unknown_formats: true,
            formats: AHashMap::new(),
            keywords: AHashMap::new(),
            logger: Arc::new(TracingLog),
            cancellation: None,
        }
    }
}

impl fmt::Debug for EvaluationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationOptions")
            .field("output_format", &self.output_format)
            .field("dialect", &self.dialect)
            .field("default_base_uri", &self.default_base_uri)
            .field("process_custom_keywords", &self.process_custom_keywords)
            .field("validate_formats", &self.validate_formats)
            .field("ignore_unknown_formats", &self.ignore_unknown_formats)
            .finish_non_exhaustive()
    }
}

impl EvaluationOptions {
    /// Build an [`Evaluator`] for `schema` using the current options.
    ///
    /// # Errors
    ///
    /// Returns an error when the schema is malformed, a reference cannot be
    /// resolved, or a required vocabulary is unknown.
    pub fn build(&self, schema: &Value) -> Result<Evaluator, EvaluationError> {
        crate::compiler::build_evaluator(self.clone(), schema)
    }
    /// Requested output format; `flag` enables short-circuiting.
    pub fn with_output_format(&mut self, format: OutputFormat) -> &mut Self {
        self.output_format = format;
        self
    }
    /// Evaluate under an explicit dialect instead of `$schema` detection.
    pub fn with_dialect(&mut self, dialect: Draft) -> &mut Self {
        self.dialect = Some(dialect);
        self
    }
    /// The base URI for schemas that declare no `$id`.
    pub fn with_default_base_uri(&mut self, uri: impl Into<String>) -> &mut Self {
        self.default_base_uri = Some(uri.into());
        self
    }
    /// Start from a pre-populated registry instead of the built-in one
    /// (which holds only the dialect meta-schemas).
    pub fn with_registry(&mut self, registry: Registry) -> &mut Self {
        self.registry = Some(registry);
        self
    }
    /// Make an additional resource addressable during evaluation.
    pub fn with_resource(&mut self, uri: impl Into<String>, resource: Resource) -> &mut Self {
        self.resources.push((uri.into(), resource));
        self
    }
    /// Set the loader used to fetch external resources.
    pub fn with_retriever(&mut self, retriever: impl Retrieve + 'static) -> &mut Self {
        self.retriever = Arc::new(retriever);
        self
    }
    /// Declare a custom vocabulary and the keyword names it contributes.
    ///
    /// Meta-schemas may mark a vocabulary as required; a required vocabulary
    /// that is neither built-in nor declared here aborts evaluator
    /// construction.
    pub fn with_vocabulary(
        &mut self,
        uri: impl Into<String>,
        keywords: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut Self {
        self.vocabularies
            .insert(uri.into(), keywords.into_iter().map(Into::into).collect());
        self
    }
    /// When set, unknown keywords become annotations carrying their raw
    /// value; otherwise they are ignored.
    pub fn process_custom_keywords(&mut self, process: bool) -> &mut Self {
        self.process_custom_keywords = process;
        self
    }
    /// Force `format` to assert regardless of dialect defaults.
    pub fn require_format_validation(&mut self, require: bool) -> &mut Self {
        self.validate_formats = Some(require);
        self
    }
    /// When set, an unknown `format` value aborts evaluator construction
    /// instead of passing silently.
    pub fn only_known_formats(&mut self, only_known: bool) -> &mut Self {
        self.ignore_unknown_formats = !only_known;
        self
    }
    /// Register a custom format checker.
    pub fn with_format(&mut self, name: impl Into<String>, format: impl Format + 'static) -> &mut Self {
        self.formats.insert(name.into(), Arc::new(format));
        self
    }
    /// Register a custom keyword via its factory.
    pub fn with_keyword(
        &mut self,
        name: impl Into<String>,
        factory: impl KeywordFactory + 'static,
    ) -> &mut Self {
        self.keywords.insert(name.into(), Arc::new(factory));
        self
    }
    /// Route engine narration into `logger` instead of `tracing`.
    pub fn with_logger(&mut self, logger: impl EvaluationLog + 'static) -> &mut Self {
        self.logger = Arc::new(logger);
        self
    }
    /// A cooperative cancellation handle, honoured at subschema boundaries
    /// and before reference fetches.
    pub fn with_cancellation(&mut self, handle: Arc<AtomicBool>) -> &mut Self {
        self.cancellation = Some(handle);
        self
    }

    pub(crate) fn get_format(&self, name: &str) -> Option<&Arc<dyn Format>> {
        self.formats.get(name)
    }
    pub(crate) fn get_keyword_factory(&self, name: &str) -> Option<&Arc<dyn KeywordFactory>> {
        self.keywords.get(name)
    }
}
