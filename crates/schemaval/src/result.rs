//! The evaluation result tree.
//!
//! One node per evaluated subschema, mirroring the traversal. Keywords attach
//! errors and annotations to the node of the subschema they belong to;
//! applicators attach one child node per subschema application. The engine
//! never aggregates child validity automatically: each applicator decides.
use std::borrow::Cow;

use referencing::Uri;
use serde_json::Value;

use crate::paths::Location;

/// A single keyword failure, tied to the node it occurred on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordError {
    keyword: Cow<'static, str>,
    message: String,
}

impl KeywordError {
    /// The keyword that failed; empty for a `false` boolean schema.
    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }
    /// The human-readable failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// One node of the evaluation result tree.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationNode {
    valid: bool,
    evaluation_path: Location,
    schema_location: Uri<String>,
    instance_location: Location,
    errors: Vec<KeywordError>,
    annotations: Vec<(Cow<'static, str>, Value)>,
    children: Vec<EvaluationNode>,
}

impl EvaluationNode {
    pub(crate) fn new(
        evaluation_path: Location,
        schema_location: Uri<String>,
        instance_location: Location,
    ) -> Self {
        EvaluationNode {
            valid: true,
            evaluation_path,
            schema_location,
            instance_location,
            errors: Vec::new(),
            annotations: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Whether this subschema accepted its instance.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.valid
    }
    /// JSON Pointer from the root schema through applicator descent.
    #[must_use]
    pub fn evaluation_path(&self) -> &Location {
        &self.evaluation_path
    }
    /// Absolute URI of the evaluated subschema.
    #[must_use]
    pub fn schema_location(&self) -> &Uri<String> {
        &self.schema_location
    }
    /// JSON Pointer from the root instance to the evaluated value.
    #[must_use]
    pub fn instance_location(&self) -> &Location {
        &self.instance_location
    }
    /// Keyword failures on this node, in keyword execution order.
    #[must_use]
    pub fn errors(&self) -> &[KeywordError] {
        &self.errors
    }
    /// Annotations published on this node, in keyword execution order.
    #[must_use]
    pub fn annotations(&self) -> &[(Cow<'static, str>, Value)] {
        &self.annotations
    }
    /// The annotation published by `keyword`, if it ran and succeeded.
    #[must_use]
    pub fn annotation(&self, keyword: &str) -> Option<&Value> {
        self.annotations
            .iter()
            .find(|(name, _)| name == keyword)
            .map(|(_, value)| value)
    }
    /// Child results, one per subschema application, in traversal order.
    #[must_use]
    pub fn children(&self) -> &[EvaluationNode] {
        &self.children
    }

    pub(crate) fn push_error(&mut self, keyword: Cow<'static, str>, message: String) {
        self.valid = false;
        self.errors.push(KeywordError { keyword, message });
    }

    /// Flip validity without a message; applicators use this when their
    /// verdict is fully explained by child results.
    pub(crate) fn mark_invalid(&mut self) {
        self.valid = false;
    }

    pub(crate) fn insert_annotation(&mut self, keyword: Cow<'static, str>, value: Value) {
        self.annotations.push((keyword, value));
    }

    pub(crate) fn push_child(&mut self, child: EvaluationNode) {
        self.children.push(child);
    }

    #[cfg(feature = "parallel")]
    pub(crate) fn into_children(self) -> Vec<EvaluationNode> {
        self.children
    }

    /// Collect annotation values published under any of `names` by this node
    /// or by valid descendants evaluated at the same instance location.
    ///
    /// Results from invalid subtrees are skipped, which is what makes the
    /// annotation visibility law hold for the `unevaluated*` family: a failed
    /// branch never contributes evaluated-member bookkeeping.
    pub(crate) fn gather_annotations<'n>(
        &'n self,
        names: &[&str],
        instance_location: &Location,
        out: &mut Vec<&'n Value>,
    ) {
        if !self.valid {
            return;
        }
        for (name, value) in &self.annotations {
            if names.contains(&name.as_ref()) {
                out.push(value);
            }
        }
        for child in &self.children {
            if child.instance_location == *instance_location {
                child.gather_annotations(names, instance_location, out);
            }
        }
    }
}
