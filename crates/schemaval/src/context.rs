//! The dynamic evaluation context: frame stack, dynamic scopes, and the
//! reference cycle set.
use std::{borrow::Cow, sync::atomic::Ordering};

use ahash::AHashSet;
use serde_json::Value;

use crate::{
    error::EvaluationError,
    node::{Arena, NodeId, NodeKind, SchemaNode},
    options::EvaluationOptions,
    paths::{Location, PathChunk},
    result::EvaluationNode,
};

/// One entry of the dynamic stack.
struct Frame {
    result: EvaluationNode,
    /// Whether entering this frame opened a new dynamic scope.
    new_scope: bool,
    /// The keyword currently being dispatched on this frame.
    current_keyword: Cow<'static, str>,
}

/// The evaluation context.
///
/// Owns everything dynamic about one evaluation: the frame stack, the
/// dynamic scope stack used by `$dynamicRef`/`$recursiveRef`, and the
/// `(schema, instance location)` pairs used for reference cycle detection.
/// The arena, registry-derived tables and options are shared and read-only.
pub(crate) struct EvalContext<'a> {
    arena: &'a Arena,
    config: &'a EvaluationOptions,
    frames: Vec<Frame>,
    scopes: Vec<String>,
    seen: AHashSet<(NodeId, String)>,
}

impl<'a> EvalContext<'a> {
    pub(crate) fn new(arena: &'a Arena, config: &'a EvaluationOptions) -> Self {
        EvalContext {
            arena,
            config,
            frames: Vec::new(),
            scopes: Vec::new(),
            seen: AHashSet::new(),
        }
    }

    /// The interned node behind `id`. The returned reference is tied to the
    /// arena, not to this borrow of the context, so applying it is fine.
    pub(crate) fn node(&self, id: NodeId) -> &'a SchemaNode {
        self.arena.get(id)
    }

    /// Evaluate `node` as the evaluation root and return the result tree.
    pub(crate) fn run(
        &mut self,
        node: &SchemaNode,
        instance: &Value,
    ) -> Result<EvaluationNode, EvaluationError> {
        self.push_frame(node, Location::new(), Location::new());
        let outcome = self.dispatch(node, instance);
        let frame = self.pop_frame();
        outcome?;
        Ok(frame.result)
    }

    /// Apply `node` to `instance` in a child frame and attach the result to
    /// the current frame. Returns the child's validity.
    pub(crate) fn apply(
        &mut self,
        node: &SchemaNode,
        schema_path: &[PathChunk],
        instance: &Value,
        instance_segment: Option<PathChunk>,
    ) -> Result<bool, EvaluationError> {
        self.check_cancelled()?;
        let parent = self.frames.last().expect("The frame stack is not empty");
        let evaluation_path = parent.result.evaluation_path().extend(schema_path);
        let instance_location = match instance_segment {
            Some(chunk) => parent.result.instance_location().join(chunk),
            None => parent.result.instance_location().clone(),
        };
        self.push_frame(node, evaluation_path, instance_location);
        let outcome = self.dispatch(node, instance);
        let frame = self.pop_frame();
        outcome?;
        let valid = frame.result.valid();
        self.frames
            .last_mut()
            .expect("The frame stack is not empty")
            .result
            .push_child(frame.result);
        Ok(valid)
    }

    fn push_frame(&mut self, node: &SchemaNode, evaluation_path: Location, instance_location: Location) {
        let new_scope = self
            .scopes
            .last()
            .map_or(true, |scope| scope != node.base_uri().as_str());
        if new_scope {
            self.scopes.push(node.base_uri().as_str().to_string());
        }
        self.frames.push(Frame {
            result: EvaluationNode::new(evaluation_path, node.absolute().clone(), instance_location),
            new_scope,
            current_keyword: Cow::Borrowed(""),
        });
    }

    fn pop_frame(&mut self) -> Frame {
        let frame = self.frames.pop().expect("The frame stack is not empty");
        if frame.new_scope {
            self.scopes.pop();
        }
        frame
    }

    fn dispatch(&mut self, node: &SchemaNode, instance: &Value) -> Result<(), EvaluationError> {
        match node.kind() {
            NodeKind::Boolean(true) => Ok(()),
            NodeKind::Boolean(false) => {
                self.error(format!("False schema does not allow {instance}"));
                Ok(())
            }
            NodeKind::Keywords(keywords) => {
                for keyword in keywords.iter() {
                    self.current_frame_mut().current_keyword = keyword.name.clone();
                    keyword.evaluator.evaluate(self, instance)?;
                    if self.applies_optimizations() && !self.current_valid() {
                        break;
                    }
                }
                Ok(())
            }
        }
    }

    fn current_frame(&self) -> &Frame {
        self.frames.last().expect("The frame stack is not empty")
    }

    fn current_frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("The frame stack is not empty")
    }

    /// Record a failure of the currently dispatched keyword.
    pub(crate) fn error(&mut self, message: String) {
        let frame = self.current_frame_mut();
        let keyword = frame.current_keyword.clone();
        frame.result.push_error(keyword, message);
    }

    /// Fail the current frame without a message; child results carry the
    /// detail.
    pub(crate) fn invalidate(&mut self) {
        self.current_frame_mut().result.mark_invalid();
    }

    /// Publish an annotation under the currently dispatched keyword's name.
    /// Only successful keywords publish; a failing evaluator must not call
    /// this after recording its error. Skipped entirely when nothing can
    /// observe annotations.
    pub(crate) fn annotate(&mut self, value: Value) {
        if self.applies_optimizations() {
            return;
        }
        let frame = self.current_frame_mut();
        let keyword = frame.current_keyword.clone();
        frame.result.insert_annotation(keyword, value);
    }

    /// A sibling's annotation on the current frame, by producer name.
    pub(crate) fn annotation(&self, keyword: &str) -> Option<&Value> {
        self.current_frame().result.annotation(keyword)
    }

    /// Whether the current frame is still valid.
    pub(crate) fn current_valid(&self) -> bool {
        self.current_frame().result.valid()
    }

    /// The instance location of the current frame.
    pub(crate) fn instance_location(&self) -> &Location {
        self.current_frame().result.instance_location()
    }

    /// Annotation values visible to the `unevaluated*` family: published on
    /// the current frame or on valid descendants at the same instance
    /// location.
    pub(crate) fn gathered_annotations(&self, names: &[&str]) -> Vec<&Value> {
        let frame = self.current_frame();
        let mut out = Vec::new();
        frame
            .result
            .gather_annotations(names, frame.result.instance_location(), &mut out);
        out
    }

    /// Flag output with no annotation dependency anywhere in the compiled
    /// schema: keywords may short-circuit and skip annotation bookkeeping.
    pub(crate) fn applies_optimizations(&self) -> bool {
        matches!(self.config.output_format, crate::output::OutputFormat::Flag)
            && !self.arena.collects_annotations()
    }

    pub(crate) fn check_cancelled(&self) -> Result<(), EvaluationError> {
        if let Some(handle) = &self.config.cancellation {
            if handle.load(Ordering::Relaxed) {
                return Err(EvaluationError::Cancelled);
            }
        }
        Ok(())
    }

    pub(crate) fn narrate(&self, message: &str) {
        self.config
            .logger
            .narrate(self.current_frame().result.evaluation_path(), message);
    }

    /// Mark a reference entry; `false` means the same schema was re-entered
    /// at the same instance location without instance progress.
    pub(crate) fn enter_ref(&mut self, id: NodeId) -> bool {
        let key = (id, self.instance_location().to_string());
        self.seen.insert(key)
    }

    pub(crate) fn exit_ref(&mut self, id: NodeId) {
        let key = (id, self.instance_location().to_string());
        self.seen.remove(&key);
    }

    /// Resolve a dynamic anchor against the dynamic scope, outermost first.
    pub(crate) fn find_dynamic_anchor(&self, name: &str) -> Option<NodeId> {
        self.scopes
            .iter()
            .find_map(|scope| self.arena.dynamic_anchor(scope, name))
    }

    /// Resolve a `$recursiveRef` against the dynamic scope: the outermost
    /// scope whose resource root carries `$recursiveAnchor: true` wins.
    pub(crate) fn find_recursive_root(&self) -> Option<NodeId> {
        self.scopes
            .iter()
            .find_map(|scope| self.arena.recursive_root(scope))
    }

    /// Fork this context for an independent branch sharing the arena and
    /// options but owning its own frame stack. Used by the opportunistic
    /// parallel fan-out; results must be merged in traversal order.
    #[cfg(feature = "parallel")]
    pub(crate) fn fork(&self, node: &SchemaNode) -> EvalContext<'a> {
        let current = self.current_frame();
        let mut fork = EvalContext {
            arena: self.arena,
            config: self.config,
            frames: Vec::new(),
            scopes: self.scopes.clone(),
            seen: self.seen.clone(),
        };
        fork.frames.push(Frame {
            result: EvaluationNode::new(
                current.result.evaluation_path().clone(),
                node.absolute().clone(),
                current.result.instance_location().clone(),
            ),
            new_scope: false,
            current_keyword: current.current_keyword.clone(),
        });
        fork
    }

    /// Detach the forked branch's child results for in-order merging.
    #[cfg(feature = "parallel")]
    pub(crate) fn into_branch_result(mut self) -> EvaluationNode {
        self.frames.pop().expect("The frame stack is not empty").result
    }

    /// Attach a child result produced on a forked context.
    #[cfg(feature = "parallel")]
    pub(crate) fn push_child_result(&mut self, child: EvaluationNode) {
        self.current_frame_mut().result.push_child(child);
    }
}
