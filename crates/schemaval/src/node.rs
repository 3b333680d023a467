//! Compiled schema nodes and the node arena.
//!
//! Subschemas in applicator position are owned by their parent keyword;
//! reference targets are interned in the [`Arena`] and addressed by
//! [`NodeId`], so schema-level cycles are index cycles rather than ownership
//! cycles.
use std::borrow::Cow;

use ahash::AHashMap;
use referencing::{Draft, Uri};

use crate::keywords::BoxedKeyword;

/// Index of an interned reference target in the [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub(crate) usize);

/// One keyword of a subschema, ready to evaluate.
pub(crate) struct CompiledKeyword {
    pub(crate) name: Cow<'static, str>,
    pub(crate) evaluator: BoxedKeyword,
}

pub(crate) enum NodeKind {
    /// A boolean schema: `true` accepts anything, `false` rejects everything.
    Boolean(bool),
    /// Keywords in dispatch order: dependency level, then priority, then name.
    Keywords(Box<[CompiledKeyword]>),
}

/// A compiled subschema.
pub(crate) struct SchemaNode {
    kind: NodeKind,
    base_uri: Uri<String>,
    absolute: Uri<String>,
    draft: Draft,
}

impl SchemaNode {
    pub(crate) fn new(
        kind: NodeKind,
        base_uri: Uri<String>,
        absolute: Uri<String>,
        draft: Draft,
    ) -> Self {
        SchemaNode {
            kind,
            base_uri,
            absolute,
            draft,
        }
    }
    pub(crate) fn kind(&self) -> &NodeKind {
        &self.kind
    }
    /// The base URI of the resource this subschema belongs to. Entering a
    /// node with a new base URI opens a dynamic scope.
    pub(crate) fn base_uri(&self) -> &Uri<String> {
        &self.base_uri
    }
    /// The absolute schema location reported in output units.
    pub(crate) fn absolute(&self) -> &Uri<String> {
        &self.absolute
    }
    pub(crate) fn draft(&self) -> Draft {
        self.draft
    }
}

impl std::fmt::Debug for SchemaNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            NodeKind::Boolean(value) => format!("Boolean({value})"),
            NodeKind::Keywords(keywords) => format!(
                "Keywords({})",
                keywords
                    .iter()
                    .map(|k| k.name.as_ref())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };
        f.debug_struct("SchemaNode")
            .field("kind", &kind)
            .field("absolute", &self.absolute.as_str())
            .finish()
    }
}

/// All interned reference targets plus the lookup tables the evaluation
/// context needs for dynamic resolution.
pub(crate) struct Arena {
    nodes: Vec<SchemaNode>,
    /// Resource base URI → anchor name → interned `$dynamicAnchor` target.
    dynamic_anchors: AHashMap<String, AHashMap<String, NodeId>>,
    /// Resource base URI → interned root, for resources whose root carries
    /// `$recursiveAnchor: true`.
    recursive_roots: AHashMap<String, NodeId>,
    /// Whether any compiled keyword declares annotation dependencies; when
    /// one does, flag output cannot skip annotation collection.
    collects_annotations: bool,
}

impl Arena {
    pub(crate) fn new(
        nodes: Vec<SchemaNode>,
        dynamic_anchors: AHashMap<String, AHashMap<String, NodeId>>,
        recursive_roots: AHashMap<String, NodeId>,
        collects_annotations: bool,
    ) -> Self {
        Arena {
            nodes,
            dynamic_anchors,
            recursive_roots,
            collects_annotations,
        }
    }

    pub(crate) fn get(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub(crate) fn dynamic_anchor(&self, base_uri: &str, name: &str) -> Option<NodeId> {
        self.dynamic_anchors
            .get(base_uri)
            .and_then(|names| names.get(name))
            .copied()
    }

    pub(crate) fn recursive_root(&self, base_uri: &str) -> Option<NodeId> {
        self.recursive_roots.get(base_uri).copied()
    }

    pub(crate) fn collects_annotations(&self) -> bool {
        self.collects_annotations
    }
}
