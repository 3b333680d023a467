//! Compilation of schema documents into evaluable node trees.
//!
//! Subschemas in applicator position compile into nodes owned by their
//! parent keyword. Reference targets are interned into the arena through a
//! worklist, keyed by their absolute URI, so a `$ref` graph with cycles
//! becomes a finite set of nodes addressed by [`NodeId`].
use std::{cell::RefCell, collections::VecDeque, sync::Arc};

use ahash::{AHashMap, AHashSet};
use referencing::{uri, Draft, Registry, Uri, Vocabulary, VocabularySet, SPECIFICATIONS};
use serde_json::Value;

use crate::{
    error::EvaluationError,
    evaluator::Evaluator,
    keywords::{self, annotation, custom::CustomKeyword, ref_},
    node::{Arena, CompiledKeyword, NodeId, NodeKind, SchemaNode},
    options::EvaluationOptions,
    paths::{Location, PathChunk},
};

/// Keywords that only annotate; active under the meta-data vocabulary.
const METADATA_KEYWORDS: &[&str] = &[
    "default",
    "deprecated",
    "description",
    "examples",
    "readOnly",
    "title",
    "writeOnly",
];

/// Mutable state shared across the compilation worklist.
pub(crate) struct BuildState {
    nodes: Vec<Option<SchemaNode>>,
    interned: AHashMap<String, NodeId>,
    queue: VecDeque<Job>,
    dynamic_anchors: AHashMap<String, AHashMap<String, NodeId>>,
    recursive_roots: AHashMap<String, NodeId>,
    scoped: AHashSet<String>,
    collects_annotations: bool,
}

impl BuildState {
    fn new() -> Self {
        BuildState {
            nodes: Vec::new(),
            interned: AHashMap::new(),
            queue: VecDeque::new(),
            dynamic_anchors: AHashMap::new(),
            recursive_roots: AHashMap::new(),
            scoped: AHashSet::new(),
            collects_annotations: false,
        }
    }
}

/// A pending reference target: a subschema interned but not yet compiled.
struct Job {
    id: NodeId,
    contents: Value,
    base_uri: Uri<String>,
    draft: Draft,
    vocabularies: VocabularySet,
    location: Location,
    absolute: Uri<String>,
}

/// The lexical compilation context for one subschema position.
pub(crate) struct Context<'a> {
    state: &'a RefCell<BuildState>,
    registry: &'a Registry,
    config: &'a EvaluationOptions,
    base_uri: Uri<String>,
    draft: Draft,
    vocabularies: VocabularySet,
    location: Location,
}

impl<'a> Context<'a> {
    pub(crate) fn draft(&self) -> Draft {
        self.draft
    }
    pub(crate) fn config(&self) -> &'a EvaluationOptions {
        self.config
    }
    /// Pre-2019 dialects ignore keywords adjacent to `$ref`.
    pub(crate) fn supports_adjacent_validation(&self) -> bool {
        self.draft >= Draft::Draft201909
    }
    /// Whether the given vocabulary is active. Dialects that predate
    /// vocabularies filter nothing.
    pub(crate) fn has_vocabulary(&self, vocabulary: &Vocabulary) -> bool {
        if self.draft <= Draft::Draft7 {
            return true;
        }
        self.vocabularies.contains(vocabulary)
    }
    /// A malformed-schema error at the current location.
    pub(crate) fn malformed(&self, reason: impl Into<String>) -> EvaluationError {
        EvaluationError::malformed_schema(self.location.to_string(), reason)
    }
    /// The location of the current subschema within its resource.
    pub(crate) fn location(&self) -> &Location {
        &self.location
    }

    fn absolute(&self) -> Result<Uri<String>, EvaluationError> {
        uri::with_fragment(&self.base_uri, &self.location.to_string())
            .map_err(EvaluationError::from)
    }

    fn child(&self, path: &[PathChunk]) -> Context<'a> {
        Context {
            state: self.state,
            registry: self.registry,
            config: self.config,
            base_uri: self.base_uri.clone(),
            draft: self.draft,
            vocabularies: self.vocabularies.clone(),
            location: self.location.extend(path),
        }
    }

    /// Compile a subschema in applicator position, honouring an embedded
    /// `$id` (the subschema then becomes a resource root and its `$schema`,
    /// if any, switches the dialect for that resource).
    pub(crate) fn subschema(
        &self,
        value: &Value,
        path: &[PathChunk],
    ) -> Result<SchemaNode, EvaluationError> {
        let mut ctx = self.child(path);
        if let Some(id) = self.draft.create_resource_ref(value).id() {
            ctx.base_uri = uri::resolve_against(&ctx.base_uri.borrow(), id)?;
            // An embedded resource root may switch dialects; unknown
            // `$schema` values keep the enclosing dialect (custom
            // meta-schemas are resolved at the document root).
            ctx.draft = ctx.draft.detect(value).unwrap_or(ctx.draft);
            ctx.vocabularies = ctx.draft.default_vocabularies();
            ctx.location = Location::new();
            ctx.ensure_scope(&ctx.base_uri.clone())?;
        }
        let absolute = ctx.absolute()?;
        compile_schema(&ctx, value, absolute)
    }

    /// Resolve `reference` and intern its target, returning the node index.
    pub(crate) fn resolve_target(&self, reference: &str) -> Result<NodeId, EvaluationError> {
        let mut absolute = uri::resolve_against(&self.base_uri.borrow(), reference)
            .map_err(|err| EvaluationError::reference_resolution(reference, err.to_string()))?;
        // `#` resolves to the base with an empty fragment; canonicalize so a
        // reference to a resource root and the root itself share one key.
        if absolute.as_str().ends_with('#') {
            absolute = uri::from_str(absolute.as_str().trim_end_matches('#'))?;
        }
        if let Some(id) = self.state.borrow().interned.get(absolute.as_str()) {
            return Ok(*id);
        }
        let resolver = self.registry.resolver(self.base_uri.clone());
        let resolved = resolver
            .lookup(reference)
            .map_err(|err| match err {
                referencing::Error::Unretrievable { .. } => EvaluationError::from(err),
                other => EvaluationError::reference_resolution(reference, other.to_string()),
            })?;
        let location = fragment_location(absolute.as_str());
        let (contents, resolver, draft) = resolved.into_inner();
        self.intern(
            absolute,
            contents.clone(),
            resolver.base_uri().clone(),
            draft,
            location,
        )
    }

    /// Intern the resource root of the current base URI (the `#` target).
    pub(crate) fn resolve_resource_root(&self, base_uri: &Uri<String>) -> Result<NodeId, EvaluationError> {
        let absolute = base_uri.clone();
        if let Some(id) = self.state.borrow().interned.get(absolute.as_str()) {
            return Ok(*id);
        }
        let resource = self.registry.resource(base_uri).ok_or_else(|| {
            EvaluationError::reference_resolution(
                base_uri.as_str(),
                "the resource is not present in the registry",
            )
        })?;
        self.intern(
            absolute,
            resource.contents().clone(),
            base_uri.clone(),
            resource.draft(),
            Location::new(),
        )
    }

    fn intern(
        &self,
        absolute: Uri<String>,
        contents: Value,
        base_uri: Uri<String>,
        draft: Draft,
        location: Location,
    ) -> Result<NodeId, EvaluationError> {
        let mut base_uri = base_uri;
        let mut draft = draft;
        let mut location = location;
        // A target that is itself a resource root rebases and may switch dialects.
        if let Some(id) = draft.create_resource_ref(&contents).id() {
            let rebased = uri::resolve_against(&base_uri.borrow(), id)?;
            if rebased != base_uri {
                base_uri = rebased;
                location = Location::new();
            }
            draft = draft.detect(&contents).unwrap_or(draft);
        }
        let id = {
            let mut state = self.state.borrow_mut();
            let id = NodeId(state.nodes.len());
            state.nodes.push(None);
            state.interned.insert(absolute.as_str().to_string(), id);
            state.queue.push_back(Job {
                id,
                contents,
                base_uri: base_uri.clone(),
                draft,
                vocabularies: draft.default_vocabularies(),
                location,
                absolute,
            });
            id
        };
        self.ensure_scope(&base_uri)?;
        Ok(id)
    }

    /// Make a resource's dynamic anchors and recursive root addressable at
    /// evaluation time. Called once per resource base URI.
    fn ensure_scope(&self, base_uri: &Uri<String>) -> Result<(), EvaluationError> {
        if !self
            .state
            .borrow_mut()
            .scoped
            .insert(base_uri.as_str().to_string())
        {
            return Ok(());
        }
        let Some(resource) = self.registry.resource(base_uri) else {
            return Ok(());
        };
        if resource.draft() == Draft::Draft201909 && resource.has_recursive_anchor() {
            let root = self.resolve_resource_root(base_uri)?;
            self.state
                .borrow_mut()
                .recursive_roots
                .insert(base_uri.as_str().to_string(), root);
        }
        let dynamic: Vec<(String, Value, Draft)> = self
            .registry
            .anchors_of(base_uri)
            .filter(|anchor| anchor.is_dynamic())
            .map(|anchor| {
                (
                    anchor.name().to_string(),
                    anchor.resource().contents().clone(),
                    anchor.resource().draft(),
                )
            })
            .collect();
        for (name, contents, draft) in dynamic {
            let absolute = uri::resolve_against(&base_uri.borrow(), &format!("#{name}"))?;
            let existing = self.state.borrow().interned.get(absolute.as_str()).copied();
            let id = match existing {
                Some(id) => id,
                None => self.intern(absolute, contents, base_uri.clone(), draft, Location::new())?,
            };
            self.state
                .borrow_mut()
                .dynamic_anchors
                .entry(base_uri.as_str().to_string())
                .or_default()
                .insert(name, id);
        }
        Ok(())
    }
}

/// Turn the fragment of an absolute target URI back into a location, when it
/// is a JSON Pointer. Anchor fragments yield the root location.
fn fragment_location(absolute: &str) -> Location {
    let Some((_, fragment)) = absolute.split_once('#') else {
        return Location::new();
    };
    if !fragment.starts_with('/') {
        return Location::new();
    }
    let mut location = Location::new();
    for segment in fragment[1..].split('/') {
        let decoded = percent_encoding::percent_decode_str(segment)
            .decode_utf8()
            .map(|cow| cow.into_owned())
            .unwrap_or_else(|_| segment.to_string());
        let unescaped = crate::pointer::unescape(&decoded).unwrap_or(decoded);
        location.push(unescaped);
    }
    location
}

/// Build an [`Evaluator`] from a schema document.
pub(crate) fn build_evaluator(
    config: EvaluationOptions,
    schema: &Value,
) -> Result<Evaluator, EvaluationError> {
    if let Some(handle) = &config.cancellation {
        if handle.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(EvaluationError::Cancelled);
        }
    }
    let (draft, vocabularies) = dialect_of(&config, schema)?;

    let default_base = match &config.default_base_uri {
        Some(base) => uri::from_str(base)?,
        None => uri::DEFAULT_ROOT_URI.clone(),
    };
    let base_uri = match draft.create_resource_ref(schema).id() {
        Some(id) => uri::resolve_against(&default_base.borrow(), id)?,
        None => default_base,
    };

    let mut resources = Vec::with_capacity(1 + config.resources.len());
    resources.push((base_uri.as_str().to_string(), draft.create_resource(schema.clone())));
    for (uri, resource) in &config.resources {
        resources.push((uri.clone(), resource.clone()));
    }
    let registry = config
        .registry
        .clone()
        .unwrap_or_else(|| SPECIFICATIONS.clone())
        .try_with_resources_and_retriever(resources.into_iter(), &*config.retriever, draft)?;

    let state = RefCell::new(BuildState::new());
    let bootstrap = Context {
        state: &state,
        registry: &registry,
        config: &config,
        base_uri: base_uri.clone(),
        draft,
        vocabularies: vocabularies.clone(),
        location: Location::new(),
    };
    let root = bootstrap.resolve_resource_root(&base_uri)?;

    let mut first = true;
    loop {
        let job = match state.borrow_mut().queue.pop_front() {
            Some(job) => job,
            None => break,
        };
        let ctx = Context {
            state: &state,
            registry: &registry,
            config: &config,
            base_uri: job.base_uri,
            draft: job.draft,
            // The root resource keeps the vocabularies resolved from its
            // meta-schema; interned targets fall back to dialect defaults.
            vocabularies: if first {
                vocabularies.clone()
            } else {
                job.vocabularies
            },
            location: job.location,
        };
        first = false;
        let node = compile_schema(&ctx, &job.contents, job.absolute)?;
        state.borrow_mut().nodes[job.id.0] = Some(node);
    }

    let state = state.into_inner();
    let nodes = state
        .nodes
        .into_iter()
        .map(|node| node.expect("Every queued job was compiled"))
        .collect();
    let arena = Arena::new(
        nodes,
        state.dynamic_anchors,
        state.recursive_roots,
        state.collects_annotations,
    );
    Ok(Evaluator::new(root, arena, Arc::new(config)))
}

/// Resolve the dialect and vocabulary set for the root schema.
fn dialect_of(
    config: &EvaluationOptions,
    schema: &Value,
) -> Result<(Draft, VocabularySet), EvaluationError> {
    if let Some(draft) = config.dialect {
        return Ok((draft, draft.default_vocabularies()));
    }
    match Draft::default().detect(schema) {
        Ok(draft) => Ok((draft, draft.default_vocabularies())),
        Err(referencing::Error::UnknownSpecification { specification }) => {
            // Not one of the built-in dialects; a seeded custom meta-schema
            // may declare the vocabularies to evaluate under.
            let meta = config
                .resources
                .iter()
                .find(|(uri, _)| uri.trim_end_matches('#') == specification.trim_end_matches('#'))
                .map(|(_, resource)| resource);
            let Some(meta) = meta else {
                return Err(EvaluationError::malformed_schema(
                    String::new(),
                    format!("unknown $schema value '{specification}'"),
                ));
            };
            let draft = meta.draft();
            let Some((mut set, required)) = referencing::vocabularies::find(meta.contents())?
            else {
                return Ok((draft, draft.default_vocabularies()));
            };
            for uri in required {
                if !config.vocabularies.contains_key(uri.as_str()) {
                    return Err(EvaluationError::unknown_vocabulary(uri.as_str()));
                }
                set.add(Vocabulary::Custom(uri));
            }
            Ok((draft, set))
        }
        Err(other) => Err(other.into()),
    }
}

/// Compile one subschema into a node.
pub(crate) fn compile_schema(
    ctx: &Context,
    contents: &Value,
    absolute: Uri<String>,
) -> Result<SchemaNode, EvaluationError> {
    match contents {
        Value::Bool(value) => Ok(SchemaNode::new(
            NodeKind::Boolean(*value),
            ctx.base_uri.clone(),
            absolute,
            ctx.draft,
        )),
        Value::Object(schema) => {
            let mut compiled: Vec<CompiledKeyword> = Vec::with_capacity(schema.len());

            // Pre-2019 dialects: `$ref` makes every sibling keyword inert.
            if !ctx.supports_adjacent_validation() {
                if let Some(reference) = schema.get("$ref") {
                    if let Some(result) = ref_::compile_ref(ctx, schema, reference) {
                        compiled.push(CompiledKeyword {
                            name: "$ref".into(),
                            evaluator: result?,
                        });
                    }
                    order_keywords(&mut compiled);
                    return Ok(SchemaNode::new(
                        NodeKind::Keywords(compiled.into_boxed_slice()),
                        ctx.base_uri.clone(),
                        absolute,
                        ctx.draft,
                    ));
                }
            }

            for (keyword, value) in schema {
                if !keywords::dependencies(keyword).is_empty() {
                    ctx.state.borrow_mut().collects_annotations = true;
                }
                if let Some(factory) = ctx.config.get_keyword_factory(keyword) {
                    let evaluator = CustomKeyword::compile(ctx, schema, value, factory.as_ref())?;
                    compiled.push(CompiledKeyword {
                        name: keyword.clone().into(),
                        evaluator,
                    });
                } else if keyword == "$schema" {
                    // An embedded `$schema` outside a resource root is
                    // advisory: recorded, never a vocabulary switch.
                    if !ctx.location.is_empty() && !schema.contains_key("$id") {
                        compiled.push(CompiledKeyword {
                            name: keyword.clone().into(),
                            evaluator: annotation::compile(value.clone()),
                        });
                    }
                } else if let Some(compile_fn) = keywords::get_for_draft(ctx, keyword) {
                    if let Some(result) = compile_fn(ctx, schema, value) {
                        compiled.push(CompiledKeyword {
                            name: keyword.clone().into(),
                            evaluator: result?,
                        });
                    }
                } else if METADATA_KEYWORDS.contains(&keyword.as_str()) {
                    if ctx.has_vocabulary(&Vocabulary::Metadata) {
                        compiled.push(CompiledKeyword {
                            name: keyword.clone().into(),
                            evaluator: annotation::compile(value.clone()),
                        });
                    }
                } else if !ctx.draft().is_known_keyword(keyword)
                    && ctx.config.process_custom_keywords
                {
                    compiled.push(CompiledKeyword {
                        name: keyword.clone().into(),
                        evaluator: annotation::compile(value.clone()),
                    });
                }
            }
            order_keywords(&mut compiled);
            Ok(SchemaNode::new(
                NodeKind::Keywords(compiled.into_boxed_slice()),
                ctx.base_uri.clone(),
                absolute,
                ctx.draft,
            ))
        }
        _ => Err(ctx.malformed("a schema must be an object or a boolean")),
    }
}

/// Order keywords for dispatch: topological levels over annotation
/// dependencies, then declared priority, then name. The tie-break by name
/// keeps annotation delivery deterministic across runs.
fn order_keywords(compiled: &mut Vec<CompiledKeyword>) {
    let mut pending = std::mem::take(compiled);
    let mut placed: AHashSet<String> = AHashSet::with_capacity(pending.len());
    while !pending.is_empty() {
        // A dependency only constrains ordering when its producer is
        // actually present on this subschema.
        let present: AHashSet<&str> = pending.iter().map(|k| k.name.as_ref()).collect();
        let ready: Vec<bool> = pending
            .iter()
            .map(|keyword| {
                keywords::dependencies(&keyword.name)
                    .iter()
                    .all(|dep| placed.contains(*dep) || !present.contains(dep))
            })
            .collect();
        let mut level: Vec<CompiledKeyword> = Vec::new();
        let mut rest: Vec<CompiledKeyword> = Vec::new();
        for (keyword, ready) in pending.drain(..).zip(ready) {
            if ready {
                level.push(keyword);
            } else {
                rest.push(keyword);
            }
        }
        if level.is_empty() {
            // A dependency cycle cannot happen with the static tables; do
            // not loop forever if one is ever introduced.
            level = rest;
            rest = Vec::new();
        }
        level.sort_by(|a, b| {
            keywords::priority(&a.name)
                .cmp(&keywords::priority(&b.name))
                .then_with(|| a.name.cmp(&b.name))
        });
        for keyword in &level {
            placed.insert(keyword.name.to_string());
        }
        compiled.extend(level);
        pending = rest;
    }
}
