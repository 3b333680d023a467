use std::{collections::VecDeque, sync::Arc};

use ahash::{AHashMap, AHashSet};
use fluent_uri::Uri;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::{anchors::Anchor, meta, uri, DefaultRetriever, Draft, Error, Resolver, Resource, Retrieve};

type ResourceMap = AHashMap<Uri<String>, Arc<Resource>>;
type AnchorMap = AHashMap<Uri<String>, AHashMap<String, Anchor>>;

/// A registry holding the meta-schemas of every supported dialect.
pub static SPECIFICATIONS: Lazy<Registry> = Lazy::new(|| {
    let pairs = meta::META_SCHEMAS
        .iter()
        .map(|(uri, schema)| (*uri, Resource::from_contents((*schema).clone()).expect("Invalid meta-schema")));
    let mut resources = ResourceMap::with_capacity(meta::META_SCHEMAS.len());
    let mut anchors = AnchorMap::new();
    process_resources(pairs, &DefaultRetriever, &mut resources, &mut anchors, Draft::default())
        .expect("Failed to process meta-schemas");
    Registry { resources, anchors }
});

/// A registry of JSON Schema resources, each identified by their canonical URIs.
///
/// Registries eagerly process added resources, including their embedded
/// subresources and anchors, and transitively fetch referenced external
/// documents through the configured [`Retrieve`] implementation. After
/// construction a registry is immutable and can be shared freely across
/// concurrent evaluations.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    resources: ResourceMap,
    anchors: AnchorMap,
}

/// Configuration options for creating a [`Registry`].
pub struct RegistryOptions {
    retriever: Box<dyn Retrieve>,
    draft: Draft,
}

impl RegistryOptions {
    /// Create a new [`RegistryOptions`] with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            retriever: Box::new(DefaultRetriever),
            draft: Draft::default(),
        }
    }
    /// Set a custom retriever for the [`Registry`].
    #[must_use]
    pub fn retriever(mut self, retriever: Box<dyn Retrieve>) -> Self {
        self.retriever = retriever;
        self
    }
    /// Set the dialect under which resources without `$schema` are interpreted.
    #[must_use]
    pub fn draft(mut self, draft: Draft) -> Self {
        self.draft = draft;
        self
    }
    /// Create a [`Registry`] with a single resource using these options.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is invalid or there is an issue processing
    /// the resource.
    pub fn try_new(self, uri: impl Into<String>, resource: Resource) -> Result<Registry, Error> {
        Registry::try_from_resources_impl([(uri, resource)].into_iter(), &*self.retriever, self.draft)
    }
    /// Create a [`Registry`] from multiple resources using these options.
    ///
    /// # Errors
    ///
    /// Returns an error if any URI is invalid or there is an issue processing
    /// the resources.
    pub fn try_from_resources(
        self,
        pairs: impl Iterator<Item = (impl Into<String>, Resource)>,
    ) -> Result<Registry, Error> {
        Registry::try_from_resources_impl(pairs, &*self.retriever, self.draft)
    }
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Get [`RegistryOptions`] for configuring a new [`Registry`].
    #[must_use]
    pub fn options() -> RegistryOptions {
        RegistryOptions::new()
    }
    /// Create a new [`Registry`] with a single resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is invalid or there is an issue processing
    /// the resource.
    pub fn try_new(uri: impl Into<String>, resource: Resource) -> Result<Self, Error> {
        Self::try_from_resources_impl([(uri, resource)].into_iter(), &DefaultRetriever, Draft::default())
    }
    /// Create a new [`Registry`] from an iterator of `(URI, Resource)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if any URI is invalid or there is an issue processing
    /// the resources.
    pub fn try_from_resources(
        pairs: impl Iterator<Item = (impl Into<String>, Resource)>,
    ) -> Result<Self, Error> {
        Self::try_from_resources_impl(pairs, &DefaultRetriever, Draft::default())
    }
    fn try_from_resources_impl(
        pairs: impl Iterator<Item = (impl Into<String>, Resource)>,
        retriever: &dyn Retrieve,
        draft: Draft,
    ) -> Result<Self, Error> {
        let mut resources = ResourceMap::new();
        let mut anchors = AnchorMap::new();
        process_resources(pairs, retriever, &mut resources, &mut anchors, draft)?;
        Ok(Registry { resources, anchors })
    }
    /// Create a new registry extended with a resource.
    ///
    /// Re-adding a URI with identical contents is a no-op; re-adding it with
    /// different contents is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is invalid, already registered with other
    /// contents, or there is an issue processing the resource.
    pub fn try_with_resource(
        self,
        uri: impl Into<String>,
        resource: Resource,
    ) -> Result<Registry, Error> {
        let draft = resource.draft();
        self.try_with_resources_and_retriever([(uri, resource)].into_iter(), &DefaultRetriever, draft)
    }
    /// Create a new registry extended with resources, fetching external
    /// references through `retriever`.
    ///
    /// # Errors
    ///
    /// Returns an error if any URI is invalid, already registered with other
    /// contents, or there is an issue processing the resources.
    pub fn try_with_resources_and_retriever(
        self,
        pairs: impl Iterator<Item = (impl Into<String>, Resource)>,
        retriever: &dyn Retrieve,
        draft: Draft,
    ) -> Result<Registry, Error> {
        let mut resources = self.resources;
        let mut anchors = self.anchors;
        process_resources(pairs, retriever, &mut resources, &mut anchors, draft)?;
        Ok(Registry { resources, anchors })
    }
    /// Create a new [`Resolver`] for this registry with the given base URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URI is invalid.
    pub fn try_resolver(&self, base_uri: &str) -> Result<Resolver, Error> {
        Ok(self.resolver(uri::from_str(base_uri)?))
    }
    /// Create a new [`Resolver`] for this registry with a known valid base URI.
    #[must_use]
    pub fn resolver(&self, base_uri: Uri<String>) -> Resolver {
        Resolver::new(self, base_uri)
    }
    /// The resource registered under `uri`, if any.
    #[must_use]
    pub fn resource(&self, uri: &Uri<String>) -> Option<&Arc<Resource>> {
        self.resources.get(uri)
    }
    pub(crate) fn get(&self, uri: &Uri<String>) -> Result<&Resource, Error> {
        self.resources.get(uri).map(AsRef::as_ref).ok_or_else(|| {
            Error::unretrievable(
                uri.as_str(),
                Some("Retrieving external resources is not supported once the registry is populated".into()),
            )
        })
    }
    /// Look up an anchor registered for `uri`.
    ///
    /// # Errors
    ///
    /// Returns an error when the anchor does not exist or could never exist.
    pub fn anchor(&self, uri: &Uri<String>, name: &str) -> Result<&Anchor, Error> {
        if let Some(anchor) = self.anchors.get(uri).and_then(|names| names.get(name)) {
            return Ok(anchor);
        }
        if name.contains('/') {
            Err(Error::invalid_anchor(name))
        } else {
            Err(Error::no_such_anchor(name))
        }
    }
    /// Look up a `$dynamicAnchor` registered for `uri`.
    #[must_use]
    pub fn dynamic_anchor(&self, uri: &Uri<String>, name: &str) -> Option<&Anchor> {
        self.anchors
            .get(uri)
            .and_then(|names| names.get(name))
            .filter(|anchor| anchor.is_dynamic())
    }
    /// Iterate over every anchor registered for `uri`.
    pub fn anchors_of(&self, uri: &Uri<String>) -> impl Iterator<Item = &Anchor> {
        self.anchors
            .get(uri)
            .into_iter()
            .flat_map(|names| names.values())
    }
}

fn process_resources(
    pairs: impl Iterator<Item = (impl Into<String>, Resource)>,
    retriever: &dyn Retrieve,
    resources: &mut ResourceMap,
    anchors: &mut AnchorMap,
    default_draft: Draft,
) -> Result<(), Error> {
    let mut queue = VecDeque::with_capacity(32);
    let mut seen = AHashSet::new();
    let mut external = AHashSet::new();

    for (uri, resource) in pairs {
        let uri = uri::from_str(uri.into().trim_end_matches('#'))?;
        let resource = Arc::new(resource);
        match resources.get(&uri) {
            Some(existing) if existing.contents() == resource.contents() => continue,
            Some(_) => return Err(Error::duplicate_resource(uri.as_str())),
            None => {}
        }
        resources.insert(uri.clone(), Arc::clone(&resource));
        queue.push_back((uri, resource));
    }

    loop {
        if queue.is_empty() && external.is_empty() {
            break;
        }

        // Drain the queue, collecting references to external resources.
        while let Some((mut base, resource)) = queue.pop_front() {
            if let Some(id) = resource.id() {
                base = uri::resolve_against(&base.borrow(), id)?;
            }

            for anchor in resource.anchors() {
                anchors
                    .entry(base.clone())
                    .or_default()
                    .insert(anchor.name().to_string(), anchor);
            }

            collect_external_references(&base, resource.contents(), &mut external, &mut seen)?;

            for subresource in resource.subresources() {
                let subresource = Arc::new(subresource?);
                queue.push_back((base.clone(), subresource));
            }
            if resource.id().is_some() {
                match resources.get(&base) {
                    Some(existing) if existing.contents() == resource.contents() => {}
                    Some(_) => return Err(Error::duplicate_resource(base.as_str())),
                    None => {
                        resources.insert(base, resource);
                    }
                }
            }
        }
        // Fetch whatever external documents the drained resources referenced.
        for uri in external.drain() {
            if !resources.contains_key(&uri) {
                let retrieved = retriever
                    .retrieve(&uri)
                    .map_err(|err| Error::unretrievable(uri.as_str(), Some(err)))?;
                let resource =
                    Arc::new(Resource::from_contents_and_specification(retrieved, default_draft)?);
                resources.insert(uri.clone(), Arc::clone(&resource));
                queue.push_back((uri, resource));
            }
        }
    }

    Ok(())
}

fn collect_external_references(
    base: &Uri<String>,
    contents: &Value,
    collected: &mut AHashSet<Uri<String>>,
    seen: &mut AHashSet<(String, String)>,
) -> Result<(), Error> {
    if base.scheme().as_str() == "urn" {
        return Ok(());
    }
    for keyword in ["$ref", "$dynamicRef"] {
        let Some(reference) = contents.get(keyword).and_then(Value::as_str) else {
            continue;
        };
        if reference.starts_with('#') {
            continue;
        }
        if !seen.insert((base.as_str().to_string(), reference.to_string())) {
            continue;
        }
        let resolved = uri::resolve_against(&base.borrow(), reference)?;
        let document = resolved
            .as_str()
            .split_once('#')
            .map_or_else(|| resolved.as_str().to_string(), |(doc, _)| doc.to_string());
        collected.insert(uri::from_str(&document)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ahash::AHashMap;
    use fluent_uri::Uri;
    use serde_json::{json, Value};
    use test_case::test_case;

    use crate::{Draft, Registry, Resource, Retrieve};

    struct TestRetriever {
        schemas: AHashMap<String, Value>,
    }

    impl Retrieve for TestRetriever {
        fn retrieve(
            &self,
            uri: &Uri<String>,
        ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
            self.schemas
                .get(uri.as_str())
                .cloned()
                .ok_or_else(|| format!("Failed to find {}", uri.as_str()).into())
        }
    }

    fn retriever(schemas: &[(&str, Value)]) -> TestRetriever {
        TestRetriever {
            schemas: schemas
                .iter()
                .map(|&(k, ref v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    struct TestCase {
        input_resources: Vec<(&'static str, Value)>,
        remote_resources: Vec<(&'static str, Value)>,
        expected_resolved_uris: Vec<&'static str>,
    }

    #[test_case(
        TestCase {
            input_resources: vec![
                ("http://example.com/schema1", json!({"$ref": "http://example.com/schema2"})),
            ],
            remote_resources: vec![
                ("http://example.com/schema2", json!({"type": "object"})),
            ],
            expected_resolved_uris: vec!["http://example.com/schema1", "http://example.com/schema2"],
        }
    ;"external ref at top")]
    #[test_case(
        TestCase {
            input_resources: vec![
                ("http://example.com/schema1", json!({
                    "$defs": {"subschema": {"type": "string"}},
                    "$ref": "#/$defs/subschema"
                })),
            ],
            remote_resources: vec![],
            expected_resolved_uris: vec!["http://example.com/schema1"],
        }
    ;"internal ref at top")]
    #[test_case(
        TestCase {
            input_resources: vec![
                ("http://example.com/schema1", json!({
                    "type": "object",
                    "properties": {
                        "prop1": {"$ref": "http://example.com/schema2"}
                    }
                })),
            ],
            remote_resources: vec![
                ("http://example.com/schema2", json!({"type": "string"})),
            ],
            expected_resolved_uris: vec!["http://example.com/schema1", "http://example.com/schema2"],
        }
    ;"external ref in subresource")]
    #[test_case(
        TestCase {
            input_resources: vec![
                ("http://example.com/schema1", json!({"$ref": "http://example.com/schema2"})),
            ],
            remote_resources: vec![
                ("http://example.com/schema2", json!({"$ref": "http://example.com/schema3"})),
                ("http://example.com/schema3", json!({"$ref": "http://example.com/schema1"})),
            ],
            expected_resolved_uris: vec![
                "http://example.com/schema1",
                "http://example.com/schema2",
                "http://example.com/schema3",
            ],
        }
    ;"external reference cycle")]
    fn references_processing(test_case: TestCase) {
        let retriever = retriever(&test_case.remote_resources);
        let input_pairs = test_case.input_resources.clone().into_iter().map(|(uri, value)| {
            (uri, Resource::from_contents(value).expect("Invalid resource"))
        });
        let registry = Registry::options()
            .retriever(Box::new(retriever))
            .try_from_resources(input_pairs)
            .expect("Invalid resources");
        for uri in test_case.expected_resolved_uris {
            let resolver = registry.try_resolver("").expect("Invalid base URI");
            assert!(resolver.lookup(uri).is_ok());
        }
    }

    #[test]
    fn default_retriever_does_not_fetch() {
        let result = Registry::try_from_resources(
            [(
                "http://example.com/schema1",
                Resource::from_contents(json!({"$ref": "http://example.com/schema2"}))
                    .expect("Invalid resource"),
            )]
            .into_iter(),
        );
        let error = result.expect_err("Should fail");
        assert_eq!(
            error.to_string(),
            "Resource 'http://example.com/schema2' is not present in a registry and retrieving it failed: Default retriever does not fetch resources"
        );
    }

    #[test]
    fn identical_reregistration_is_a_noop() {
        let contents = json!({"type": "object"});
        let registry = Registry::try_new(
            "http://example.com/schema",
            Draft::Draft202012.create_resource(contents.clone()),
        )
        .expect("Invalid resource");
        let registry = registry
            .try_with_resource(
                "http://example.com/schema",
                Draft::Draft202012.create_resource(contents),
            )
            .expect("Identical contents should be accepted");
        assert!(registry.try_resolver("").expect("Invalid base URI").lookup("http://example.com/schema").is_ok());
    }

    #[test]
    fn conflicting_reregistration_is_an_error() {
        let registry = Registry::try_new(
            "http://example.com/schema",
            Draft::Draft202012.create_resource(json!({"type": "object"})),
        )
        .expect("Invalid resource");
        let error = registry
            .try_with_resource(
                "http://example.com/schema",
                Draft::Draft202012.create_resource(json!({"type": "string"})),
            )
            .expect_err("Conflicting contents should be rejected");
        assert_eq!(
            error.to_string(),
            "Resource 'http://example.com/schema' is already registered with different contents"
        );
    }

    #[test]
    fn anchors_are_discovered() {
        let registry = Registry::try_new(
            "http://example.com/schema",
            Draft::Draft202012.create_resource(json!({
                "$defs": {
                    "a": {"$anchor": "plain", "type": "string"},
                    "b": {"$dynamicAnchor": "node", "type": "integer"}
                }
            })),
        )
        .expect("Invalid resource");
        let uri = crate::uri::from_str("http://example.com/schema").expect("Invalid URI");
        assert!(!registry.anchor(&uri, "plain").expect("Anchor is present").is_dynamic());
        assert!(registry.dynamic_anchor(&uri, "node").is_some());
        assert!(registry.dynamic_anchor(&uri, "plain").is_none());
        assert_eq!(
            registry.anchor(&uri, "missing").expect_err("No such anchor").to_string(),
            "Anchor 'missing' does not exist"
        );
    }
}
