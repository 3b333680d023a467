use core::fmt;

use fluent_uri::Uri;
use serde_json::Value;

use crate::{uri, Draft, Error, Registry, ResourceRef};

/// A reference resolver.
///
/// Resolves references against its base URI and looks the result up in the
/// registry. Resolvers are lexical: dynamic scope is owned by the evaluation
/// context, which re-resolves through the registry when reparenting.
#[derive(Clone)]
pub struct Resolver<'r> {
    registry: &'r Registry,
    base_uri: Uri<String>,
}

impl PartialEq for Resolver<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.base_uri == other.base_uri
    }
}
impl Eq for Resolver<'_> {}

impl fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("base_uri", &self.base_uri.as_str())
            .finish()
    }
}

impl<'r> Resolver<'r> {
    pub(crate) fn new(registry: &'r Registry, base_uri: Uri<String>) -> Self {
        Self { registry, base_uri }
    }
    #[must_use]
    pub fn base_uri(&self) -> &Uri<String> {
        &self.base_uri
    }
    #[must_use]
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }
    /// Resolve a reference to the resource it points to.
    ///
    /// # Errors
    ///
    /// If the reference is invalid or the target is not present in the registry.
    pub fn lookup(&self, reference: &str) -> Result<Resolved<'r>, Error> {
        let (uri, fragment) = if let Some(fragment) = reference.strip_prefix('#') {
            (self.base_uri.clone(), fragment)
        } else {
            let (uri, fragment) = reference
                .rsplit_once('#')
                .unwrap_or((reference, ""));
            (uri::resolve_against(&self.base_uri.borrow(), uri)?, fragment)
        };

        let resource = self.registry.get(&uri)?;
        let resolver = self.evolve(uri.clone());

        if fragment.starts_with('/') {
            return resource.pointer(fragment, resolver);
        }
        if !fragment.is_empty() {
            let anchor = self.registry.anchor(&uri, fragment)?;
            return anchor.resolve(resolver);
        }
        Ok(Resolved::new(resource.contents(), resolver, resource.draft()))
    }
    /// Create a resolver for a subresource, rebasing on its `$id` if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource id cannot be resolved against the
    /// base URI of this resolver.
    pub fn in_subresource(&self, subresource: ResourceRef) -> Result<Self, Error> {
        if let Some(id) = subresource.id() {
            let base_uri = uri::resolve_against(&self.base_uri.borrow(), id)?;
            Ok(self.evolve(base_uri))
        } else {
            Ok(self.clone())
        }
    }
    fn evolve(&self, base_uri: Uri<String>) -> Resolver<'r> {
        Resolver {
            registry: self.registry,
            base_uri,
        }
    }
}

/// A reference resolved to its contents by a [`Resolver`].
#[derive(Debug)]
pub struct Resolved<'r> {
    contents: &'r Value,
    resolver: Resolver<'r>,
    draft: Draft,
}

impl<'r> Resolved<'r> {
    pub(crate) fn new(contents: &'r Value, resolver: Resolver<'r>, draft: Draft) -> Self {
        Self {
            contents,
            resolver,
            draft,
        }
    }
    /// Resolved contents.
    #[must_use]
    pub fn contents(&self) -> &'r Value {
        self.contents
    }
    /// The resolver that resolved this reference.
    #[must_use]
    pub fn resolver(&self) -> &Resolver<'r> {
        &self.resolver
    }
    /// The dialect governing the resolved contents.
    #[must_use]
    pub fn draft(&self) -> Draft {
        self.draft
    }
    #[must_use]
    pub fn into_inner(self) -> (&'r Value, Resolver<'r>, Draft) {
        (self.contents, self.resolver, self.draft)
    }
}
