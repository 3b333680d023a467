use std::sync::Arc;

use crate::{Error, Resolved, Resolver, Resource};

/// A named location within a schema resource.
///
/// Draft 6/7 spell anchors as `$id: "#name"`, Draft 2019-09 as `$anchor`, and
/// Draft 2020-12 adds `$dynamicAnchor`. The registry keys anchors by
/// `(resource base URI, name)`; dynamic reparenting is the evaluator's job,
/// so resolution here is always lexical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    name: String,
    dynamic: bool,
    resource: Arc<Resource>,
}

impl Anchor {
    pub(crate) fn plain(name: impl Into<String>, resource: Resource) -> Self {
        Anchor {
            name: name.into(),
            dynamic: false,
            resource: Arc::new(resource),
        }
    }
    pub(crate) fn dynamic(name: impl Into<String>, resource: Resource) -> Self {
        Anchor {
            name: name.into(),
            dynamic: true,
            resource: Arc::new(resource),
        }
    }
    /// Anchor name without the leading `#`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Whether this anchor participates in `$dynamicRef` reparenting.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }
    /// The subschema this anchor marks.
    #[must_use]
    pub fn resource(&self) -> &Resource {
        &self.resource
    }
    /// Resolve the anchor to its subschema contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the anchored subschema declares an unresolvable `$id`.
    pub fn resolve<'r>(&'r self, resolver: Resolver<'r>) -> Result<Resolved<'r>, Error> {
        let resolver = resolver.in_subresource((*self.resource).as_ref())?;
        Ok(Resolved::new(
            self.resource.contents(),
            resolver,
            self.resource.draft(),
        ))
    }
}
