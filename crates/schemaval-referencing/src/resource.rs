use std::borrow::Cow;

use serde_json::Value;

use crate::{anchors::Anchor, Draft, Error, Resolved, Resolver, Segments};

/// A document with a concrete interpretation under a JSON Schema dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    contents: Value,
    draft: Draft,
}

impl Resource {
    pub(crate) fn new(contents: Value, draft: Draft) -> Self {
        Self { contents, draft }
    }
    /// Resource contents.
    #[must_use]
    pub fn contents(&self) -> &Value {
        &self.contents
    }
    /// The dialect under which the contents are interpreted.
    #[must_use]
    pub fn draft(&self) -> Draft {
        self.draft
    }
    /// Create a resource, detecting which dialect applies to the contents.
    ///
    /// # Errors
    ///
    /// On unknown `$schema` value it returns [`Error::UnknownSpecification`].
    pub fn from_contents(contents: Value) -> Result<Resource, Error> {
        Self::from_contents_and_specification(contents, Draft::default())
    }

    pub(crate) fn from_contents_and_specification(
        contents: Value,
        draft: Draft,
    ) -> Result<Resource, Error> {
        Ok(draft.detect(&contents)?.create_resource(contents))
    }
    /// Resource identifier.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.as_ref().id()
    }
    /// Whether the resource root opts into Draft 2019-09 recursive reparenting.
    #[must_use]
    pub fn has_recursive_anchor(&self) -> bool {
        self.contents
            .get("$recursiveAnchor")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub(crate) fn subresources(&self) -> impl Iterator<Item = Result<Resource, Error>> + '_ {
        self.draft.subresources_of(&self.contents).map(|contents| {
            Resource::from_contents_and_specification(contents.clone(), self.draft)
        })
    }

    pub(crate) fn anchors(&self) -> impl Iterator<Item = Anchor> + '_ {
        self.draft.anchors(&self.contents)
    }

    /// Resolve a JSON Pointer fragment inside this resource.
    ///
    /// The resolver evolves whenever the pointer crosses into an embedded
    /// resource, so the returned [`Resolved`] carries the right base URI.
    pub(crate) fn pointer<'r>(
        &'r self,
        pointer: &str,
        mut resolver: Resolver<'r>,
    ) -> Result<Resolved<'r>, Error> {
        // INVARIANT: the pointer always starts with `/`
        let mut contents = &self.contents;
        let mut segments = Segments::new();
        let original_pointer = pointer;
        let pointer = percent_encoding::percent_decode_str(&pointer[1..])
            .decode_utf8()
            .map_err(|err| Error::invalid_percent_encoding(original_pointer, err))?;
        for segment in pointer.split('/') {
            if let Some(array) = contents.as_array() {
                let idx = segment
                    .parse::<usize>()
                    .map_err(|err| Error::invalid_array_index(original_pointer, segment, err))?;
                contents = array
                    .get(idx)
                    .ok_or_else(|| Error::pointer_to_nowhere(original_pointer))?;
                segments.push(idx);
            } else {
                let segment = unescape_segment(segment);
                contents = contents
                    .get(segment.as_ref())
                    .ok_or_else(|| Error::pointer_to_nowhere(original_pointer))?;
                segments.push(segment);
            }
            resolver = self.draft.maybe_in_subresource(
                &segments,
                &resolver,
                self.draft.create_resource_ref(contents),
            )?;
        }
        Ok(Resolved::new(contents, resolver, self.draft))
    }
    /// A reference to the underlying contents together with the dialect.
    #[must_use]
    pub fn as_ref(&self) -> ResourceRef<'_> {
        ResourceRef::new(&self.contents, self.draft)
    }
}

/// A borrowed document with a concrete interpretation under a JSON Schema dialect.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceRef<'a> {
    contents: &'a Value,
    draft: Draft,
}

impl<'a> ResourceRef<'a> {
    /// Create a new resource reference.
    #[must_use]
    pub fn new(contents: &'a Value, draft: Draft) -> Self {
        ResourceRef { contents, draft }
    }
    /// Resource identifier.
    #[must_use]
    pub fn id(&self) -> Option<&'a str> {
        self.draft
            .id_of(self.contents)
            .map(|id| id.trim_end_matches('#'))
    }
    /// Resource contents.
    #[must_use]
    pub fn contents(&self) -> &'a Value {
        self.contents
    }
    #[must_use]
    pub fn draft(&self) -> Draft {
        self.draft
    }
}

fn unescape_segment(segment: &str) -> Cow<'_, str> {
    if !segment.contains('~') {
        return Cow::Borrowed(segment);
    }
    let mut buffer = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(ch) = chars.next() {
        if ch != '~' {
            buffer.push(ch);
            continue;
        }
        match chars.next() {
            Some('0') => buffer.push('~'),
            Some('1') => buffer.push('/'),
            Some(other) => {
                buffer.push('~');
                buffer.push(other);
            }
            None => buffer.push('~'),
        }
    }
    Cow::Owned(buffer)
}
