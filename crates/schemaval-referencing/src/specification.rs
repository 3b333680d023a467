use serde_json::Value;

use crate::{
    anchors::Anchor,
    segments::Segment,
    vocabularies::{
        VocabularySet, DRAFT_2019_09_VOCABULARIES, DRAFT_2020_12_VOCABULARIES,
        DRAFT_NEXT_VOCABULARIES,
    },
    Error, Resolver, Resource, ResourceRef, Segments,
};

/// JSON Schema dialect versions.
#[non_exhaustive]
#[derive(Debug, Default, PartialEq, Copy, Clone, Hash, Eq, PartialOrd, Ord)]
pub enum Draft {
    /// JSON Schema Draft 6
    Draft6,
    /// JSON Schema Draft 7
    Draft7,
    /// JSON Schema Draft 2019-09
    Draft201909,
    /// JSON Schema Draft 2020-12
    #[default]
    Draft202012,
    /// The `next` dialect published at `https://json-schema.org/draft/next/schema`.
    DraftNext,
}

/// Keyword positions whose value is a single subschema.
const IN_VALUE: &[&str] = &[
    "additionalItems",
    "additionalProperties",
    "contains",
    "contentSchema",
    "else",
    "if",
    "items",
    "not",
    "propertyNames",
    "then",
    "unevaluatedItems",
    "unevaluatedProperties",
];
/// Keyword positions whose value is an object of subschemas.
const IN_SUBVALUES: &[&str] = &[
    "$defs",
    "definitions",
    "dependencies",
    "dependentSchemas",
    "patternProperties",
    "properties",
];
/// Keyword positions whose value is an array of subschemas.
const IN_SUBARRAY: &[&str] = &["allOf", "anyOf", "items", "oneOf", "prefixItems"];

impl Draft {
    #[must_use]
    pub fn create_resource(self, contents: Value) -> Resource {
        Resource::new(contents, self)
    }
    #[must_use]
    pub fn create_resource_ref(self, contents: &Value) -> ResourceRef<'_> {
        ResourceRef::new(contents, self)
    }
    /// Detect which dialect applies to the given contents.
    ///
    /// # Errors
    ///
    /// On unknown `$schema` value it returns [`Error::UnknownSpecification`].
    pub fn detect(self, contents: &Value) -> Result<Draft, Error> {
        if let Some(schema) = contents
            .as_object()
            .and_then(|contents| contents.get("$schema"))
            .and_then(|schema| schema.as_str())
        {
            Ok(
                match schema.trim_end_matches('#').trim_start_matches("https:").trim_start_matches("http:") {
                    "//json-schema.org/draft/next/schema" => Draft::DraftNext,
                    "//json-schema.org/draft/2020-12/schema" => Draft::Draft202012,
                    "//json-schema.org/draft/2019-09/schema" => Draft::Draft201909,
                    "//json-schema.org/draft-07/schema" => Draft::Draft7,
                    "//json-schema.org/draft-06/schema" => Draft::Draft6,
                    _ => return Err(Error::unknown_specification(schema)),
                },
            )
        } else {
            Ok(self)
        }
    }
    /// The canonical meta-schema URI for this dialect.
    #[must_use]
    pub fn meta_uri(self) -> &'static str {
        match self {
            Draft::Draft6 => "http://json-schema.org/draft-06/schema",
            Draft::Draft7 => "http://json-schema.org/draft-07/schema",
            Draft::Draft201909 => "https://json-schema.org/draft/2019-09/schema",
            Draft::Draft202012 => "https://json-schema.org/draft/2020-12/schema",
            Draft::DraftNext => "https://json-schema.org/draft/next/schema",
        }
    }
    /// The resource identifier declared by `contents`, if any.
    ///
    /// All supported dialects use `$id`; values that are only an anchor
    /// (`#name`, Draft 6/7) do not rebase and are reported as `None`.
    pub(crate) fn id_of(self, contents: &Value) -> Option<&str> {
        let id = contents
            .as_object()
            .and_then(|schema| schema.get("$id"))
            .and_then(Value::as_str)?;
        if matches!(self, Draft::Draft6 | Draft::Draft7) && id.starts_with('#') {
            None
        } else {
            Some(id)
        }
    }
    /// Collect the anchors declared directly on `contents`.
    pub(crate) fn anchors<'a>(self, contents: &'a Value) -> Box<dyn Iterator<Item = Anchor> + 'a> {
        let Some(schema) = contents.as_object() else {
            return Box::new(std::iter::empty());
        };
        match self {
            Draft::Draft6 | Draft::Draft7 => Box::new(
                schema
                    .get("$id")
                    .and_then(Value::as_str)
                    .and_then(|id| id.strip_prefix('#'))
                    .map(|name| Anchor::plain(name, self.create_resource(contents.clone())))
                    .into_iter(),
            ),
            Draft::Draft201909 => Box::new(
                schema
                    .get("$anchor")
                    .and_then(Value::as_str)
                    .map(|name| Anchor::plain(name, self.create_resource(contents.clone())))
                    .into_iter(),
            ),
            Draft::Draft202012 | Draft::DraftNext => {
                let plain = schema
                    .get("$anchor")
                    .and_then(Value::as_str)
                    .map(|name| Anchor::plain(name, self.create_resource(contents.clone())));
                let dynamic = schema
                    .get("$dynamicAnchor")
                    .and_then(Value::as_str)
                    .map(|name| Anchor::dynamic(name, self.create_resource(contents.clone())));
                Box::new(plain.into_iter().chain(dynamic))
            }
        }
    }
    /// Iterate over the direct subschemas of `contents`.
    #[must_use]
    pub fn subresources_of<'a>(self, contents: &'a Value) -> Box<dyn Iterator<Item = &'a Value> + 'a> {
        let Some(schema) = contents.as_object() else {
            return Box::new(std::iter::empty());
        };
        let iter = schema.iter().flat_map(move |(keyword, value)| {
            let nested: Box<dyn Iterator<Item = &'a Value> + 'a> =
                if IN_VALUE.contains(&keyword.as_str()) {
                    Box::new(std::iter::once(value))
                } else if IN_SUBVALUES.contains(&keyword.as_str()) {
                    match value.as_object() {
                        Some(subvalues) => Box::new(subvalues.values()),
                        None => Box::new(std::iter::empty()),
                    }
                } else if IN_SUBARRAY.contains(&keyword.as_str()) {
                    match value.as_array() {
                        Some(subarray) => Box::new(subarray.iter()),
                        None => Box::new(std::iter::empty()),
                    }
                } else {
                    Box::new(std::iter::empty())
                };
            nested
        });
        Box::new(iter)
    }
    /// Evolve `resolver` if pointer resolution stepped into an embedded resource.
    pub(crate) fn maybe_in_subresource<'r>(
        self,
        segments: &Segments,
        resolver: &Resolver<'r>,
        subresource: ResourceRef<'r>,
    ) -> Result<Resolver<'r>, Error> {
        if subresource.id().is_some() && is_schema_position(segments) {
            resolver.in_subresource(subresource)
        } else {
            Ok(resolver.clone())
        }
    }
    /// Identifies known JSON schema keywords per dialect.
    #[must_use]
    pub fn is_known_keyword(&self, keyword: &str) -> bool {
        match keyword {
            "$id"
            | "$ref"
            | "$schema"
            | "additionalItems"
            | "additionalProperties"
            | "allOf"
            | "anyOf"
            | "const"
            | "contains"
            | "definitions"
            | "dependencies"
            | "enum"
            | "exclusiveMaximum"
            | "exclusiveMinimum"
            | "format"
            | "items"
            | "maxItems"
            | "maxLength"
            | "maxProperties"
            | "maximum"
            | "minItems"
            | "minLength"
            | "minProperties"
            | "minimum"
            | "multipleOf"
            | "not"
            | "oneOf"
            | "pattern"
            | "patternProperties"
            | "properties"
            | "propertyNames"
            | "required"
            | "type"
            | "uniqueItems" => true,

            "else" | "if" | "then" if *self >= Draft::Draft7 => true,

            "$anchor"
            | "$defs"
            | "$recursiveAnchor"
            | "$recursiveRef"
            | "$vocabulary"
            | "dependentRequired"
            | "dependentSchemas"
            | "maxContains"
            | "minContains"
            | "prefixItems"
            | "unevaluatedItems"
            | "unevaluatedProperties"
                if *self >= Draft::Draft201909 =>
            {
                true
            }

            "$dynamicAnchor" | "$dynamicRef" if *self >= Draft::Draft202012 => true,

            _ => false,
        }
    }

    /// The vocabularies a dialect recognizes when its meta-schema declares none.
    ///
    /// Draft 6 and 7 predate vocabularies; the empty set means "no filtering".
    #[must_use]
    pub fn default_vocabularies(self) -> VocabularySet {
        match self {
            Draft::Draft6 | Draft::Draft7 => VocabularySet::new(),
            Draft::Draft201909 => VocabularySet::from_known(DRAFT_2019_09_VOCABULARIES),
            Draft::Draft202012 => VocabularySet::from_known(DRAFT_2020_12_VOCABULARIES),
            Draft::DraftNext => VocabularySet::from_known(DRAFT_NEXT_VOCABULARIES),
        }
    }
}

fn is_schema_position(segments: &Segments) -> bool {
    match (segments.second_to_last(), segments.last()) {
        (_, Some(Segment::Key(key))) if IN_VALUE.contains(&key.as_ref()) => true,
        (Some(parent), Some(Segment::Key(_))) => parent
            .as_key()
            .is_some_and(|key| IN_SUBVALUES.contains(&key)),
        (Some(parent), Some(Segment::Index(_))) => parent
            .as_key()
            .is_some_and(|key| IN_SUBARRAY.contains(&key)),
        _ => false,
    }
}
