use core::fmt;
use std::str::FromStr;

use ahash::AHashSet;
use fluent_uri::Uri;
use serde_json::Value;

use crate::{uri, Error};

/// A named set of keyword types recognized by a dialect.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Vocabulary {
    Core,
    Applicator,
    Unevaluated,
    Validation,
    Metadata,
    /// Draft 2019-09 assertive `format`.
    Format,
    /// Draft 2020-12 / next annotation-only `format`.
    FormatAnnotation,
    /// Draft 2020-12 / next assertive `format`.
    FormatAssertion,
    Content,
    Custom(Uri<String>),
}

impl FromStr for Vocabulary {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "https://json-schema.org/draft/2020-12/vocab/core"
            | "https://json-schema.org/draft/2019-09/vocab/core"
            | "https://json-schema.org/draft/next/vocab/core" => Ok(Vocabulary::Core),
            "https://json-schema.org/draft/2020-12/vocab/applicator"
            | "https://json-schema.org/draft/2019-09/vocab/applicator"
            | "https://json-schema.org/draft/next/vocab/applicator" => Ok(Vocabulary::Applicator),
            "https://json-schema.org/draft/2020-12/vocab/unevaluated"
            | "https://json-schema.org/draft/next/vocab/unevaluated" => Ok(Vocabulary::Unevaluated),
            "https://json-schema.org/draft/2020-12/vocab/validation"
            | "https://json-schema.org/draft/2019-09/vocab/validation"
            | "https://json-schema.org/draft/next/vocab/validation" => Ok(Vocabulary::Validation),
            "https://json-schema.org/draft/2020-12/vocab/meta-data"
            | "https://json-schema.org/draft/2019-09/vocab/meta-data"
            | "https://json-schema.org/draft/next/vocab/meta-data" => Ok(Vocabulary::Metadata),
            "https://json-schema.org/draft/2019-09/vocab/format" => Ok(Vocabulary::Format),
            "https://json-schema.org/draft/2020-12/vocab/format-annotation"
            | "https://json-schema.org/draft/next/vocab/format-annotation" => {
                Ok(Vocabulary::FormatAnnotation)
            }
            "https://json-schema.org/draft/2020-12/vocab/format-assertion"
            | "https://json-schema.org/draft/next/vocab/format-assertion" => {
                Ok(Vocabulary::FormatAssertion)
            }
            "https://json-schema.org/draft/2020-12/vocab/content"
            | "https://json-schema.org/draft/2019-09/vocab/content"
            | "https://json-schema.org/draft/next/vocab/content" => Ok(Vocabulary::Content),
            _ => Ok(Vocabulary::Custom(uri::from_str(s)?)),
        }
    }
}

/// The set of vocabularies active for a schema resource.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct VocabularySet {
    known: u16,
    custom: AHashSet<Uri<String>>,
}

const KNOWN_NAMES: [(u16, &str); 9] = [
    (1 << 0, "core"),
    (1 << 1, "applicator"),
    (1 << 2, "unevaluated"),
    (1 << 3, "validation"),
    (1 << 4, "meta-data"),
    (1 << 5, "format"),
    (1 << 6, "format-annotation"),
    (1 << 7, "format-assertion"),
    (1 << 8, "content"),
];

impl fmt::Debug for VocabularySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug_list = f.debug_list();
        for (bit, name) in KNOWN_NAMES {
            if self.known & bit != 0 {
                debug_list.entry(&name);
            }
        }
        if !self.custom.is_empty() {
            let mut custom: Vec<_> = self.custom.iter().map(Uri::as_str).collect();
            custom.sort_unstable();
            for uri in custom {
                debug_list.entry(&uri);
            }
        }
        debug_list.finish()
    }
}

impl VocabularySet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_known(known: u16) -> Self {
        Self {
            known,
            custom: AHashSet::new(),
        }
    }

    pub fn add(&mut self, vocabulary: Vocabulary) {
        match vocabulary {
            Vocabulary::Core => self.known |= 1 << 0,
            Vocabulary::Applicator => self.known |= 1 << 1,
            Vocabulary::Unevaluated => self.known |= 1 << 2,
            Vocabulary::Validation => self.known |= 1 << 3,
            Vocabulary::Metadata => self.known |= 1 << 4,
            Vocabulary::Format => self.known |= 1 << 5,
            Vocabulary::FormatAnnotation => self.known |= 1 << 6,
            Vocabulary::FormatAssertion => self.known |= 1 << 7,
            Vocabulary::Content => self.known |= 1 << 8,
            Vocabulary::Custom(uri) => {
                self.custom.insert(uri);
            }
        }
    }

    #[must_use]
    pub fn contains(&self, vocabulary: &Vocabulary) -> bool {
        match vocabulary {
            Vocabulary::Core => self.known & (1 << 0) != 0,
            Vocabulary::Applicator => self.known & (1 << 1) != 0,
            Vocabulary::Unevaluated => self.known & (1 << 2) != 0,
            Vocabulary::Validation => self.known & (1 << 3) != 0,
            Vocabulary::Metadata => self.known & (1 << 4) != 0,
            Vocabulary::Format => self.known & (1 << 5) != 0,
            Vocabulary::FormatAnnotation => self.known & (1 << 6) != 0,
            Vocabulary::FormatAssertion => self.known & (1 << 7) != 0,
            Vocabulary::Content => self.known & (1 << 8) != 0,
            Vocabulary::Custom(uri) => self.custom.contains(uri),
        }
    }

    pub(crate) fn custom(&self) -> impl Iterator<Item = &Uri<String>> {
        self.custom.iter()
    }
}

pub(crate) const DRAFT_2019_09_VOCABULARIES: u16 = 0b1_0001_1011;
pub(crate) const DRAFT_2020_12_VOCABULARIES: u16 = 0b1_0101_1111;
pub(crate) const DRAFT_NEXT_VOCABULARIES: u16 = 0b1_0101_1111;

/// Read a `$vocabulary` declaration from a meta-schema document.
///
/// Returns `None` when the document carries no declaration; vocabularies
/// marked `false` are still added to the set so unknown-but-optional
/// vocabularies do not fail resolution (the caller decides what to do with
/// required ones).
pub fn find(document: &Value) -> Result<Option<(VocabularySet, Vec<Uri<String>>)>, Error> {
    let Some(declaration) = document.get("$vocabulary").and_then(Value::as_object) else {
        return Ok(None);
    };
    let mut set = VocabularySet::new();
    let mut required = Vec::new();
    for (uri, mandatory) in declaration {
        let vocabulary = Vocabulary::from_str(uri)?;
        if mandatory.as_bool().unwrap_or(false) {
            if let Vocabulary::Custom(uri) = &vocabulary {
                required.push(uri.clone());
            }
        }
        set.add(vocabulary);
    }
    Ok(Some((set, required)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(Vocabulary::Core)]
    #[test_case(Vocabulary::Applicator)]
    #[test_case(Vocabulary::Unevaluated)]
    #[test_case(Vocabulary::Validation)]
    #[test_case(Vocabulary::Metadata)]
    #[test_case(Vocabulary::Format)]
    #[test_case(Vocabulary::FormatAnnotation)]
    #[test_case(Vocabulary::FormatAssertion)]
    #[test_case(Vocabulary::Content)]
    fn add_then_contains(vocabulary: Vocabulary) {
        let mut set = VocabularySet::new();
        assert!(!set.contains(&vocabulary));
        set.add(vocabulary.clone());
        assert!(set.contains(&vocabulary));
    }

    #[test]
    fn known_sets() {
        let set = VocabularySet::from_known(DRAFT_2019_09_VOCABULARIES);
        // The 2019-09 format vocabulary is annotation-only unless a
        // meta-schema opts into the assertive one.
        assert!(!set.contains(&Vocabulary::Format));
        assert!(!set.contains(&Vocabulary::Unevaluated));
        let set = VocabularySet::from_known(DRAFT_2020_12_VOCABULARIES);
        assert!(set.contains(&Vocabulary::Unevaluated));
        assert!(set.contains(&Vocabulary::FormatAnnotation));
        assert!(!set.contains(&Vocabulary::FormatAssertion));
    }

    #[test]
    fn find_reads_declarations() {
        let (set, required) = find(&json!({
            "$vocabulary": {
                "https://json-schema.org/draft/2020-12/vocab/core": true,
                "https://example.com/vocab/custom": true,
                "https://example.com/vocab/optional": false,
            }
        }))
        .expect("Invalid vocabulary")
        .expect("Declaration is present");
        assert!(set.contains(&Vocabulary::Core));
        assert_eq!(required.len(), 1);
        assert_eq!(required[0].as_str(), "https://example.com/vocab/custom");
    }

    #[test]
    fn find_without_declaration() {
        assert!(find(&json!({"type": "object"}))
            .expect("Invalid vocabulary")
            .is_none());
    }

    #[test]
    fn debug_output() {
        let mut set = VocabularySet::from_known(0b0000_0011);
        set.add(Vocabulary::Custom(
            crate::uri::from_str("https://example.com/custom-vocab").expect("Invalid URI"),
        ));
        assert_eq!(
            format!("{set:?}"),
            "[\"core\", \"applicator\", \"https://example.com/custom-vocab\"]"
        );
    }
}
