//! Structural errors that abort an evaluation.
//!
//! Validation failures are data in the result tree and never surface here;
//! this type covers the conditions under which no truthful result tree can
//! be produced at all.
use core::fmt;

/// An error that aborts evaluation or evaluator construction.
#[derive(Debug)]
pub enum EvaluationError {
    /// A reference could not be resolved to a schema.
    ReferenceResolution { uri: String, reason: String },
    /// A `$ref` chain re-entered the same schema at the same instance
    /// location without consuming any instance structure.
    ReferenceCycle {
        schema_uri: String,
        instance_location: String,
    },
    /// The schema document is not a valid schema.
    MalformedSchema { location: String, reason: String },
    /// A meta-schema requires a vocabulary this evaluator does not know.
    UnknownVocabulary { uri: String },
    /// An unknown `format` under strict format options.
    UnknownFormat { name: String },
    /// The loader failed to fetch an external document.
    Loader {
        uri: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The caller's cancellation handle tripped.
    Cancelled,
}

impl EvaluationError {
    pub(crate) fn reference_resolution(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        EvaluationError::ReferenceResolution {
            uri: uri.into(),
            reason: reason.into(),
        }
    }
    pub(crate) fn reference_cycle(
        schema_uri: impl Into<String>,
        instance_location: impl Into<String>,
    ) -> Self {
        EvaluationError::ReferenceCycle {
            schema_uri: schema_uri.into(),
            instance_location: instance_location.into(),
        }
    }
    pub(crate) fn malformed_schema(location: impl Into<String>, reason: impl Into<String>) -> Self {
        EvaluationError::MalformedSchema {
            location: location.into(),
            reason: reason.into(),
        }
    }
    pub(crate) fn unknown_vocabulary(uri: impl Into<String>) -> Self {
        EvaluationError::UnknownVocabulary { uri: uri.into() }
    }
    pub(crate) fn unknown_format(name: impl Into<String>) -> Self {
        EvaluationError::UnknownFormat { name: name.into() }
    }
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationError::ReferenceResolution { uri, reason } => {
                write!(f, "Failed to resolve '{uri}': {reason}")
            }
            EvaluationError::ReferenceCycle {
                schema_uri,
                instance_location,
            } => {
                write!(
                    f,
                    "Reference cycle at '{schema_uri}' without instance progress at '{instance_location}'"
                )
            }
            EvaluationError::MalformedSchema { location, reason } => {
                if location.is_empty() {
                    write!(f, "Malformed schema: {reason}")
                } else {
                    write!(f, "Malformed schema at '{location}': {reason}")
                }
            }
            EvaluationError::UnknownVocabulary { uri } => {
                write!(f, "Vocabulary '{uri}' is required but unknown")
            }
            EvaluationError::UnknownFormat { name } => {
                write!(f, "Format '{name}' is unknown")
            }
            EvaluationError::Loader { uri, source } => {
                write!(f, "Failed to load '{uri}': {source}")
            }
            EvaluationError::Cancelled => f.write_str("Evaluation was cancelled"),
        }
    }
}

impl std::error::Error for EvaluationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EvaluationError::Loader { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

impl From<referencing::Error> for EvaluationError {
    fn from(error: referencing::Error) -> Self {
        match error {
            referencing::Error::Unretrievable { uri, source } => EvaluationError::Loader {
                uri,
                source: source.unwrap_or_else(|| "the resource could not be retrieved".into()),
            },
            referencing::Error::PointerToNowhere { ref pointer } => {
                EvaluationError::reference_resolution(pointer.clone(), error.to_string())
            }
            referencing::Error::NoSuchAnchor { ref anchor }
            | referencing::Error::InvalidAnchor { ref anchor } => {
                EvaluationError::reference_resolution(anchor.clone(), error.to_string())
            }
            referencing::Error::DuplicateResource { ref uri } => {
                EvaluationError::reference_resolution(uri.clone(), error.to_string())
            }
            referencing::Error::InvalidArrayIndex { ref pointer, .. } => {
                EvaluationError::reference_resolution(pointer.clone(), error.to_string())
            }
            referencing::Error::InvalidPercentEncoding { ref pointer, .. } => {
                EvaluationError::reference_resolution(pointer.clone(), error.to_string())
            }
            referencing::Error::InvalidUri(ref source) => {
                EvaluationError::reference_resolution(source.to_string(), error.to_string())
            }
            referencing::Error::UnknownSpecification { specification } => {
                EvaluationError::malformed_schema(
                    String::new(),
                    format!("unknown $schema value '{specification}'"),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EvaluationError;

    #[test]
    fn display() {
        let error = EvaluationError::reference_resolution("http://example.com/s", "not registered");
        assert_eq!(
            error.to_string(),
            "Failed to resolve 'http://example.com/s': not registered"
        );
        let error = EvaluationError::reference_cycle("http://example.com/s#", "/a/b");
        assert_eq!(
            error.to_string(),
            "Reference cycle at 'http://example.com/s#' without instance progress at '/a/b'"
        );
        assert_eq!(
            EvaluationError::Cancelled.to_string(),
            "Evaluation was cancelled"
        );
    }

    #[test]
    fn referencing_conversion() {
        let error: EvaluationError = referencing::Error::UnknownSpecification {
            specification: "https://example.com/dialect".to_string(),
        }
        .into();
        assert!(matches!(error, EvaluationError::MalformedSchema { .. }));
    }
}
