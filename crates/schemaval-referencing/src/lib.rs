//! # schemaval-referencing
//!
//! Schema registries, anchor tracking and reference resolution for the
//! `schemaval` evaluation engine. The crate is evaluation-agnostic: it
//! interns JSON documents by their canonical URIs, discovers embedded
//! subresources and anchors eagerly, and resolves URI references against a
//! base. Dynamic scope handling lives in the evaluator, which queries the
//! registry through [`Registry::anchor`] and [`Registry::dynamic_anchor`].
mod anchors;
mod error;
pub mod meta;
mod registry;
mod resolver;
mod resource;
mod retriever;
mod segments;
mod specification;
pub mod uri;
pub mod vocabularies;

pub use anchors::Anchor;
pub use error::{Error, UriError};
pub use registry::{Registry, RegistryOptions, SPECIFICATIONS};
pub use resolver::{Resolved, Resolver};
pub use resource::{Resource, ResourceRef};
pub use retriever::{DefaultRetriever, Retrieve};
pub(crate) use segments::Segments;
pub use specification::Draft;
pub use vocabularies::{Vocabulary, VocabularySet};

pub type Uri<T> = fluent_uri::Uri<T>;
pub type UriRef<T> = fluent_uri::UriRef<T>;
pub type Iri<T> = fluent_uri::Iri<T>;
pub type IriRef<T> = fluent_uri::IriRef<T>;
