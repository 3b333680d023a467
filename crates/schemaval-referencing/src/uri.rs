//! URI helpers shared by the registry and the evaluation engine.
use fluent_uri::{
    encoding::{encoder::Fragment, Encoder},
    Uri, UriRef,
};
use once_cell::sync::Lazy;

use crate::Error;

/// The base URI used for documents that do not declare their own identifier.
pub static DEFAULT_ROOT_URI: Lazy<Uri<String>> =
    Lazy::new(|| Uri::parse("schemaval:///".to_string()).expect("Invalid URI"));

/// Resolve the URI reference against the given base URI and return the target URI.
///
/// # Errors
///
/// Returns an error if the reference is not a valid URI-reference or cannot
/// be resolved against `base`.
pub fn resolve_against(base: &Uri<&str>, reference: &str) -> Result<Uri<String>, Error> {
    Ok(UriRef::parse(reference.to_string())
        .map_err(Error::from)?
        .resolve_against(base)
        .map_err(Error::from)?
        .normalize())
}

/// Parse a URI reference from a string into an absolute [`crate::Uri`].
///
/// Relative references are grounded against [`DEFAULT_ROOT_URI`].
///
/// # Errors
///
/// Returns an error if the input does not conform to URI-reference from RFC 3986.
pub fn from_str(uri: &str) -> Result<Uri<String>, Error> {
    let uriref = UriRef::parse(uri.to_string()).map_err(Error::from)?.normalize();
    if uriref.has_scheme() {
        Ok(Uri::parse(uriref.as_str().to_string()).map_err(Error::from)?)
    } else {
        Ok(uriref
            .resolve_against(&DEFAULT_ROOT_URI.borrow())
            .map_err(Error::from)?)
    }
}

/// Percent-encode `input` so it is valid inside a URI fragment and append it
/// to `buffer`.
pub fn encode_fragment_to(input: &str, buffer: &mut String) {
    const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    for ch in input.chars() {
        if Fragment::TABLE.allows(ch) {
            buffer.push(ch);
        } else {
            for byte in ch.encode_utf8(&mut [0; 4]).bytes() {
                buffer.push('%');
                buffer.push(HEX_DIGITS[(byte >> 4) as usize] as char);
                buffer.push(HEX_DIGITS[(byte & 0x0F) as usize] as char);
            }
        }
    }
}

/// Build the absolute location of a subschema: `base` plus a JSON Pointer
/// fragment. An empty pointer yields `base#`-less form, i.e. the bare base.
pub fn with_fragment(base: &Uri<String>, pointer: &str) -> Result<Uri<String>, Error> {
    if pointer.is_empty() {
        return Ok(base.clone());
    }
    let mut fragment = String::with_capacity(pointer.len() + 1);
    fragment.push('#');
    encode_fragment_to(pointer, &mut fragment);
    resolve_against(&base.borrow(), &fragment)
}
