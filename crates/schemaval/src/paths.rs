//! Evaluation-path and instance-location tracking.
use std::{fmt, fmt::Write, slice::Iter};

/// A key within a JSON object, an index within a JSON array, or a schema
/// keyword. A sequence of chunks is a valid JSON Pointer.
///
/// Keeping indices as numbers avoids formatting them during traversal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PathChunk {
    /// Property name within a JSON object.
    Property(Box<str>),
    /// Index within a JSON array.
    Index(usize),
    /// JSON Schema keyword.
    Keyword(&'static str),
}

/// A JSON Pointer as a sequence of path chunks.
///
/// Locations identify both evaluation paths (through applicator descent) and
/// instance locations; they render as RFC 6901 pointers with `~` and `/`
/// escaping.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Location(Vec<PathChunk>);

impl Location {
    /// The empty pointer, i.e. the document root.
    #[must_use]
    pub const fn new() -> Self {
        Location(Vec::new())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the underlying path chunks.
    pub fn iter(&self) -> Iter<'_, PathChunk> {
        self.0.iter()
    }

    /// Take the last pointer chunk.
    #[must_use]
    pub fn last(&self) -> Option<&PathChunk> {
        self.0.last()
    }

    /// A new location with `chunk` appended.
    #[must_use]
    pub fn join(&self, chunk: impl Into<PathChunk>) -> Self {
        let mut new = self.clone();
        new.0.push(chunk.into());
        new
    }

    /// A new location with all of `chunks` appended.
    #[must_use]
    pub fn extend(&self, chunks: &[PathChunk]) -> Self {
        let mut new = self.clone();
        new.0.extend_from_slice(chunks);
        new
    }

    pub(crate) fn push(&mut self, chunk: impl Into<PathChunk>) {
        self.0.push(chunk.into());
    }

    /// Render this location as a JSON Pointer fragment (no leading `#`).
    #[must_use]
    pub fn as_pointer(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in &self.0 {
            f.write_char('/')?;
            match chunk {
                PathChunk::Property(value) => write_escaped(f, value)?,
                PathChunk::Index(idx) => f.write_str(itoa::Buffer::new().format(*idx))?,
                PathChunk::Keyword(keyword) => write_escaped(f, keyword)?,
            }
        }
        Ok(())
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    for ch in value.chars() {
        match ch {
            '/' => f.write_str("~1")?,
            '~' => f.write_str("~0")?,
            _ => f.write_char(ch)?,
        }
    }
    Ok(())
}

impl serde::Serialize for Location {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl From<String> for PathChunk {
    #[inline]
    fn from(value: String) -> Self {
        PathChunk::Property(value.into_boxed_str())
    }
}

impl From<&'static str> for PathChunk {
    #[inline]
    fn from(value: &'static str) -> Self {
        PathChunk::Keyword(value)
    }
}

impl From<usize> for PathChunk {
    #[inline]
    fn from(value: usize) -> Self {
        PathChunk::Index(value)
    }
}

#[cfg(test)]
mod tests {
    use super::Location;
    use serde_json::json;

    #[test]
    fn renders_as_escaped_pointer() {
        let location = Location::new()
            .join("a/b".to_string())
            .join("~c".to_string())
            .join(2usize);
        assert_eq!(location.to_string(), "/a~1b/~0c/2");
    }

    #[test]
    fn empty_location_is_the_root() {
        assert_eq!(Location::new().to_string(), "");
        let data = json!({"a": {"b": 1}});
        assert_eq!(data.pointer(&Location::new().to_string()), Some(&data));
    }

    #[test]
    fn pointer_round_trip() {
        let location = Location::new().join("a".to_string()).join(0usize);
        let data = json!({"a": [42]});
        assert_eq!(data.pointer(&location.to_string()), Some(&json!(42)));
    }
}
