use std::borrow::Cow;

/// The path walked so far during JSON Pointer resolution inside a resource.
///
/// Resets whenever resolution crosses into an embedded resource.
pub(crate) struct Segments<'a>(Vec<Segment<'a>>);

impl<'a> Segments<'a> {
    pub(crate) fn new() -> Self {
        Self(Vec::new())
    }

    pub(crate) fn push(&mut self, segment: impl Into<Segment<'a>>) {
        self.0.push(segment.into());
    }

    pub(crate) fn last(&self) -> Option<&Segment<'a>> {
        self.0.last()
    }

    pub(crate) fn second_to_last(&self) -> Option<&Segment<'a>> {
        self.0.len().checked_sub(2).and_then(|idx| self.0.get(idx))
    }
}

/// A single segment in a JSON Pointer.
#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) enum Segment<'a> {
    /// A string key for object members.
    Key(Cow<'a, str>),
    /// A numeric index for array elements.
    Index(usize),
}

impl Segment<'_> {
    pub(crate) fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(key) => Some(key),
            Segment::Index(_) => None,
        }
    }
}

impl<'a> From<Cow<'a, str>> for Segment<'a> {
    fn from(value: Cow<'a, str>) -> Self {
        Segment::Key(value)
    }
}

impl From<usize> for Segment<'_> {
    fn from(value: usize) -> Self {
        Segment::Index(value)
    }
}
