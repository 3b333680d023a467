//! Instance-side JSON Pointers and Relative JSON Pointers.
//!
//! Resolution never conflates a missing location with a JSON `null`: misses
//! yield [`Target::Absent`], which compares equal to nothing.
use std::{fmt, str::FromStr};

use serde_json::Value;

/// The outcome of resolving a pointer against an instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target<'a> {
    /// The pointer leads to this value.
    Value(&'a Value),
    /// The pointer leads to no value. Distinct from a present JSON `null`.
    Absent,
}

impl<'a> Target<'a> {
    /// The resolved value, if the location exists.
    #[must_use]
    pub fn value(self) -> Option<&'a Value> {
        match self {
            Target::Value(value) => Some(value),
            Target::Absent => None,
        }
    }
    #[must_use]
    pub fn is_absent(self) -> bool {
        matches!(self, Target::Absent)
    }
}

/// An RFC 6901 JSON Pointer over instances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonPointer(Vec<String>);

impl JsonPointer {
    /// The empty pointer, addressing the document root.
    #[must_use]
    pub const fn empty() -> Self {
        JsonPointer(Vec::new())
    }

    /// Build a pointer from unescaped segments.
    #[must_use]
    pub fn of(segments: impl IntoIterator<Item = impl Into<String>>) -> Self {
        JsonPointer(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a pointer from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error when the input neither is empty nor starts with `/`,
    /// or contains an incomplete `~` escape.
    pub fn parse(input: &str) -> Result<Self, ParsePointerError> {
        if input.is_empty() {
            return Ok(JsonPointer::empty());
        }
        if !input.starts_with('/') {
            return Err(ParsePointerError::missing_leading_slash(input));
        }
        let mut segments = Vec::new();
        for raw in input[1..].split('/') {
            segments.push(unescape(raw).ok_or_else(|| ParsePointerError::bad_escape(input))?);
        }
        Ok(JsonPointer(segments))
    }

    /// The pointer segments, unescaped.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// A new pointer with all segments of `other` appended.
    #[must_use]
    pub fn combine(&self, other: &JsonPointer) -> Self {
        let mut new = self.clone();
        new.0.extend(other.0.iter().cloned());
        new
    }

    /// A new pointer with one more segment appended.
    #[must_use]
    pub fn combined_with(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// The parent pointer, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<JsonPointer> {
        if self.0.is_empty() {
            return None;
        }
        Some(JsonPointer(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Resolve this pointer against `instance`.
    ///
    /// Array segments follow RFC 6901 strictly: leading zeros are rejected
    /// (except the literal `"0"`), and the `-` end marker addresses the slot
    /// past the last element, which is always absent.
    #[must_use]
    pub fn resolve<'a>(&self, instance: &'a Value) -> Target<'a> {
        let mut current = instance;
        for segment in &self.0 {
            match current {
                Value::Object(map) => match map.get(segment.as_str()) {
                    Some(next) => current = next,
                    None => return Target::Absent,
                },
                Value::Array(items) => match parse_index(segment) {
                    Some(idx) => match items.get(idx) {
                        Some(next) => current = next,
                        None => return Target::Absent,
                    },
                    None => return Target::Absent,
                },
                _ => return Target::Absent,
            }
        }
        Target::Value(current)
    }
}

impl FromStr for JsonPointer {
    type Err = ParsePointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JsonPointer::parse(s)
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            f.write_str("/")?;
            for ch in segment.chars() {
                match ch {
                    '/' => f.write_str("~1")?,
                    '~' => f.write_str("~0")?,
                    _ => write!(f, "{ch}")?,
                }
            }
        }
        Ok(())
    }
}

/// Escape a single segment for embedding in a pointer string.
#[must_use]
pub fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Unescape a single pointer segment; `None` for invalid `~` escapes.
#[must_use]
pub fn unescape(segment: &str) -> Option<String> {
    if !segment.contains('~') {
        return Some(segment.to_string());
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
            _ => return None,
        }
    }
    Some(buffer)
}

/// Strict RFC 6901 array index: no leading zeros (except `"0"`), no signs.
/// The `-` end marker is not an index.
fn parse_index(segment: &str) -> Option<usize> {
    if segment.len() > 1 && segment.starts_with('0') {
        return None;
    }
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// A Relative JSON Pointer: a non-negative up-count, an optional array index
/// adjustment, then either a pointer suffix or the `#` name-of flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeJsonPointer {
    up: usize,
    index_adjustment: Option<i64>,
    tail: Tail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tail {
    Pointer(JsonPointer),
    /// Yield the final reference token as a string instead of a value.
    Name,
}

/// The outcome of evaluating a Relative JSON Pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum RelativeTarget<'a> {
    /// The pointer leads to this value.
    Value(&'a Value),
    /// The `#` flag on an object member: the member name.
    Name(String),
    /// The `#` flag on an array element: the element index.
    Index(usize),
    /// The pointer leads to no value.
    Absent,
}

impl RelativeJsonPointer {
    /// Parse from the `<up-count><adjustment?><pointer-or-#>` form.
    ///
    /// # Errors
    ///
    /// Returns an error for a missing or non-canonical up-count, a malformed
    /// adjustment, or an invalid pointer suffix.
    pub fn parse(input: &str) -> Result<Self, ParsePointerError> {
        let digits = input.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(ParsePointerError::missing_up_count(input));
        }
        if digits > 1 && input.starts_with('0') {
            return Err(ParsePointerError::leading_zero(input));
        }
        let up: usize = input[..digits]
            .parse()
            .map_err(|_| ParsePointerError::missing_up_count(input))?;
        let mut rest = &input[digits..];

        let mut index_adjustment = None;
        if rest.starts_with('+') || rest.starts_with('-') {
            let sign = if rest.starts_with('-') { -1 } else { 1 };
            let digits = rest[1..].bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 {
                return Err(ParsePointerError::bad_adjustment(input));
            }
            let magnitude: i64 = rest[1..=digits]
                .parse()
                .map_err(|_| ParsePointerError::bad_adjustment(input))?;
            index_adjustment = Some(sign * magnitude);
            rest = &rest[1 + digits..];
        }

        let tail = match rest {
            "#" => Tail::Name,
            pointer => Tail::Pointer(JsonPointer::parse(pointer)?),
        };
        Ok(RelativeJsonPointer {
            up,
            index_adjustment,
            tail,
        })
    }

    /// Evaluate against `root`, starting from the location `from`.
    ///
    /// # Errors
    ///
    /// Returns an error when the up-count walks past the document root, when
    /// an index adjustment is applied to a non-array parent, or when `#` is
    /// requested at the document root.
    pub fn evaluate<'a>(
        &self,
        root: &'a Value,
        from: &JsonPointer,
    ) -> Result<RelativeTarget<'a>, RelativePointerError> {
        if self.up > from.segments().len() {
            return Err(RelativePointerError::PastRoot);
        }
        let mut location = JsonPointer(from.segments()[..from.segments().len() - self.up].to_vec());

        if let Some(adjustment) = self.index_adjustment {
            if location.0.is_empty() {
                return Err(RelativePointerError::AdjustmentAtRoot);
            }
            let parent = JsonPointer(location.0[..location.0.len() - 1].to_vec());
            let parent_is_array = matches!(parent.resolve(root), Target::Value(Value::Array(_)));
            let index = location
                .0
                .last()
                .and_then(|segment| parse_index(segment))
                .ok_or(RelativePointerError::AdjustmentOnNonIndex)?;
            if !parent_is_array {
                return Err(RelativePointerError::AdjustmentOnNonIndex);
            }
            let adjusted = index as i64 + adjustment;
            if adjusted < 0 {
                return Err(RelativePointerError::NegativeIndex);
            }
            *location.0.last_mut().expect("Location is not empty") = adjusted.to_string();
        }

        match &self.tail {
            Tail::Name => match location.0.last() {
                None => Err(RelativePointerError::NameOfRoot),
                Some(segment) => {
                    let parent = location.parent().expect("Location has a last segment");
                    match parent.resolve(root) {
                        Target::Value(Value::Array(_)) => match parse_index(segment) {
                            Some(index) => Ok(RelativeTarget::Index(index)),
                            None => Ok(RelativeTarget::Absent),
                        },
                        Target::Value(_) => Ok(RelativeTarget::Name(segment.clone())),
                        Target::Absent => Ok(RelativeTarget::Absent),
                    }
                }
            },
            Tail::Pointer(pointer) => match location.combine(pointer).resolve(root) {
                Target::Value(value) => Ok(RelativeTarget::Value(value)),
                Target::Absent => Ok(RelativeTarget::Absent),
            },
        }
    }
}

impl FromStr for RelativeJsonPointer {
    type Err = ParsePointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelativeJsonPointer::parse(s)
    }
}

/// A pointer that does not conform to its grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePointerError {
    input: String,
    reason: &'static str,
}

impl ParsePointerError {
    fn missing_leading_slash(input: &str) -> Self {
        Self {
            input: input.to_string(),
            reason: "a non-empty pointer must start with '/'",
        }
    }
    fn bad_escape(input: &str) -> Self {
        Self {
            input: input.to_string(),
            reason: "'~' must be followed by '0' or '1'",
        }
    }
    fn missing_up_count(input: &str) -> Self {
        Self {
            input: input.to_string(),
            reason: "a relative pointer must start with a non-negative integer",
        }
    }
    fn leading_zero(input: &str) -> Self {
        Self {
            input: input.to_string(),
            reason: "the up-count must not have leading zeros",
        }
    }
    fn bad_adjustment(input: &str) -> Self {
        Self {
            input: input.to_string(),
            reason: "the index adjustment must be a signed integer",
        }
    }
}

impl fmt::Display for ParsePointerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid pointer '{}': {}", self.input, self.reason)
    }
}

impl std::error::Error for ParsePointerError {}

/// A structurally valid relative pointer applied to an impossible position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativePointerError {
    /// The up-count walks past the document root.
    PastRoot,
    /// An index adjustment was applied at the document root.
    AdjustmentAtRoot,
    /// An index adjustment was applied to a non-array position.
    AdjustmentOnNonIndex,
    /// The adjusted index is negative.
    NegativeIndex,
    /// `#` was requested at the document root, which has no name.
    NameOfRoot,
}

impl fmt::Display for RelativePointerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelativePointerError::PastRoot => f.write_str("The up-count walks past the document root"),
            RelativePointerError::AdjustmentAtRoot => {
                f.write_str("An index adjustment cannot be applied at the document root")
            }
            RelativePointerError::AdjustmentOnNonIndex => {
                f.write_str("An index adjustment requires an array element position")
            }
            RelativePointerError::NegativeIndex => f.write_str("The adjusted index is negative"),
            RelativePointerError::NameOfRoot => f.write_str("The document root has no name"),
        }
    }
}

impl std::error::Error for RelativePointerError {}
