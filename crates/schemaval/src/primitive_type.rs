use core::fmt;
use std::convert::TryFrom;

use serde_json::Value;

/// JSON instance types recognized by the `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::Array => f.write_str("array"),
            PrimitiveType::Boolean => f.write_str("boolean"),
            PrimitiveType::Integer => f.write_str("integer"),
            PrimitiveType::Null => f.write_str("null"),
            PrimitiveType::Number => f.write_str("number"),
            PrimitiveType::Object => f.write_str("object"),
            PrimitiveType::String => f.write_str("string"),
        }
    }
}

impl TryFrom<&str> for PrimitiveType {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "array" => Ok(PrimitiveType::Array),
            "boolean" => Ok(PrimitiveType::Boolean),
            "integer" => Ok(PrimitiveType::Integer),
            "null" => Ok(PrimitiveType::Null),
            "number" => Ok(PrimitiveType::Number),
            "object" => Ok(PrimitiveType::Object),
            "string" => Ok(PrimitiveType::String),
            _ => Err(()),
        }
    }
}

const fn bit(ty: PrimitiveType) -> u8 {
    match ty {
        PrimitiveType::Array => 1,
        PrimitiveType::Boolean => 1 << 1,
        PrimitiveType::Integer => 1 << 2,
        PrimitiveType::Null => 1 << 3,
        PrimitiveType::Number => 1 << 4,
        PrimitiveType::Object => 1 << 5,
        PrimitiveType::String => 1 << 6,
    }
}

/// A compact set of primitive types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrimitiveTypesBitMap(u8);

impl PrimitiveTypesBitMap {
    #[must_use]
    pub const fn new() -> Self {
        PrimitiveTypesBitMap(0)
    }

    #[must_use]
    pub const fn add_type(self, ty: PrimitiveType) -> Self {
        PrimitiveTypesBitMap(self.0 | bit(ty))
    }

    #[must_use]
    pub const fn contains_type(self, ty: PrimitiveType) -> bool {
        self.0 & bit(ty) != 0
    }

    pub fn iter(self) -> impl Iterator<Item = PrimitiveType> {
        [
            PrimitiveType::Array,
            PrimitiveType::Boolean,
            PrimitiveType::Integer,
            PrimitiveType::Null,
            PrimitiveType::Number,
            PrimitiveType::Object,
            PrimitiveType::String,
        ]
        .into_iter()
        .filter(move |ty| self.contains_type(*ty))
    }
}

/// The primitive type of a JSON value. Numbers with a zero fractional part
/// are mathematically integers and match both `integer` and `number`; the
/// bitmap check in `type` handles that separately.
#[must_use]
pub fn primitive_type_of(instance: &Value) -> PrimitiveType {
    match instance {
        Value::Null => PrimitiveType::Null,
        Value::Bool(_) => PrimitiveType::Boolean,
        Value::Number(_) => PrimitiveType::Number,
        Value::String(_) => PrimitiveType::String,
        Value::Array(_) => PrimitiveType::Array,
        Value::Object(_) => PrimitiveType::Object,
    }
}

#[cfg(test)]
mod tests {
    use super::{PrimitiveType, PrimitiveTypesBitMap};

    #[test]
    fn bitmap_membership() {
        let types = PrimitiveTypesBitMap::new()
            .add_type(PrimitiveType::Integer)
            .add_type(PrimitiveType::String);
        assert!(types.contains_type(PrimitiveType::Integer));
        assert!(types.contains_type(PrimitiveType::String));
        assert!(!types.contains_type(PrimitiveType::Null));
        assert_eq!(
            types.iter().collect::<Vec<_>>(),
            vec![PrimitiveType::Integer, PrimitiveType::String]
        );
    }
}
