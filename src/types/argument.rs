//! Call-site argument handles passed to return-type rules.

use super::semantic::SemanticType;

/// A literal value appearing directly at a call site.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl LiteralValue {
    /// The most precise static type of this literal.
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            LiteralValue::Null => SemanticType::Null,
            LiteralValue::Bool(_) => SemanticType::Bool,
            LiteralValue::Int(_) => SemanticType::Int,
            LiteralValue::UInt(_) => SemanticType::UInt,
            LiteralValue::Double(_) => SemanticType::Double,
            LiteralValue::String(s) => SemanticType::StringLiteral(s.clone()),
            LiteralValue::Bytes(_) => SemanticType::Bytes,
        }
    }
}

/// One argument expression at a call site, reduced to what a return-type
/// rule may inspect: its static type and, for literals, its value.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentSyntax {
    static_type: SemanticType,
    literal: Option<LiteralValue>,
}

impl ArgumentSyntax {
    /// A non-literal argument with a known static type.
    pub fn typed(static_type: SemanticType) -> Self {
        Self {
            static_type,
            literal: None,
        }
    }

    /// A literal argument. Its static type is derived from the value.
    pub fn literal(value: LiteralValue) -> Self {
        Self {
            static_type: value.semantic_type(),
            literal: Some(value),
        }
    }

    pub fn static_type(&self) -> &SemanticType {
        &self.static_type
    }

    pub fn literal_value(&self) -> Option<&LiteralValue> {
        self.literal.as_ref()
    }

    /// The literal string value, if this argument is a string literal.
    pub fn as_str_literal(&self) -> Option<&str> {
        match &self.literal {
            Some(LiteralValue::String(s)) => Some(s),
            _ => None,
        }
    }
}
