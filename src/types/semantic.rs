//! Semantic types referenced by function signatures.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Dotted identifiers such as `Sku` or `acme.v1.Sku`. Also used for
/// function names in settings.toml.
pub(crate) static QUALIFIED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap()
});

/// A type in the CEL type system, as seen by function signatures.
///
/// `Dyn` is the top type: every value conforms to it, and it is the default
/// return and parameter type of a fresh signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Dyn,
    Null,
    Bool,
    Int,
    UInt,
    Double,
    String,
    Bytes,
    Timestamp,
    Duration,
    List(Box<SemanticType>),
    Map(Box<SemanticType>, Box<SemanticType>),
    Optional(Box<SemanticType>),
    /// A type value, e.g. the result of `type(x)`.
    Type(Box<SemanticType>),
    /// A protobuf message type by fully qualified name.
    Message(String),
    /// A string whose value is known statically. Narrower than `String`.
    StringLiteral(String),
}

impl SemanticType {
    /// The universal type.
    pub fn top() -> Self {
        SemanticType::Dyn
    }

    pub fn is_top(&self) -> bool {
        matches!(self, SemanticType::Dyn)
    }

    pub fn list(elem: SemanticType) -> Self {
        SemanticType::List(Box::new(elem))
    }

    pub fn map(key: SemanticType, value: SemanticType) -> Self {
        SemanticType::Map(Box::new(key), Box::new(value))
    }

    pub fn optional(elem: SemanticType) -> Self {
        SemanticType::Optional(Box::new(elem))
    }

    pub fn type_of(elem: SemanticType) -> Self {
        SemanticType::Type(Box::new(elem))
    }

    pub fn message(name: impl Into<String>) -> Self {
        SemanticType::Message(name.into())
    }

    /// Drop literal precision: `'abc'` widens to `string`.
    pub fn widen(&self) -> SemanticType {
        match self {
            SemanticType::StringLiteral(_) => SemanticType::String,
            other => other.clone(),
        }
    }

    /// Parse a type string.
    ///
    /// Supports:
    /// - Primitives: bool, int, uint, double, string, bytes
    /// - Special: null, dyn, timestamp, duration
    /// - Parameterized: list(T), map(K, V), optional(T), type(T)
    /// - Message types: any.other.name
    ///
    /// # Examples
    ///
    /// ```
    /// use celsig::SemanticType;
    ///
    /// assert_eq!(SemanticType::parse("int").unwrap(), SemanticType::Int);
    /// assert_eq!(
    ///     SemanticType::parse("list(string)").unwrap(),
    ///     SemanticType::list(SemanticType::String)
    /// );
    /// ```
    pub fn parse(s: &str) -> Result<SemanticType, String> {
        let s = s.trim();

        if let Some(inner_start) = s.find('(') {
            check_outer_parens(s, inner_start)?;

            let type_name = s[..inner_start].trim();
            let inner = &s[inner_start + 1..s.len() - 1];

            return match type_name {
                "list" => Ok(SemanticType::list(SemanticType::parse(inner)?)),
                "map" => {
                    let (key_str, val_str) = split_map_types(inner)?;
                    let key = SemanticType::parse(key_str)?;
                    let val = SemanticType::parse(val_str)?;
                    Ok(SemanticType::map(key, val))
                }
                "optional" => Ok(SemanticType::optional(SemanticType::parse(inner)?)),
                "type" => Ok(SemanticType::type_of(SemanticType::parse(inner)?)),
                _ => Err(format!("unknown parameterized type: '{}'", type_name)),
            };
        }

        match s {
            "bool" => Ok(SemanticType::Bool),
            "int" => Ok(SemanticType::Int),
            "uint" => Ok(SemanticType::UInt),
            "double" => Ok(SemanticType::Double),
            "string" => Ok(SemanticType::String),
            "bytes" => Ok(SemanticType::Bytes),
            "null" => Ok(SemanticType::Null),
            "dyn" => Ok(SemanticType::Dyn),
            "timestamp" => Ok(SemanticType::Timestamp),
            "duration" => Ok(SemanticType::Duration),
            "" => Err("empty type string".to_string()),
            name if QUALIFIED_NAME.is_match(name) => Ok(SemanticType::message(name)),
            _ => Err(format!("malformed type string: '{}'", s)),
        }
    }
}

impl Default for SemanticType {
    fn default() -> Self {
        SemanticType::top()
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Dyn => write!(f, "dyn"),
            SemanticType::Null => write!(f, "null"),
            SemanticType::Bool => write!(f, "bool"),
            SemanticType::Int => write!(f, "int"),
            SemanticType::UInt => write!(f, "uint"),
            SemanticType::Double => write!(f, "double"),
            SemanticType::String => write!(f, "string"),
            SemanticType::Bytes => write!(f, "bytes"),
            SemanticType::Timestamp => write!(f, "timestamp"),
            SemanticType::Duration => write!(f, "duration"),
            SemanticType::List(elem) => write!(f, "list({})", elem),
            SemanticType::Map(key, value) => write!(f, "map({}, {})", key, value),
            SemanticType::Optional(elem) => write!(f, "optional({})", elem),
            SemanticType::Type(elem) => write!(f, "type({})", elem),
            SemanticType::Message(name) => write!(f, "{}", name),
            SemanticType::StringLiteral(value) => write!(f, "'{}'", value),
        }
    }
}

/// The paren opened at `open` must close at the last character, with every
/// paren in between balanced.
fn check_outer_parens(s: &str, open: usize) -> Result<(), String> {
    let mut depth = 0i32;
    for (i, c) in s.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => continue,
        }
        if depth < 0 || (depth == 0 && i != s.len() - 1) {
            return Err(format!("malformed type string: unbalanced parens in '{}'", s));
        }
    }
    if depth != 0 {
        return Err(format!("malformed type string: missing closing paren in '{}'", s));
    }
    Ok(())
}

/// Split map type parameters respecting nested parentheses.
fn split_map_types(s: &str) -> Result<(&str, &str), String> {
    let mut depth = 0;
    let mut split_pos = None;

    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(format!("unbalanced parens in map parameters: '{}'", s));
                }
            }
            ',' if depth == 0 => {
                if split_pos.is_some() {
                    return Err(format!("map type has more than 2 parameters: '{}'", s));
                }
                split_pos = Some(i);
            }
            _ => {}
        }
    }

    match split_pos {
        Some(pos) => Ok((s[..pos].trim(), s[pos + 1..].trim())),
        None => Err(format!("map type must have 2 parameters: '{}'", s)),
    }
}
