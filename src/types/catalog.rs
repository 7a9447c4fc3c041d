//! The function catalog: every known signature, grouped into overload sets.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::builtins;
use super::function::FunctionSignature;

/// Optional function libraries layered on top of the standard library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    /// `lowerAscii`, `upperAscii`, `join`, `format`, ...
    Strings,
    /// `math.greatest`, `math.least`.
    Math,
    /// Validation helpers available inside protovalidate annotations.
    Protovalidate,
}

impl Extension {
    pub const ALL: [Extension; 3] = [
        Extension::Strings,
        Extension::Math,
        Extension::Protovalidate,
    ];

    /// Parse an extension name as written in settings.toml.
    pub fn from_name(name: &str) -> Option<Extension> {
        match name {
            "strings" | "string" => Some(Extension::Strings),
            "math" => Some(Extension::Math),
            "protovalidate" => Some(Extension::Protovalidate),
            _ => None,
        }
    }
}

/// Registry of function signatures keyed by name.
///
/// Built once, then shared read-only behind an `Arc`.
#[derive(Debug, Default, Clone)]
pub struct FunctionCatalog {
    overloads: BTreeMap<String, Vec<Arc<FunctionSignature>>>,
}

impl FunctionCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the CEL standard library.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        catalog.extend(builtins::standard_library());
        catalog
    }

    /// Add an extension library.
    pub fn with_extension(mut self, extension: Extension) -> Self {
        let signatures = match extension {
            Extension::Strings => builtins::strings_extension(),
            Extension::Math => builtins::math_extension(),
            Extension::Protovalidate => builtins::protovalidate_extension(),
        };
        self.extend(signatures);
        self
    }

    pub fn with_all_extensions(self) -> Self {
        Extension::ALL
            .into_iter()
            .fold(self, |catalog, ext| catalog.with_extension(ext))
    }

    /// Append a signature to the overload set of its name.
    pub fn register(&mut self, signature: FunctionSignature) {
        self.overloads
            .entry(signature.name().to_string())
            .or_default()
            .push(Arc::new(signature));
    }

    pub fn extend(&mut self, signatures: impl IntoIterator<Item = FunctionSignature>) {
        for signature in signatures {
            self.register(signature);
        }
    }

    /// Every overload registered under `name`, in registration order.
    pub fn overloads(&self, name: &str) -> &[Arc<FunctionSignature>] {
        self.overloads.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.overloads.contains_key(name)
    }

    /// Function names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.overloads.keys().map(String::as_str)
    }

    /// Overload sets in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Arc<FunctionSignature>])> {
        self.overloads
            .iter()
            .map(|(name, sigs)| (name.as_str(), sigs.as_slice()))
    }

    /// Total number of signatures across all overload sets.
    pub fn len(&self) -> usize {
        self.overloads.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.overloads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SemanticType, SignatureBuilder};

    #[test]
    fn recognizes_builtins() {
        let catalog = FunctionCatalog::with_builtins();
        assert!(catalog.contains("size"));
        assert!(catalog.contains("type"));
        assert!(catalog.contains("has"));
        assert!(catalog.contains("contains"));
    }

    #[test]
    fn rejects_non_builtins() {
        let catalog = FunctionCatalog::with_builtins();
        assert!(!catalog.contains("foo"));
        assert!(!catalog.contains("myFunction"));
        assert!(!catalog.contains(""));
        assert!(catalog.overloads("foo").is_empty());
    }

    #[test]
    fn extensions_are_opt_in() {
        let catalog = FunctionCatalog::with_builtins();
        assert!(!catalog.contains("isEmail"));
        assert!(!catalog.contains("lowerAscii"));

        let catalog = catalog.with_extension(Extension::Protovalidate);
        assert!(catalog.contains("isEmail"));
        assert!(!catalog.contains("lowerAscii"));

        let catalog = FunctionCatalog::with_builtins().with_all_extensions();
        assert!(catalog.contains("isEmail"));
        assert!(catalog.contains("lowerAscii"));
        assert!(catalog.contains("math.greatest"));
    }

    #[test]
    fn same_name_forms_an_overload_set() {
        let mut catalog = FunctionCatalog::new();
        catalog.register(
            SignatureBuilder::new("max")
                .with_required_parameter("a", SemanticType::Int, "")
                .with_required_parameter("b", SemanticType::Int, "")
                .with_return_type(SemanticType::Int)
                .build(),
        );
        catalog.register(
            SignatureBuilder::new("max")
                .with_variable_parameter("value", SemanticType::Double, 1, "")
                .with_return_type(SemanticType::Double)
                .build(),
        );
        let set = catalog.overloads("max");
        assert_eq!(set.len(), 2);
        assert_eq!(set[0].return_type(), &SemanticType::Int);
        assert_eq!(set[1].return_type(), &SemanticType::Double);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["max"]);
    }

    #[test]
    fn names_are_sorted() {
        let mut catalog = FunctionCatalog::new();
        for name in ["b", "c", "a"] {
            catalog.register(SignatureBuilder::new(name).build());
        }
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn extension_names() {
        assert_eq!(Extension::from_name("strings"), Some(Extension::Strings));
        assert_eq!(Extension::from_name("string"), Some(Extension::Strings));
        assert_eq!(
            Extension::from_name("protovalidate"),
            Some(Extension::Protovalidate)
        );
        assert_eq!(Extension::from_name("math"), Some(Extension::Math));
        assert_eq!(Extension::from_name("encoders"), None);
    }
}
