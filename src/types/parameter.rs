//! Parameter descriptors.
//!
//! Plain immutable values. Nothing is validated here; ordering and name
//! uniqueness are the builder's concern.

use super::semantic::SemanticType;

/// A positional parameter with a definite slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedParameter {
    name: String,
    description: String,
    ty: SemanticType,
    required: bool,
}

impl FixedParameter {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        ty: SemanticType,
        required: bool,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ty,
            required,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn ty(&self) -> &SemanticType {
        &self.ty
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// The trailing parameter slot that absorbs the remaining arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableParameter {
    name_prefix: String,
    description: String,
    ty: SemanticType,
    minimum_count: usize,
}

impl VariableParameter {
    pub fn new(
        name_prefix: impl Into<String>,
        description: impl Into<String>,
        ty: SemanticType,
        minimum_count: usize,
    ) -> Self {
        Self {
            name_prefix: name_prefix.into(),
            description: description.into(),
            ty,
            minimum_count,
        }
    }

    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Type every matched argument must conform to.
    pub fn ty(&self) -> &SemanticType {
        &self.ty
    }

    pub fn minimum_count(&self) -> usize {
        self.minimum_count
    }

    /// Display name for the `index`-th (zero-based) argument matched by this slot.
    pub fn slot_name(&self, index: usize) -> String {
        format!("{}{}", self.name_prefix, index + 1)
    }
}
