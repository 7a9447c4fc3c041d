//! Function signature types for CEL.
//!
//! A `FunctionSignature` describes one overload of a CEL function: its name,
//! documentation, parameter shape, return-type rule, and capability flags.
//! Signatures are produced by [`SignatureBuilder`](super::SignatureBuilder)
//! and never change afterwards, so they are shared behind `Arc` by every
//! consumer.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use super::argument::ArgumentSyntax;
use super::parameter::{FixedParameter, VariableParameter};
use super::semantic::SemanticType;

/// Computes the result type of a call from its argument syntax.
///
/// Must be pure: it is called with an empty slice when the signature is
/// configured and later invoked with real arguments by the resolver.
pub type ReturnTypeRule = Arc<dyn Fn(&[ArgumentSyntax]) -> SemanticType + Send + Sync>;

bitflags! {
    /// Capability tags consumed by the checker to gate usage.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FunctionFlags: u32 {
        /// Callable in global form: `f(x)`.
        const GLOBAL = 1 << 0;
        /// Callable in receiver form: `x.f()`.
        const METHOD = 1 << 1;
        /// Expanded by the parser, never dispatched at runtime.
        const MACRO = 1 << 2;
        const DEPRECATED = 1 << 3;
        /// Only usable inside protovalidate rule expressions.
        const PROTOVALIDATE_ONLY = 1 << 4;
    }
}

impl FunctionFlags {
    /// Lowercase flag names, in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.iter_names()
            .map(|(name, _)| name.to_ascii_lowercase())
            .collect()
    }

    /// Look up a flag by its case-insensitive name.
    pub fn from_name_ignore_case(name: &str) -> Option<FunctionFlags> {
        FunctionFlags::from_name(&name.trim().to_ascii_uppercase())
    }
}

/// An immutable description of one callable overload.
#[derive(Clone)]
pub struct FunctionSignature {
    name: String,
    description: String,
    example: Option<String>,
    return_type: SemanticType,
    return_type_rule: ReturnTypeRule,
    fixed_parameters: Vec<FixedParameter>,
    variable_parameter: Option<VariableParameter>,
    flags: FunctionFlags,
}

impl FunctionSignature {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        description: String,
        example: Option<String>,
        return_type: SemanticType,
        return_type_rule: ReturnTypeRule,
        fixed_parameters: Vec<FixedParameter>,
        variable_parameter: Option<VariableParameter>,
        flags: FunctionFlags,
    ) -> Self {
        Self {
            name,
            description,
            example,
            return_type,
            return_type_rule,
            fixed_parameters,
            variable_parameter,
            flags,
        }
    }

    /// Function name (e.g., "size"). Shared by every overload in a set.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Optional example usage (e.g., `size("hello") == 5`).
    pub fn example(&self) -> Option<&str> {
        self.example.as_deref()
    }

    /// The representative return type, i.e. the rule evaluated without arguments.
    pub fn return_type(&self) -> &SemanticType {
        &self.return_type
    }

    /// Evaluate the return-type rule against concrete call-site arguments.
    pub fn return_type_for(&self, args: &[ArgumentSyntax]) -> SemanticType {
        (self.return_type_rule)(args)
    }

    pub fn return_type_rule(&self) -> &ReturnTypeRule {
        &self.return_type_rule
    }

    pub fn fixed_parameters(&self) -> &[FixedParameter] {
        &self.fixed_parameters
    }

    pub fn variable_parameter(&self) -> Option<&VariableParameter> {
        self.variable_parameter.as_ref()
    }

    pub fn flags(&self) -> FunctionFlags {
        self.flags
    }

    pub fn has_flag(&self, flag: FunctionFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Fewest arguments a call can supply.
    pub fn min_arity(&self) -> usize {
        let required = self
            .fixed_parameters
            .iter()
            .filter(|p| p.is_required())
            .count();
        required
            + self
                .variable_parameter
                .as_ref()
                .map_or(0, |v| v.minimum_count())
    }

    /// Most arguments a call can supply, or `None` when a variable parameter
    /// makes the arity unbounded.
    pub fn max_arity(&self) -> Option<usize> {
        match self.variable_parameter {
            Some(_) => None,
            None => Some(self.fixed_parameters.len()),
        }
    }
}

// The rule is a closure and has no meaningful equality; two signatures
// compare equal when everything else matches.
impl PartialEq for FunctionSignature {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.example == other.example
            && self.return_type == other.return_type
            && self.fixed_parameters == other.fixed_parameters
            && self.variable_parameter == other.variable_parameter
            && self.flags == other.flags
    }
}

impl fmt::Debug for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionSignature")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("example", &self.example)
            .field("return_type", &self.return_type)
            .field("fixed_parameters", &self.fixed_parameters)
            .field("variable_parameter", &self.variable_parameter)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// Renders `name(a: string, b?: string, item1: dyn, ...item: dyn) -> string`.
impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut params: Vec<String> = self
            .fixed_parameters
            .iter()
            .map(|p| {
                let marker = if p.is_required() { "" } else { "?" };
                format!("{}{}: {}", p.name(), marker, p.ty())
            })
            .collect();

        if let Some(var) = &self.variable_parameter {
            for i in 0..var.minimum_count() {
                params.push(format!("{}: {}", var.slot_name(i), var.ty()));
            }
            params.push(format!("...{}: {}", var.name_prefix(), var.ty()));
        }

        write!(
            f,
            "{}({}) -> {}",
            self.name,
            params.join(", "),
            self.return_type
        )
    }
}
