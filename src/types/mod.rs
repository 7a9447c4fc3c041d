//! CEL function signatures and the builtin catalog.
//!
//! This module provides:
//! - `SemanticType` and `ArgumentSyntax`, the shapes signatures are written against
//! - `FixedParameter` / `VariableParameter` descriptors
//! - `SignatureBuilder`, which produces immutable `FunctionSignature` values
//! - `FunctionCatalog`, the registry of overload sets including the builtins

mod argument;
mod builder;
mod builtins;
mod catalog;
mod function;
mod parameter;
mod semantic;

pub use argument::{ArgumentSyntax, LiteralValue};
pub use builder::{
    InvariantValidator, SignatureBuilder, SignatureError, SignatureValidator, ValidationPolicy,
};
pub use catalog::{Extension, FunctionCatalog};
pub use function::{FunctionFlags, FunctionSignature, ReturnTypeRule};
pub use parameter::{FixedParameter, VariableParameter};
pub use semantic::SemanticType;
pub(crate) use semantic::QUALIFIED_NAME;
