//! Fluent construction of function signatures.
//!
//! ```
//! use celsig::{SemanticType, SignatureBuilder};
//!
//! let concat = SignatureBuilder::new("concat")
//!     .with_description("Concatenates two strings.")
//!     .with_required_parameter("a", SemanticType::String, "First string")
//!     .with_optional_parameter("b", SemanticType::String, "Second string")
//!     .with_return_type(SemanticType::String)
//!     .build();
//!
//! assert_eq!(concat.to_string(), "concat(a: string, b?: string) -> string");
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use super::argument::ArgumentSyntax;
use super::function::{FunctionFlags, FunctionSignature, ReturnTypeRule};
use super::parameter::{FixedParameter, VariableParameter};
use super::semantic::SemanticType;

/// A signature that breaks a structural invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("function '{function}': required parameter '{parameter}' follows an optional parameter")]
    RequiredAfterOptional { function: String, parameter: String },

    #[error("function '{function}': optional parameter '{parameter}' precedes the variable parameter")]
    OptionalBeforeVariadic { function: String, parameter: String },

    #[error("function '{function}': duplicate parameter name '{parameter}'")]
    DuplicateParameter { function: String, parameter: String },

    #[error("function '{function}': {message}")]
    Custom { function: String, message: String },
}

/// Checks a finished signature before it is handed out.
///
/// Implement this to layer domain-specific rules on top of
/// [`InvariantValidator`].
pub trait SignatureValidator {
    fn validate(&self, signature: &FunctionSignature) -> Result<(), SignatureError>;
}

/// Enforces parameter ordering and name uniqueness:
/// - every required fixed parameter precedes every optional one
/// - no optional fixed parameter sits directly before the variable parameter
/// - fixed parameter names are unique
#[derive(Debug, Clone, Copy, Default)]
pub struct InvariantValidator;

impl SignatureValidator for InvariantValidator {
    fn validate(&self, signature: &FunctionSignature) -> Result<(), SignatureError> {
        let function = signature.name();
        let params = signature.fixed_parameters();

        let mut seen = HashSet::new();
        for param in params {
            if !seen.insert(param.name()) {
                return Err(SignatureError::DuplicateParameter {
                    function: function.to_string(),
                    parameter: param.name().to_string(),
                });
            }
        }

        if let Some(first_optional) = params.iter().position(|p| !p.is_required()) {
            if let Some(late) = params[first_optional..].iter().find(|p| p.is_required()) {
                return Err(SignatureError::RequiredAfterOptional {
                    function: function.to_string(),
                    parameter: late.name().to_string(),
                });
            }
        }

        if signature.variable_parameter().is_some() {
            if let Some(last) = params.last().filter(|p| !p.is_required()) {
                return Err(SignatureError::OptionalBeforeVariadic {
                    function: function.to_string(),
                    parameter: last.name().to_string(),
                });
            }
        }

        Ok(())
    }
}

/// How strictly a builder is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationPolicy {
    /// Accept malformed parameter shapes.
    #[default]
    Lenient,
    /// Reject signatures that fail [`InvariantValidator`].
    Strict,
}

/// Accumulates the parts of a signature. Every `with_*` call consumes and
/// returns the builder so calls chain.
#[derive(Clone)]
pub struct SignatureBuilder {
    name: String,
    description: String,
    example: Option<String>,
    return_type: SemanticType,
    return_type_rule: ReturnTypeRule,
    fixed_parameters: Vec<FixedParameter>,
    variable_parameter: Option<VariableParameter>,
    flags: FunctionFlags,
}

impl SignatureBuilder {
    /// Start a signature returning `dyn` with no parameters and no flags.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            example: None,
            return_type: SemanticType::top(),
            return_type_rule: Arc::new(|_: &[ArgumentSyntax]| SemanticType::top()),
            fixed_parameters: Vec::new(),
            variable_parameter: None,
            flags: FunctionFlags::empty(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// Fix the return type regardless of arguments.
    pub fn with_return_type(mut self, return_type: SemanticType) -> Self {
        let fixed = return_type.clone();
        self.return_type = return_type;
        self.return_type_rule = Arc::new(move |_: &[ArgumentSyntax]| fixed.clone());
        self
    }

    /// Compute the return type from the call-site arguments.
    ///
    /// The rule is evaluated once with no arguments to obtain the
    /// representative return type.
    pub fn with_dynamic_return_type<F>(mut self, rule: F) -> Self
    where
        F: Fn(&[ArgumentSyntax]) -> SemanticType + Send + Sync + 'static,
    {
        self.return_type = rule(&[]);
        self.return_type_rule = Arc::new(rule);
        self
    }

    pub fn with_required_parameter(
        mut self,
        name: impl Into<String>,
        ty: SemanticType,
        description: impl Into<String>,
    ) -> Self {
        self.fixed_parameters
            .push(FixedParameter::new(name, description, ty, true));
        self
    }

    pub fn with_optional_parameter(
        mut self,
        name: impl Into<String>,
        ty: SemanticType,
        description: impl Into<String>,
    ) -> Self {
        self.fixed_parameters
            .push(FixedParameter::new(name, description, ty, false));
        self
    }

    /// Set the trailing variable parameter, replacing any earlier one.
    pub fn with_variable_parameter(
        mut self,
        name_prefix: impl Into<String>,
        ty: SemanticType,
        minimum_count: usize,
        description: impl Into<String>,
    ) -> Self {
        self.variable_parameter = Some(VariableParameter::new(
            name_prefix,
            description,
            ty,
            minimum_count,
        ));
        self
    }

    /// Replace the flag set. Flags are not merged with earlier calls.
    pub fn with_flags(mut self, flags: FunctionFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Snapshot the accumulated state. Never fails, even for malformed
    /// parameter shapes; see [`build_strict`](Self::build_strict).
    pub fn build(&self) -> FunctionSignature {
        FunctionSignature::new(
            self.name.clone(),
            self.description.clone(),
            self.example.clone(),
            self.return_type.clone(),
            Arc::clone(&self.return_type_rule),
            self.fixed_parameters.clone(),
            self.variable_parameter.clone(),
            self.flags,
        )
    }

    /// Check the accumulated state against [`InvariantValidator`].
    pub fn validate(&self) -> Result<(), SignatureError> {
        InvariantValidator.validate(&self.build())
    }

    pub fn build_strict(&self) -> Result<FunctionSignature, SignatureError> {
        self.build_with(&InvariantValidator)
    }

    pub fn build_with(
        &self,
        validator: &dyn SignatureValidator,
    ) -> Result<FunctionSignature, SignatureError> {
        let signature = self.build();
        validator.validate(&signature)?;
        Ok(signature)
    }

    pub fn finish(&self, policy: ValidationPolicy) -> Result<FunctionSignature, SignatureError> {
        match policy {
            ValidationPolicy::Lenient => Ok(self.build()),
            ValidationPolicy::Strict => self.build_strict(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::types::LiteralValue;

    #[test]
    fn defaults() {
        let sig = SignatureBuilder::new("f").build();
        assert_eq!(sig.name(), "f");
        assert_eq!(sig.description(), "");
        assert_eq!(sig.return_type(), &SemanticType::top());
        assert_eq!(
            sig.return_type_for(&[ArgumentSyntax::typed(SemanticType::Int)]),
            SemanticType::top()
        );
        assert!(sig.fixed_parameters().is_empty());
        assert!(sig.variable_parameter().is_none());
        assert!(sig.flags().is_empty());
    }

    #[test]
    fn fixed_parameters_keep_insertion_order() {
        let sig = SignatureBuilder::new("f")
            .with_required_parameter("a", SemanticType::Int, "")
            .with_required_parameter("b", SemanticType::String, "")
            .with_optional_parameter("c", SemanticType::Bool, "")
            .with_optional_parameter("d", SemanticType::Double, "")
            .build();
        let names: Vec<_> = sig.fixed_parameters().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        let required: Vec<_> = sig
            .fixed_parameters()
            .iter()
            .map(|p| p.is_required())
            .collect();
        assert_eq!(required, vec![true, true, false, false]);
    }

    #[test]
    fn static_return_type_ignores_arguments() {
        let sig = SignatureBuilder::new("f")
            .with_return_type(SemanticType::Bool)
            .build();
        assert_eq!(sig.return_type(), &SemanticType::Bool);
        assert_eq!(sig.return_type_for(&[]), SemanticType::Bool);
        assert_eq!(
            sig.return_type_for(&[
                ArgumentSyntax::typed(SemanticType::Int),
                ArgumentSyntax::literal(LiteralValue::String("x".into())),
            ]),
            SemanticType::Bool
        );
    }

    #[test]
    fn dynamic_return_type_stores_zero_argument_result() {
        let sig = SignatureBuilder::new("f")
            .with_dynamic_return_type(|args| match args.len() {
                0 => SemanticType::Null,
                1 => SemanticType::Int,
                _ => SemanticType::String,
            })
            .build();
        assert_eq!(sig.return_type(), &SemanticType::Null);
        assert_eq!(
            sig.return_type_for(&[ArgumentSyntax::typed(SemanticType::Bool)]),
            SemanticType::Int
        );
    }

    #[test]
    #[should_panic(expected = "needs an argument")]
    fn failing_rule_fails_at_configuration() {
        let _ = SignatureBuilder::new("f").with_dynamic_return_type(|args| {
            if args.is_empty() {
                panic!("needs an argument");
            }
            SemanticType::Int
        });
    }

    #[test]
    fn rule_runs_once_at_configuration_not_at_build() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let builder = SignatureBuilder::new("f").with_dynamic_return_type(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            SemanticType::Int
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let sig = builder.build();
        let _ = builder.build();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(sig.return_type(), &SemanticType::Int);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        sig.return_type_for(&[]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn later_return_type_call_wins() {
        let sig = SignatureBuilder::new("f")
            .with_dynamic_return_type(|_| SemanticType::Int)
            .with_return_type(SemanticType::Bytes)
            .build();
        assert_eq!(sig.return_type(), &SemanticType::Bytes);
        assert_eq!(sig.return_type_for(&[]), SemanticType::Bytes);
    }

    #[test]
    fn flags_are_replaced_not_merged() {
        let sig = SignatureBuilder::new("f")
            .with_flags(FunctionFlags::GLOBAL | FunctionFlags::DEPRECATED)
            .with_flags(FunctionFlags::METHOD)
            .build();
        assert_eq!(sig.flags(), FunctionFlags::METHOD);
    }

    #[test]
    fn variable_parameter_last_call_wins() {
        let sig = SignatureBuilder::new("f")
            .with_variable_parameter("a", SemanticType::Int, 0, "first")
            .with_variable_parameter("b", SemanticType::String, 2, "second")
            .build();
        let var = sig.variable_parameter().unwrap();
        assert_eq!(var.name_prefix(), "b");
        assert_eq!(var.ty(), &SemanticType::String);
        assert_eq!(var.minimum_count(), 2);
        assert_eq!(var.description(), "second");
    }

    #[test]
    fn identical_configuration_builds_equal_signatures() {
        let configure = || {
            SignatureBuilder::new("f")
                .with_description("doc")
                .with_required_parameter("a", SemanticType::Int, "a")
                .with_return_type(SemanticType::Int)
                .with_flags(FunctionFlags::GLOBAL)
        };
        assert_eq!(configure().build(), configure().build());

        let builder = configure();
        assert_eq!(builder.build(), builder.build());
    }

    #[test]
    fn concat_scenario() {
        let sig = SignatureBuilder::new("concat")
            .with_required_parameter("a", SemanticType::String, "")
            .with_optional_parameter("b", SemanticType::String, "")
            .with_return_type(SemanticType::String)
            .build();
        let params = sig.fixed_parameters();
        assert_eq!(params.len(), 2);
        assert_eq!((params[0].name(), params[0].is_required()), ("a", true));
        assert_eq!((params[1].name(), params[1].is_required()), ("b", false));
        assert_eq!(sig.return_type(), &SemanticType::String);
    }

    #[test]
    fn first_scenario() {
        let sig = SignatureBuilder::new("first")
            .with_variable_parameter("item", SemanticType::top(), 1, "")
            .with_dynamic_return_type(|args| {
                args.first()
                    .map(|a| a.static_type().clone())
                    .unwrap_or_else(SemanticType::top)
            })
            .build();
        assert_eq!(sig.return_type_for(&[]), SemanticType::top());
        assert_eq!(sig.return_type(), &SemanticType::top());
        assert_eq!(
            sig.return_type_for(&[ArgumentSyntax::typed(SemanticType::Int)]),
            SemanticType::Int
        );
    }

    #[test]
    fn lenient_build_accepts_required_after_optional() {
        let builder = SignatureBuilder::new("f")
            .with_optional_parameter("a", SemanticType::Int, "")
            .with_required_parameter("b", SemanticType::Int, "");
        let sig = builder.build();
        assert_eq!(sig.fixed_parameters().len(), 2);
        assert!(builder.finish(ValidationPolicy::Lenient).is_ok());
    }

    #[test]
    fn strict_rejects_required_after_optional() {
        let err = SignatureBuilder::new("f")
            .with_required_parameter("a", SemanticType::Int, "")
            .with_optional_parameter("b", SemanticType::Int, "")
            .with_required_parameter("c", SemanticType::Int, "")
            .build_strict()
            .unwrap_err();
        assert_eq!(
            err,
            SignatureError::RequiredAfterOptional {
                function: "f".into(),
                parameter: "c".into()
            }
        );
        assert_eq!(
            err.to_string(),
            "function 'f': required parameter 'c' follows an optional parameter"
        );
    }

    #[test]
    fn strict_rejects_optional_before_variadic() {
        let err = SignatureBuilder::new("f")
            .with_optional_parameter("sep", SemanticType::String, "")
            .with_variable_parameter("item", SemanticType::top(), 0, "")
            .finish(ValidationPolicy::Strict)
            .unwrap_err();
        assert_eq!(
            err,
            SignatureError::OptionalBeforeVariadic {
                function: "f".into(),
                parameter: "sep".into()
            }
        );
    }

    #[test]
    fn strict_rejects_duplicate_names() {
        let err = SignatureBuilder::new("f")
            .with_required_parameter("x", SemanticType::Int, "")
            .with_required_parameter("x", SemanticType::String, "")
            .validate()
            .unwrap_err();
        assert!(matches!(err, SignatureError::DuplicateParameter { .. }));
    }

    #[test]
    fn strict_accepts_well_formed_signature() {
        let sig = SignatureBuilder::new("f")
            .with_required_parameter("a", SemanticType::Int, "")
            .with_variable_parameter("rest", SemanticType::Int, 0, "")
            .build_strict()
            .unwrap();
        assert_eq!(sig.name(), "f");
    }

    #[test]
    fn custom_validator() {
        struct NeedsDescription;

        impl SignatureValidator for NeedsDescription {
            fn validate(&self, signature: &FunctionSignature) -> Result<(), SignatureError> {
                if signature.description().is_empty() {
                    return Err(SignatureError::Custom {
                        function: signature.name().to_string(),
                        message: "missing description".to_string(),
                    });
                }
                Ok(())
            }
        }

        let builder = SignatureBuilder::new("f");
        let err = builder.build_with(&NeedsDescription).unwrap_err();
        assert_eq!(err.to_string(), "function 'f': missing description");
        assert!(builder
            .with_description("documented")
            .build_with(&NeedsDescription)
            .is_ok());
    }

    #[test]
    fn signatures_are_shareable_across_threads() {
        let sig = Arc::new(
            SignatureBuilder::new("type")
                .with_dynamic_return_type(|args| {
                    SemanticType::type_of(
                        args.first()
                            .map(|a| a.static_type().widen())
                            .unwrap_or_else(SemanticType::top),
                    )
                })
                .build(),
        );
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sig = Arc::clone(&sig);
                std::thread::spawn(move || {
                    sig.return_type_for(&[ArgumentSyntax::typed(SemanticType::Int)])
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(
                handle.join().unwrap(),
                SemanticType::type_of(SemanticType::Int)
            );
        }
    }
}
