//! Settings infrastructure for celsig.
//!
//! This module provides support for loading and parsing settings.toml files
//! to configure the function catalog with extensions and custom function
//! declarations.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::{
    Extension, FunctionCatalog, FunctionFlags, FunctionSignature, SemanticType, SignatureBuilder,
    ValidationPolicy, QUALIFIED_NAME,
};

static PARAMETER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Root settings structure loaded from settings.toml.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Catalog configuration.
    pub catalog: Option<CatalogSettings>,
}

/// Settings for building the function catalog.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogSettings {
    /// Reject custom functions with malformed parameter lists (default: false).
    pub strict: Option<bool>,

    /// Extensions to enable: ["strings", "math", "protovalidate", "all"]
    pub extensions: Option<Vec<String>>,

    /// Custom function declarations.
    pub functions: Option<Vec<FunctionSettings>>,
}

/// One custom function declaration.
#[derive(Debug, Default, Deserialize)]
pub struct FunctionSettings {
    pub name: String,
    pub description: Option<String>,
    pub example: Option<String>,

    /// Return type string (default: dyn).
    /// Type strings are parsed using `SemanticType::parse`.
    pub returns: Option<String>,

    /// Flag names, e.g. ["global", "method"] (default: ["global"]).
    pub flags: Option<Vec<String>>,

    #[serde(default)]
    pub params: Vec<ParameterSettings>,

    pub variadic: Option<VariadicSettings>,
}

/// A fixed parameter of a custom function.
#[derive(Debug, Default, Deserialize)]
pub struct ParameterSettings {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub optional: bool,
    pub description: Option<String>,
}

/// The trailing variable parameter of a custom function.
#[derive(Debug, Default, Deserialize)]
pub struct VariadicSettings {
    pub prefix: String,
    /// Element type (default: dyn).
    #[serde(rename = "type")]
    pub ty: Option<String>,
    #[serde(default)]
    pub min: usize,
    pub description: Option<String>,
}

impl CatalogSettings {
    fn policy(&self) -> ValidationPolicy {
        if self.strict.unwrap_or(false) {
            ValidationPolicy::Strict
        } else {
            ValidationPolicy::Lenient
        }
    }
}

/// Load settings from a settings.toml file.
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), "failed to parse settings.toml: {}", e);
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

/// Discover settings.toml by searching up the directory tree, then direct children.
///
/// Search order:
/// 1. Walk up from `start_dir` to filesystem root
/// 2. If not found, check immediate child directories of `start_dir`
///
/// Returns `(settings, settings_dir)` where `settings_dir` is the directory
/// containing the found settings.toml.
/// If not found, returns `(Settings::default(), start_dir)`.
pub fn discover_settings(start_dir: &Path) -> (Settings, PathBuf) {
    // Phase 1: Walk up from start_dir
    let mut current = Some(start_dir);
    while let Some(dir) = current {
        let candidate = dir.join("settings.toml");
        if candidate.is_file() {
            debug!(path = %candidate.display(), "found settings");
            return (load_settings(&candidate), dir.to_path_buf());
        }
        current = dir.parent();
    }

    // Phase 2: Check immediate child directories
    if let Ok(entries) = std::fs::read_dir(start_dir) {
        for entry in entries.flatten() {
            if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
                let candidate = entry.path().join("settings.toml");
                if candidate.is_file() {
                    debug!(path = %candidate.display(), "found settings");
                    return (load_settings(&candidate), entry.path());
                }
            }
        }
    }

    (Settings::default(), start_dir.to_path_buf())
}

/// Build the function catalog described by `settings`.
///
/// Starts from the standard library, applies extensions, then registers each
/// custom function. Declarations that cannot be built are skipped with a
/// warning.
pub fn build_catalog(settings: &Settings) -> FunctionCatalog {
    let mut catalog = FunctionCatalog::with_builtins();

    let Some(ref catalog_settings) = settings.catalog else {
        return catalog;
    };

    if let Some(ref extensions) = catalog_settings.extensions {
        catalog = apply_extensions(catalog, extensions);
    }

    let policy = catalog_settings.policy();
    for decl in catalog_settings.functions.iter().flatten() {
        match signature_from_settings(decl, policy) {
            Ok(signature) => {
                debug!(signature = %signature, "registered custom function");
                catalog.register(signature);
            }
            Err(e) => {
                warn!("skipping custom function '{}': {}", decl.name, e);
            }
        }
    }

    catalog
}

/// Apply extension libraries based on extension names. Each library is
/// added at most once.
fn apply_extensions(mut catalog: FunctionCatalog, extensions: &[String]) -> FunctionCatalog {
    let mut enabled: Vec<Extension> = Vec::new();
    for ext_name in extensions {
        let requested = match ext_name.as_str() {
            "all" => Extension::ALL.to_vec(),
            other => match Extension::from_name(other) {
                Some(ext) => vec![ext],
                None => {
                    warn!("unknown extension: '{}'", other);
                    continue;
                }
            },
        };
        for ext in requested {
            if !enabled.contains(&ext) {
                enabled.push(ext);
                catalog = catalog.with_extension(ext);
            }
        }
    }
    catalog
}

/// Turn one declaration into a signature through the builder.
fn signature_from_settings(
    decl: &FunctionSettings,
    policy: ValidationPolicy,
) -> Result<FunctionSignature, String> {
    if !QUALIFIED_NAME.is_match(&decl.name) {
        return Err(format!("invalid function name '{}'", decl.name));
    }

    let mut builder = SignatureBuilder::new(decl.name.as_str());

    if let Some(ref description) = decl.description {
        builder = builder.with_description(description.as_str());
    }
    if let Some(ref example) = decl.example {
        builder = builder.with_example(example.as_str());
    }

    for param in &decl.params {
        if !PARAMETER_NAME.is_match(&param.name) {
            return Err(format!("invalid parameter name '{}'", param.name));
        }
        let ty = SemanticType::parse(&param.ty)
            .map_err(|e| format!("parameter '{}': {}", param.name, e))?;
        let description = param.description.clone().unwrap_or_default();
        builder = if param.optional {
            builder.with_optional_parameter(param.name.as_str(), ty, description)
        } else {
            builder.with_required_parameter(param.name.as_str(), ty, description)
        };
    }

    if let Some(ref variadic) = decl.variadic {
        if !PARAMETER_NAME.is_match(&variadic.prefix) {
            return Err(format!("invalid variadic prefix '{}'", variadic.prefix));
        }
        let ty = match variadic.ty {
            Some(ref ty) => SemanticType::parse(ty)
                .map_err(|e| format!("variadic '{}': {}", variadic.prefix, e))?,
            None => SemanticType::top(),
        };
        builder = builder.with_variable_parameter(
            variadic.prefix.as_str(),
            ty,
            variadic.min,
            variadic.description.clone().unwrap_or_default(),
        );
    }

    if let Some(ref returns) = decl.returns {
        let ty = SemanticType::parse(returns).map_err(|e| format!("return type: {}", e))?;
        builder = builder.with_return_type(ty);
    }

    builder = builder.with_flags(parse_flags(decl.flags.as_deref()));

    builder.finish(policy).map_err(|e| e.to_string())
}

/// Parse flag names, ignoring unknown ones. Defaults to `GLOBAL`.
fn parse_flags(names: Option<&[String]>) -> FunctionFlags {
    let Some(names) = names else {
        return FunctionFlags::GLOBAL;
    };

    let mut flags = FunctionFlags::empty();
    for name in names {
        match FunctionFlags::from_name_ignore_case(name) {
            Some(flag) => flags |= flag,
            None => warn!("unknown function flag: '{}'", name),
        }
    }
    flags
}
