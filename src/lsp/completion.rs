//! Completion support for catalog functions.
//!
//! Completions are driven purely by the text before the cursor: after a `.`
//! only functions callable in receiver form are offered, otherwise global
//! functions and macros. Namespaced functions (`math.greatest`) match on
//! their full dotted name.

use std::sync::Arc;

use tower_lsp::lsp_types::*;

use crate::document::LineIndex;
use crate::types::{FunctionCatalog, FunctionFlags, FunctionSignature};

use super::hover::format_overload_docs;

/// What kind of completion context we detected.
#[derive(Debug)]
enum CompletionContext {
    /// Cursor follows `receiver.`; suggest methods.
    /// `qualified` is the full dotted text, for namespaced globals.
    MemberAccess { prefix: String, qualified: String },
    /// Cursor is at a bare or partial identifier; suggest globals and macros.
    Identifier { prefix: String },
}

/// Detect the completion context by scanning backwards from the cursor.
fn detect_context(source: &str, offset: usize) -> CompletionContext {
    let before = &source[..offset];

    let ident_len = before
        .bytes()
        .rev()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    let prefix = &before[before.len() - ident_len..];

    let before_prefix = &before[..before.len() - ident_len];
    if !before_prefix.ends_with('.') {
        return CompletionContext::Identifier {
            prefix: prefix.to_string(),
        };
    }

    let dotted_len = before
        .bytes()
        .rev()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'.')
        .count();
    CompletionContext::MemberAccess {
        prefix: prefix.to_string(),
        qualified: before[before.len() - dotted_len..].to_string(),
    }
}

fn matches_prefix(name: &str, prefix: &str) -> bool {
    prefix.is_empty() || name.to_lowercase().starts_with(&prefix.to_lowercase())
}

/// Build one completion item for an overload set.
fn completion_item(
    label: &str,
    overloads: &[Arc<FunctionSignature>],
    sort_group: u8,
) -> CompletionItem {
    let flags = overloads
        .iter()
        .fold(FunctionFlags::empty(), |acc, sig| acc | sig.flags());

    let kind = if flags.contains(FunctionFlags::MACRO) {
        CompletionItemKind::KEYWORD
    } else if sort_group == 1 {
        CompletionItemKind::METHOD
    } else {
        CompletionItemKind::FUNCTION
    };

    let detail = overloads.first().map(|first| match overloads.len() {
        1 => first.to_string(),
        n => format!("{} (+{} overloads)", first, n - 1),
    });

    let name = overloads.first().map_or(label, |sig| sig.name());

    CompletionItem {
        label: label.to_string(),
        kind: Some(kind),
        detail,
        documentation: Some(Documentation::MarkupContent(MarkupContent {
            kind: MarkupKind::Markdown,
            value: format_overload_docs(name, overloads),
        })),
        tags: flags
            .contains(FunctionFlags::DEPRECATED)
            .then(|| vec![CompletionItemTag::DEPRECATED]),
        sort_text: Some(format!("{}_{}", sort_group, label)),
        ..Default::default()
    }
}

/// Methods callable as `receiver.name(...)`.
fn member_completions(
    catalog: &FunctionCatalog,
    prefix: &str,
    qualified: &str,
) -> Vec<CompletionItem> {
    let mut items = Vec::new();

    for (name, overloads) in catalog.iter() {
        let methods: Vec<Arc<FunctionSignature>> = overloads
            .iter()
            .filter(|sig| sig.has_flag(FunctionFlags::METHOD))
            .cloned()
            .collect();
        if !methods.is_empty() && !name.contains('.') && matches_prefix(name, prefix) {
            items.push(completion_item(name, &methods, 1));
        }

        // `math.gr` may also be the start of a namespaced global.
        if name.contains('.') && matches_prefix(name, qualified) {
            let label = &name[qualified.len() - prefix.len()..];
            items.push(completion_item(label, overloads, 0));
        }
    }

    items
}

/// Global functions and macros callable as `name(...)`.
fn identifier_completions(catalog: &FunctionCatalog, prefix: &str) -> Vec<CompletionItem> {
    let mut items = Vec::new();

    for (name, overloads) in catalog.iter() {
        if !matches_prefix(name, prefix) {
            continue;
        }
        let globals: Vec<Arc<FunctionSignature>> = overloads
            .iter()
            .filter(|sig| sig.has_flag(FunctionFlags::GLOBAL))
            .cloned()
            .collect();
        if !globals.is_empty() {
            items.push(completion_item(name, &globals, 2));
        }
    }

    items
}

/// Generate completions at a position in a CEL expression.
pub fn completion_at_position(
    line_index: &LineIndex,
    catalog: &FunctionCatalog,
    position: Position,
) -> Option<CompletionResponse> {
    let offset = line_index.position_to_offset(position)?;
    let context = detect_context(line_index.source(), offset);

    let items = match context {
        CompletionContext::MemberAccess { prefix, qualified } => {
            member_completions(catalog, &prefix, &qualified)
        }
        CompletionContext::Identifier { prefix } => identifier_completions(catalog, &prefix),
    };

    if items.is_empty() {
        None
    } else {
        Some(CompletionResponse::Array(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Extension, SemanticType, SignatureBuilder};

    fn get_completions(source: &str, catalog: &FunctionCatalog) -> Vec<CompletionItem> {
        let line_index = LineIndex::new(source.to_string());
        let position = line_index.offset_to_position(source.len());
        match completion_at_position(&line_index, catalog, position) {
            Some(CompletionResponse::Array(items)) => items,
            Some(_) => panic!("Expected array response"),
            None => vec![],
        }
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn bare_identifier_suggests_globals() {
        let catalog = FunctionCatalog::with_builtins();
        let items = get_completions("si", &catalog);
        assert_eq!(labels(&items), vec!["size"]);
        assert_eq!(items[0].kind, Some(CompletionItemKind::FUNCTION));
        assert_eq!(
            items[0].detail.as_deref(),
            Some("size(value: string) -> int (+3 overloads)")
        );
    }

    #[test]
    fn bare_identifier_excludes_methods() {
        let catalog = FunctionCatalog::with_builtins();
        let names = labels(&get_completions("", &catalog))
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        assert!(names.contains(&"int".to_string()));
        assert!(names.contains(&"has".to_string()));
        assert!(!names.contains(&"startsWith".to_string()));
        assert!(!names.contains(&"all".to_string()));
    }

    #[test]
    fn macros_are_keywords() {
        let catalog = FunctionCatalog::with_builtins();
        let items = get_completions("ha", &catalog);
        assert_eq!(labels(&items), vec!["has"]);
        assert_eq!(items[0].kind, Some(CompletionItemKind::KEYWORD));

        let items = get_completions("[1].ex", &catalog);
        assert_eq!(labels(&items), vec!["exists", "exists_one"]);
        assert!(items.iter().all(|i| i.kind == Some(CompletionItemKind::KEYWORD)));
    }

    #[test]
    fn member_access_suggests_methods() {
        let catalog = FunctionCatalog::with_builtins();
        let items = get_completions("name.sta", &catalog);
        assert_eq!(labels(&items), vec!["startsWith"]);
        assert_eq!(items[0].kind, Some(CompletionItemKind::METHOD));

        let names = labels(&get_completions("x.", &catalog))
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        assert!(names.contains(&"size".to_string()));
        assert!(names.contains(&"getHours".to_string()));
        assert!(!names.contains(&"int".to_string()));
    }

    #[test]
    fn namespaced_global_completes_after_namespace() {
        let catalog = FunctionCatalog::with_builtins().with_extension(Extension::Math);
        let items = get_completions("math.gr", &catalog);
        assert_eq!(labels(&items), vec!["greatest"]);
        assert_eq!(items[0].kind, Some(CompletionItemKind::FUNCTION));

        let items = get_completions("ma", &catalog);
        assert_eq!(labels(&items), vec!["math.greatest", "math.least"]);
    }

    #[test]
    fn deprecated_items_are_tagged() {
        let mut catalog = FunctionCatalog::new();
        catalog.register(
            SignatureBuilder::new("legacy")
                .with_return_type(SemanticType::Int)
                .with_flags(FunctionFlags::GLOBAL | FunctionFlags::DEPRECATED)
                .build(),
        );
        let items = get_completions("leg", &catalog);
        assert_eq!(items[0].tags, Some(vec![CompletionItemTag::DEPRECATED]));
    }

    #[test]
    fn no_match_returns_none() {
        let catalog = FunctionCatalog::with_builtins();
        let line_index = LineIndex::new("zzz".to_string());
        assert!(completion_at_position(&line_index, &catalog, Position::new(0, 3)).is_none());
    }

    #[test]
    fn detect_context_member_access() {
        let ctx = detect_context("foo.", 4);
        assert!(matches!(
            ctx,
            CompletionContext::MemberAccess { ref prefix, ref qualified }
                if prefix.is_empty() && qualified == "foo."
        ));
    }

    #[test]
    fn detect_context_member_access_with_prefix() {
        let ctx = detect_context("foo.ba", 6);
        assert!(matches!(
            ctx,
            CompletionContext::MemberAccess { ref prefix, ref qualified }
                if prefix == "ba" && qualified == "foo.ba"
        ));
    }

    #[test]
    fn detect_context_dot_then_space_is_identifier() {
        let ctx = detect_context("x. acm", 6);
        assert!(matches!(ctx, CompletionContext::Identifier { ref prefix } if prefix == "acm"));
    }

    #[test]
    fn namespaced_global_after_spaced_dot_keeps_full_label() {
        let catalog = FunctionCatalog::with_builtins().with_extension(Extension::Math);
        let items = get_completions("x. ma", &catalog);
        assert_eq!(labels(&items), vec!["math.greatest", "math.least"]);
    }

    #[test]
    fn detect_context_identifier() {
        let ctx = detect_context("si", 2);
        assert!(matches!(ctx, CompletionContext::Identifier { ref prefix } if prefix == "si"));
    }

    #[test]
    fn detect_context_empty() {
        let ctx = detect_context("", 0);
        assert!(matches!(ctx, CompletionContext::Identifier { ref prefix } if prefix.is_empty()));
    }
}
