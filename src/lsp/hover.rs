//! Hover documentation for catalog functions.

use std::sync::Arc;

use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position};

use crate::document::LineIndex;
use crate::types::{FunctionCatalog, FunctionFlags, FunctionSignature};

/// Format an overload set as markdown.
///
/// Every overload's signature is listed in one code block, followed by the
/// distinct descriptions, the combined flags, and the first example.
pub fn format_overload_docs(name: &str, overloads: &[Arc<FunctionSignature>]) -> String {
    let signatures: Vec<String> = overloads.iter().map(|sig| sig.to_string()).collect();
    let mut doc = format!("**{}**\n\n```cel\n{}\n```", name, signatures.join("\n"));

    let flags = overloads
        .iter()
        .fold(FunctionFlags::empty(), |acc, sig| acc | sig.flags());
    if flags.contains(FunctionFlags::DEPRECATED) {
        doc.push_str("\n\n**Deprecated.**");
    }

    let mut descriptions: Vec<&str> = Vec::new();
    for sig in overloads {
        let description = sig.description();
        if !description.is_empty() && !descriptions.contains(&description) {
            descriptions.push(description);
        }
    }
    for description in descriptions {
        doc.push_str(&format!("\n\n{}", description));
    }

    if !flags.is_empty() {
        doc.push_str(&format!("\n\n*Flags:* {}", flags.names().join(", ")));
    }

    if let Some(example) = overloads.iter().find_map(|sig| sig.example()) {
        doc.push_str(&format!("\n\n*Example:* `{}`", example));
    }

    doc
}

/// Find the catalog function named at `offset`.
///
/// A dotted identifier is first tried whole (`math.greatest`); otherwise the
/// dot-separated segment under the cursor is used (`size` in `x.size`).
fn function_at_offset(
    line_index: &LineIndex,
    catalog: &FunctionCatalog,
    offset: usize,
) -> Option<(String, std::ops::Range<usize>)> {
    let span = line_index.identifier_at(offset)?;
    let text = &line_index.source()[span.clone()];
    if catalog.contains(text) {
        return Some((text.to_string(), span));
    }

    let mut segment_start = span.start;
    for segment in text.split('.') {
        let segment_end = segment_start + segment.len();
        if (segment_start..=segment_end).contains(&offset) && catalog.contains(segment) {
            return Some((segment.to_string(), segment_start..segment_end));
        }
        segment_start = segment_end + 1;
    }
    None
}

/// Get hover information at a position.
pub fn hover_at_position(
    line_index: &LineIndex,
    catalog: &FunctionCatalog,
    position: Position,
) -> Option<Hover> {
    let offset = line_index.position_to_offset(position)?;
    let (name, span) = function_at_offset(line_index, catalog, offset)?;

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: format_overload_docs(&name, catalog.overloads(&name)),
        }),
        range: Some(line_index.span_to_range(&span)),
    })
}
