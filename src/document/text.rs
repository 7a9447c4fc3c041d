//! Position conversion for CEL source text.
//!
//! The protocol addresses text by line and UTF-16 column while the catalog
//! lookups work on byte offsets into the source string.

use std::ops::Range;

use tower_lsp::lsp_types::Position;

/// Line start table over an owned copy of a document.
#[derive(Debug, Clone)]
pub struct LineIndex {
    source: String,
    /// Byte offset of the first character on each line.
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: String) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self {
            source,
            line_starts,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Byte bounds of `line`, not counting its terminating newline.
    fn line_bounds(&self, line: usize) -> Option<(usize, usize)> {
        let start = *self.line_starts.get(line)?;
        let end = match self.line_starts.get(line + 1) {
            Some(next) => next - 1,
            None => self.source.len(),
        };
        Some((start, end))
    }

    /// Convert a byte offset to a line and UTF-16 column.
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let start = self.line_starts[line];

        let column: usize = self.source[start..]
            .char_indices()
            .take_while(|(i, _)| start + i < offset)
            .map(|(_, c)| c.len_utf16())
            .sum();

        Position::new(line as u32, column as u32)
    }

    /// Convert a line and UTF-16 column to a byte offset.
    ///
    /// Columns past the end of the line clamp to the line end. Returns None
    /// for a line that does not exist.
    pub fn position_to_offset(&self, position: Position) -> Option<usize> {
        let (start, end) = self.line_bounds(position.line as usize)?;

        let mut column = 0u32;
        for (i, c) in self.source[start..end].char_indices() {
            if column >= position.character {
                return Some(start + i);
            }
            column += c.len_utf16() as u32;
        }
        Some(end)
    }

    /// Byte range of the (possibly dotted) identifier touching `offset`.
    ///
    /// The cursor may sit anywhere inside the identifier or directly after
    /// its last character. Returns None if no identifier touches `offset`.
    pub fn identifier_at(&self, offset: usize) -> Option<Range<usize>> {
        let mut offset = offset.min(self.source.len());
        while !self.source.is_char_boundary(offset) {
            offset -= 1;
        }
        let bytes = self.source.as_bytes();
        let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_' || b == b'.';

        let start = offset
            - bytes[..offset]
                .iter()
                .rev()
                .take_while(|b| is_ident(**b))
                .count();
        let end = offset
            + bytes[offset..]
                .iter()
                .take_while(|b| is_ident(**b))
                .count();

        // Dots only join identifiers; trim them from the edges.
        let text = &self.source[start..end];
        let lead = text.len() - text.trim_start_matches('.').len();
        let trail = text.len() - text.trim_end_matches('.').len();
        let (start, end) = (start + lead, end - trail);

        (start < end).then_some(start..end)
    }

    /// Convert a byte span to an LSP range.
    pub fn span_to_range(&self, span: &Range<usize>) -> tower_lsp::lsp_types::Range {
        tower_lsp::lsp_types::Range::new(
            self.offset_to_position(span.start),
            self.offset_to_position(span.end),
        )
    }
}
