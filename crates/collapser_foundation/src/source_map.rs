//! Mapping byte offsets in the assembled input back to source files.
//!
//! A manuscript is assembled by concatenating per-file chunks, each
//! preceded by a `% file <name>` marker line. The map answers "which
//! file, which line in that file" for any offset in the assembled text.

use crate::error::SourceContext;

/// Marker line prefix that introduces each file chunk.
pub const FILE_MARKER: &str = "% file ";

/// Resolves offsets in assembled source to file-relative positions.
#[derive(Clone, Copy, Debug)]
pub struct SourceMap<'src> {
    source: &'src str,
}

impl<'src> SourceMap<'src> {
    /// Creates a source map over the assembled text.
    #[must_use]
    pub const fn new(source: &'src str) -> Self {
        Self { source }
    }

    /// Builds a full [`SourceContext`] for the given byte offset.
    #[must_use]
    pub fn context(&self, offset: usize) -> SourceContext {
        let offset = self.clamp(offset);
        SourceContext::new(
            self.filename(offset),
            self.file_line(offset),
            self.column(offset),
            self.line_text(offset),
        )
    }

    /// Returns the name of the file chunk containing `offset`, or
    /// `"unknown file"` when no marker precedes it.
    #[must_use]
    pub fn filename(&self, offset: usize) -> String {
        let offset = self.clamp(offset);
        match self.marker_before(offset) {
            Some(m) => {
                let rest = &self.source[m + FILE_MARKER.len()..];
                rest.lines().next().unwrap_or("").trim().to_string()
            }
            None => "unknown file".to_string(),
        }
    }

    /// Returns the 1-based line number of `offset` within its file
    /// chunk, or the absolute line number when no marker precedes it.
    #[must_use]
    pub fn file_line(&self, offset: usize) -> usize {
        let offset = self.clamp(offset);
        match self.marker_before(offset) {
            // The marker line and the blank line after it account for
            // two newlines before the chunk's first line of content.
            Some(m) => self.source[m..offset]
                .matches('\n')
                .count()
                .saturating_sub(1),
            None => self.source[..offset].matches('\n').count() + 1,
        }
    }

    /// Returns the 1-based column of `offset` on its line.
    #[must_use]
    pub fn column(&self, offset: usize) -> usize {
        let offset = self.clamp(offset);
        offset - self.line_start(offset) + 1
    }

    /// Returns the full text of the line containing `offset`.
    #[must_use]
    pub fn line_text(&self, offset: usize) -> &'src str {
        let offset = self.clamp(offset);
        let start = self.line_start(offset);
        let end = self.source[start..]
            .find('\n')
            .map_or(self.source.len(), |p| start + p);
        &self.source[start..end]
    }

    fn marker_before(&self, offset: usize) -> Option<usize> {
        self.source[..offset].rfind(FILE_MARKER)
    }

    fn line_start(&self, offset: usize) -> usize {
        self.source[..offset].rfind('\n').map_or(0, |p| p + 1)
    }

    fn clamp(&self, mut offset: usize) -> usize {
        if offset >= self.source.len() {
            return self.source.len();
        }
        while !self.source.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}
