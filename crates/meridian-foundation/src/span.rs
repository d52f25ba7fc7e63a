//! Source location tracking for diagnostics.
//!
//! Analysis results refer back to source text through two structures:
//!
//! - `Span` — compact byte range within one file
//! - `SourceMap` — all source files of a run, with line indexing
//!
//! Spans are never embedded in IR nodes; the parser records them in an
//! id-keyed [`LocationTable`](crate::LocationTable) so the IR stays a pure
//! value tree.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Compact source location reference.
///
/// Points to a byte range in a source file with a cached line number for
/// cheap one-line error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Index into `SourceMap::files`
    pub file_id: u16,
    /// Byte offset of start position
    pub start: u32,
    /// Byte offset of end position (exclusive)
    pub end: u32,
    /// Cached 1-based line number of the start position
    pub start_line: u16,
}

/// 1-based line/column position, the unit of the external source-map
/// contract (`id → {start, end}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl Span {
    pub fn new(file_id: u16, start: u32, end: u32, start_line: u16) -> Self {
        Self {
            file_id,
            start,
            end,
            start_line,
        }
    }

    /// Zero-length span at the start of a file.
    pub fn zero(file_id: u16) -> Self {
        Self::new(file_id, 0, 0, 1)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans into one covering both.
    ///
    /// # Panics
    /// Panics if the spans are from different files.
    pub fn merge(&self, other: &Span) -> Span {
        assert_eq!(
            self.file_id, other.file_id,
            "cannot merge spans from different files"
        );
        Span {
            file_id: self.file_id,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            start_line: self.start_line.min(other.start_line),
        }
    }
}

/// Collection of all source files in a run.
///
/// Converts spans into human-readable positions and snippets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

/// A single source file with line indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub source: String,
    /// Byte offsets of each line start; `line_starts[0]` is always 0 and
    /// the last element is an EOF sentinel.
    line_starts: Vec<u32>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Add a source file and return its id.
    pub fn add_file(&mut self, path: PathBuf, source: String) -> u16 {
        let file_id = self.files.len();
        assert!(file_id < u16::MAX as usize, "too many source files");
        self.files.push(SourceFile::new(path, source));
        file_id as u16
    }

    pub fn file_path(&self, span: &Span) -> &Path {
        &self.files[span.file_id as usize].path
    }

    /// Source text covered by a span.
    pub fn snippet(&self, span: &Span) -> &str {
        let file = &self.files[span.file_id as usize];
        &file.source[span.start as usize..span.end as usize]
    }

    /// Start and end positions of a span, both 1-based.
    pub fn range(&self, span: &Span) -> (LineCol, LineCol) {
        let file = &self.files[span.file_id as usize];
        (file.line_col(span.start), file.line_col(span.end))
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

impl SourceFile {
    pub fn new(path: PathBuf, source: String) -> Self {
        let line_starts = compute_line_starts(&source);
        Self {
            path,
            source,
            line_starts,
        }
    }

    /// Line/column for a byte offset, 1-based.
    ///
    /// # Panics
    /// Panics if the offset is beyond EOF.
    pub fn line_col(&self, offset: u32) -> LineCol {
        assert!(
            offset <= self.source.len() as u32,
            "offset {} is beyond EOF (len = {})",
            offset,
            self.source.len()
        );

        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.max(1) - 1,
        };

        LineCol {
            line: (line_idx + 1) as u32,
            col: (offset - self.line_starts[line_idx]) + 1,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len() - 1
    }
}

fn compute_line_starts(source: &str) -> Vec<u32> {
    let mut line_starts = vec![0];

    for (idx, ch) in source.char_indices() {
        if ch == '\n' {
            line_starts.push((idx + 1) as u32);
        }
    }

    if line_starts.last() != Some(&(source.len() as u32)) {
        line_starts.push(source.len() as u32);
    }

    line_starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_creation() {
        let span = Span::new(0, 10, 20, 1);
        assert_eq!(span.file_id, 0);
        assert!(!span.is_empty());

        let empty = Span::zero(0);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_span_merge() {
        let merged = Span::new(0, 10, 20, 1).merge(&Span::new(0, 15, 30, 1));
        assert_eq!(merged.start, 10);
        assert_eq!(merged.end, 30);
    }

    #[test]
    #[should_panic(expected = "cannot merge spans from different files")]
    fn test_span_merge_panics_on_different_files() {
        let _ = Span::new(0, 0, 1, 1).merge(&Span::new(1, 0, 1, 1));
    }

    #[test]
    fn test_line_col() {
        let file = SourceFile::new(PathBuf::from("test.mdn"), "hello\nworld\n".to_string());

        assert_eq!(file.line_col(0), LineCol { line: 1, col: 1 });
        assert_eq!(file.line_col(6), LineCol { line: 2, col: 1 });
        assert_eq!(file.line_col(11), LineCol { line: 2, col: 6 });
    }

    #[test]
    fn test_source_map_range_and_snippet() {
        let mut map = SourceMap::new();
        let file_id = map.add_file(
            PathBuf::from("test.mdn"),
            "val x = 1\nval y = 2".to_string(),
        );

        let span = Span::new(file_id, 0, 9, 1);
        assert_eq!(map.snippet(&span), "val x = 1");
        let (start, end) = map.range(&span);
        assert_eq!(start, LineCol { line: 1, col: 1 });
        assert_eq!(end, LineCol { line: 1, col: 10 });
    }

    #[test]
    #[should_panic(expected = "beyond EOF")]
    fn test_line_col_panics_out_of_bounds() {
        let file = SourceFile::new(PathBuf::from("test.mdn"), "abc".to_string());
        let _ = file.line_col(4);
    }
}
