use serde::{Deserialize, Serialize};
use std::fmt;

/// A 1-based line/column range in a source file.
///
/// Spans are computed from byte offsets only when something is reported;
/// the compiler itself tracks plain offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}

/// Diagnostics show where a span starts: `line:col`.
impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// A named program text with a line index over it.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    /// Byte offset of the first byte of each line.
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    /// Text of 1-based line `n` without its terminator, for quoting in
    /// diagnostics.
    pub fn line(&self, n: u32) -> Option<&str> {
        let idx = (n as usize).checked_sub(1)?;
        let start = *self.line_starts.get(idx)?;
        let end = match self.line_starts.get(idx + 1) {
            Some(&next) => next - 1,
            None => self.source.len(),
        };
        self.source
            .get(start..end)
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 1-based (line, column) of a byte offset. Offsets past the end clamp
    /// to the end of the text.
    pub fn position(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.source.len());
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let col = offset - self.line_starts[idx];
        (idx as u32 + 1, col as u32 + 1)
    }

    /// Span covering the byte range `start..end`.
    pub fn span(&self, start: usize, end: usize) -> Span {
        let (start_line, start_col) = self.position(start);
        let (end_line, end_col) = self.position(end.max(start));
        Span::new(start_line, start_col, end_line, end_col)
    }
}
