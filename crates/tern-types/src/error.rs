use crate::{SourceFile, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Lexical,
    Syntax,
    Semantic,
    Resource,
}

/// Numeric compile error code (E100–E499).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Lexical errors (E100–E199) ──
    pub const MALFORMED_NUMBER: Self = Self(100);
    pub const INTEGER_OUT_OF_RANGE: Self = Self(101);
    pub const UNTERMINATED_STRING: Self = Self(102);
    pub const INVALID_ESCAPE: Self = Self(103);

    // ── Syntax errors (E200–E299) ──
    pub const UNEXPECTED_END: Self = Self(200);
    pub const EXPECTED_TOKEN: Self = Self(201);
    pub const EXPECTED_TERM: Self = Self(202);
    pub const UNEXPECTED_KEYWORD: Self = Self(203);
    pub const TRAILING_INPUT: Self = Self(204);
    pub const BAD_STATEMENT: Self = Self(205);

    // ── Semantic errors (E300–E399) ──
    pub const ARGUMENT_COUNT: Self = Self(300);
    pub const UNMATCHED_CONTROL: Self = Self(301);
    pub const UNTERMINATED_CONTROL: Self = Self(302);
    pub const REDEFINITION: Self = Self(303);
    pub const RESERVED_WORD: Self = Self(304);
    pub const DUPLICATE_PARAMETER: Self = Self(305);
    pub const MISPLACED_DEFINITION: Self = Self(306);
    pub const MISPLACED_RETURN: Self = Self(307);
    pub const BREAK_OUTSIDE_LOOP: Self = Self(308);

    // ── Resource errors (E400–E499) ──
    pub const TOO_COMPLEX: Self = Self(400);
    pub const TOO_MANY_LOCALS: Self = Self(401);
    pub const HEAP_EXHAUSTED: Self = Self(402);
    pub const CODE_OVERFLOW: Self = Self(403);
    pub const INVALID_LIMITS: Self = Self(404);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Lexical,
            200..=299 => ErrorCategory::Syntax,
            300..=399 => ErrorCategory::Semantic,
            _ => ErrorCategory::Resource,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexical => write!(f, "lexical"),
            Self::Syntax => write!(f, "syntax"),
            Self::Semantic => write!(f, "semantic"),
            Self::Resource => write!(f, "resource"),
        }
    }
}

/// A structured compile error.
///
/// Compilation is fail-fast: the first error ends the compile and no
/// partial program is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileError {
    /// Source file name.
    pub file: String,
    /// Error code (e.g., E201).
    pub code: ErrorCode,
    /// Error category (derived from code).
    pub category: ErrorCategory,
    /// Human-readable error message.
    pub message: String,
    /// Source location.
    #[serde(flatten)]
    pub span: Span,
    /// The exact source line for context.
    pub source_line: String,
}

impl CompileError {
    /// Create a new error located at the byte range `start..end` of `source`.
    pub fn new(
        source: &SourceFile,
        code: ErrorCode,
        message: impl Into<String>,
        start: usize,
        end: usize,
    ) -> Self {
        let span = source.span(start, end);
        Self {
            file: source.name.clone(),
            code,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source.line(span.start_line).unwrap_or("").to_string(),
        }
    }

    /// Serialize the error as a JSON object.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"message\":{:?}}}", self.message))
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for CompileError {}

/// Failure of the bump arena.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeapError {
    /// The arena cannot satisfy an allocation; there is no free operation.
    #[error("heap exhausted: {requested} bytes requested, {available} available")]
    Exhausted { requested: usize, available: usize },

    /// A record does not fit the fixed-width length field of its layout.
    #[error("record too large: {len} exceeds {max}")]
    RecordTooLarge { len: usize, max: usize },

    /// An offset does not address a complete record inside the used arena.
    #[error("invalid heap reference {offset:#06x}")]
    InvalidHandle { offset: u16 },
}
