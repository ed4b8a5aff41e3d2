//! Cursor-based Tern lexer.
//!
//! The compiler drives the lexer directly: each recognizer either consumes
//! input and returns what it found, or leaves the cursor where it was and
//! returns `None`. There is no token buffer. Malformed numbers and strings
//! are fatal and come back as `Err`.
//!
//! Spaces, tabs and line breaks separate tokens; statements end at `;`.

use tern_types::{CompileError, ErrorCode, SourceFile, F16};

use crate::token::{Number, NumberLit, OpToken, OperatorRow, StrLit, Word, BINOPS, UNOPS};

/// Cursor over one source file.
pub struct Lexer<'src> {
    source: &'src SourceFile,
    bytes: &'src [u8],
    pos: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src SourceFile) -> Self {
        Self {
            source,
            bytes: source.bytes(),
            pos: 0,
        }
    }

    pub fn source(&self) -> &'src SourceFile {
        self.source
    }

    /// Current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Build an error located at `start..end`.
    pub fn error_at(
        &self,
        code: ErrorCode,
        message: impl Into<String>,
        start: usize,
        end: usize,
    ) -> CompileError {
        CompileError::new(self.source, code, message, start, end)
    }

    /// Build an error located at the next unconsumed token.
    pub fn error_here(&mut self, code: ErrorCode, message: impl Into<String>) -> CompileError {
        self.skip_space();
        let end = (self.pos + 1).min(self.bytes.len());
        CompileError::new(self.source, code, message, self.pos, end)
    }

    // ── Character helpers ────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    /// Advance past spaces, tabs and line breaks.
    pub fn skip_space(&mut self) {
        while let Some(b' ' | b'\t' | b'\r' | b'\n') = self.peek() {
            self.pos += 1;
        }
    }

    // ── Recognizers ──────────────────────────────────────────────────────────

    /// Consume `ch` if it is the next character.
    pub fn char(&mut self, ch: u8) -> bool {
        self.skip_space();
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Whether the input is exhausted.
    pub fn at_end(&mut self) -> bool {
        self.skip_space();
        self.pos >= self.bytes.len()
    }

    /// Whether the next character ends a statement (`;` or end of input),
    /// without consuming it.
    pub fn peek_stmt_end(&mut self) -> bool {
        self.skip_space();
        matches!(self.peek(), None | Some(b';'))
    }

    /// Recognize a numeric literal: optional sign, digits with at most one
    /// decimal point, optional exponent. Integers must fit in `i16`.
    pub fn number(&mut self) -> Result<Option<NumberLit>, CompileError> {
        self.skip_space();
        let start = self.pos;
        let mut p = start;
        let at = |i: usize| self.bytes.get(i).copied().unwrap_or(0);

        if matches!(at(p), b'+' | b'-') {
            p += 1;
        }
        let mut digits = false;
        let mut point = false;
        loop {
            match at(p) {
                b'0'..=b'9' => digits = true,
                b'.' if !point => point = true,
                _ => break,
            }
            p += 1;
        }
        if !digits {
            return Ok(None);
        }

        let mut exponent = false;
        if at(p) == b'e' {
            p += 1;
            if matches!(at(p), b'+' | b'-') {
                p += 1;
            }
            while at(p).is_ascii_digit() {
                exponent = true;
                p += 1;
            }
            if !exponent {
                return Err(self.error_at(
                    ErrorCode::MALFORMED_NUMBER,
                    "malformed number: exponent has no digits",
                    start,
                    p,
                ));
            }
        }

        let text = std::str::from_utf8(&self.bytes[start..p]).unwrap_or("");
        let value = if point || exponent {
            let f: f32 = text.parse().map_err(|_| {
                self.error_at(ErrorCode::MALFORMED_NUMBER, "malformed number", start, p)
            })?;
            Number::Float(F16::from_f32(f))
        } else {
            let n: i32 = text.parse().unwrap_or(i32::MAX);
            let i = i16::try_from(n).map_err(|_| {
                self.error_at(
                    ErrorCode::INTEGER_OUT_OF_RANGE,
                    format!("integer literal {text} is out of range"),
                    start,
                    p,
                )
            })?;
            Number::Int(i)
        };

        self.pos = p;
        Ok(Some(NumberLit {
            value,
            start,
            end: p,
        }))
    }

    /// Recognize a double-quoted string literal with `\t \n \" \\` escapes.
    pub fn string(&mut self) -> Result<Option<StrLit>, CompileError> {
        self.skip_space();
        if self.peek() != Some(b'"') {
            return Ok(None);
        }
        let quote = self.pos;
        let start = quote + 1;
        let mut p = start;
        let mut len = 0usize;
        let mut last = 0u8;
        loop {
            let Some(&ch) = self.bytes.get(p) else {
                return Err(self.error_at(
                    ErrorCode::UNTERMINATED_STRING,
                    "missing closing '\"'",
                    quote,
                    p,
                ));
            };
            match ch {
                b'"' => break,
                b'\\' => {
                    last = match self.bytes.get(p + 1) {
                        Some(&e) => unescape_byte(e).ok_or_else(|| {
                            self.error_at(
                                ErrorCode::INVALID_ESCAPE,
                                format!("invalid string escape '\\{}'", e as char),
                                p,
                                p + 2,
                            )
                        })?,
                        None => {
                            return Err(self.error_at(
                                ErrorCode::UNTERMINATED_STRING,
                                "missing closing '\"'",
                                quote,
                                p + 1,
                            ))
                        }
                    };
                    p += 2;
                }
                _ => {
                    last = ch;
                    p += 1;
                }
            }
            len += 1;
        }
        self.pos = p + 1;

        Ok(Some(match len {
            0 => StrLit::Empty,
            1 => StrLit::Char(last),
            _ => StrLit::Multi { start, end: p, len },
        }))
    }

    /// Recognize `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn word(&mut self) -> Option<Word<'src>> {
        self.skip_space();
        let start = self.pos;
        if !matches!(self.peek(), Some(b'A'..=b'Z' | b'a'..=b'z' | b'_')) {
            return None;
        }
        let mut p = start + 1;
        while self.bytes.get(p).is_some_and(|&b| is_word_byte(b)) {
            p += 1;
        }
        self.pos = p;
        Some(Word {
            text: &self.bytes[start..p],
            start,
        })
    }

    /// Recognize a prefix operator. A `+` or `-` directly followed by a
    /// digit or `.` is left for [`Lexer::number`].
    pub fn unop(&mut self) -> Option<OpToken> {
        self.skip_space();
        if matches!(self.peek(), Some(b'+' | b'-'))
            && matches!(self.peek_at(1), Some(b'0'..=b'9' | b'.'))
        {
            return None;
        }
        self.operator(UNOPS)
    }

    /// Recognize an infix operator.
    pub fn binop(&mut self) -> Option<OpToken> {
        self.skip_space();
        self.operator(BINOPS)
    }

    /// Table-driven operator match. Symbolic spellings are case-sensitive;
    /// alphabetic ones match any case and must end at a word boundary.
    fn operator(&mut self, table: &[OperatorRow]) -> Option<OpToken> {
        let rest = &self.bytes[self.pos..];
        for row in table {
            let spelling = row.spelling.as_bytes();
            let Some(candidate) = rest.get(..spelling.len()) else {
                continue;
            };
            let alpha = spelling[0].is_ascii_alphabetic();
            let matched = if alpha {
                candidate.eq_ignore_ascii_case(spelling)
                    && !rest.get(spelling.len()).is_some_and(|&b| is_word_byte(b))
            } else {
                candidate == spelling
            };
            if matched {
                let start = self.pos;
                self.pos += spelling.len();
                return Some(OpToken {
                    op: row.op,
                    info: row.info,
                    start,
                    end: self.pos,
                });
            }
        }
        None
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn unescape_byte(e: u8) -> Option<u8> {
    match e {
        b't' => Some(b'\t'),
        b'n' => Some(b'\n'),
        b'"' => Some(b'"'),
        b'\\' => Some(b'\\'),
        _ => None,
    }
}

/// Unescape the raw text of an already-validated string literal.
pub fn unescape(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\\' {
            if let Some(b) = raw.get(i + 1).and_then(|&e| unescape_byte(e)) {
                out.push(b);
                i += 2;
                continue;
            }
        }
        out.push(raw[i]);
        i += 1;
    }
    out
}
