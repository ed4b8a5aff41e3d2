//! Token shapes and the keyword/operator tables.
//!
//! Keywords are looked up in eight buckets selected by the low three bits of
//! the first character. Each bucket is sorted in ASCII order so a scan can
//! stop at the first row that sorts after the word.
//!
//! Operator rows carry an info byte: the high nibble is the arity (`1` for
//! unary, `2` for binary) and the low nibble the precedence.

use tern_types::{F16, Opcode};

// ─────────────────────────────────────────────────────────────────────
// Precedence
// ─────────────────────────────────────────────────────────────────────

/// Precedence of the group sentinel pushed for `(`, call and index
/// arguments. Lower than every real operator.
pub const PREC_MARK: u8 = 0x1;

/// Precedence meaning "no operator follows".
pub const PREC_MAX: u8 = 0xf;

/// Arity nibble + precedence nibble of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInfo(pub u8);

impl OpInfo {
    pub const MARK: OpInfo = OpInfo(0x20 | PREC_MARK);
    pub const NONE: OpInfo = OpInfo(PREC_MAX);

    pub fn prec(self) -> u8 {
        self.0 & 0x0f
    }
}

/// A recognized operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpToken {
    pub op: Opcode,
    pub info: OpInfo,
    pub start: usize,
    pub end: usize,
}

// ─────────────────────────────────────────────────────────────────────
// Literal and word tokens
// ─────────────────────────────────────────────────────────────────────

/// Value of a numeric literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Number {
    Int(i16),
    Float(F16),
}

/// A numeric literal with its source range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberLit {
    pub value: Number,
    pub start: usize,
    pub end: usize,
}

/// A string literal, classified by its unescaped length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrLit {
    Empty,
    Char(u8),
    /// Two or more characters. `start..end` is the raw (still escaped) text
    /// between the quotes; it is unescaped only when the literal is emitted.
    Multi { start: usize, end: usize, len: usize },
}

/// An identifier-shaped word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word<'src> {
    pub text: &'src [u8],
    pub start: usize,
}

impl Word<'_> {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.text).unwrap_or("?")
    }
}

// ─────────────────────────────────────────────────────────────────────
// Keywords
// ─────────────────────────────────────────────────────────────────────

/// How a keyword is used by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgClass {
    /// Built-in function taking exactly this many parenthesized arguments.
    Func(u8),
    /// Constant emitted as its own opcode (`true`, `false`).
    Const,
    /// Command with no arguments (`stop`).
    Cmd0,
    /// Command with a comma-separated expression list (`print`).
    CmdAny,
    /// Command with a comma-separated identifier list (`input`).
    Input,
    /// Control statement.
    Control,
}

/// A recognized keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyword {
    pub op: Opcode,
    pub class: ArgClass,
}

/// One keyword table row.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRow {
    pub spelling: &'static str,
    pub op: Opcode,
    pub class: ArgClass,
}

const fn kw(spelling: &'static str, op: Opcode, class: ArgClass) -> KeywordRow {
    KeywordRow { spelling, op, class }
}

use ArgClass::{Cmd0, CmdAny, Const, Control, Func, Input};

/// Keyword buckets, indexed by `first_char & 7`.
pub const KEYWORDS: [&[KeywordRow]; 8] = [
    // h p x
    &[
        kw("print", Opcode::Print, CmdAny),
        kw("proc", Opcode::Proc, Control),
    ],
    // a i q y
    &[
        kw("abs", Opcode::Abs, Func(1)),
        kw("asc", Opcode::Asc, Func(1)),
        kw("if", Opcode::If, Control),
        kw("input", Opcode::Input, Input),
        kw("int", Opcode::Int, Func(1)),
    ],
    // b j r z
    &[
        kw("break", Opcode::Break, Control),
        kw("repeat", Opcode::Repeat, Control),
        kw("return", Opcode::Return, Control),
        kw("right", Opcode::Right, Func(2)),
        kw("rnd", Opcode::Rnd, Func(0)),
    ],
    // c k s
    &[
        kw("chr", Opcode::Chr, Func(1)),
        kw("sgn", Opcode::Sgn, Func(1)),
        kw("sqrt", Opcode::Sqrt, Func(1)),
        kw("stop", Opcode::Stop, Cmd0),
        kw("str", Opcode::Str, Func(1)),
        kw("substr", Opcode::Substr, Func(3)),
    ],
    // d l t
    &[
        kw("left", Opcode::Left, Func(2)),
        kw("len", Opcode::Len, Func(1)),
        kw("true", Opcode::True, Const),
    ],
    // e m u
    &[
        kw("else", Opcode::Else, Control),
        kw("end", Opcode::End, Control),
        kw("endif", Opcode::Endif, Control),
        kw("until", Opcode::Until, Control),
    ],
    // f n v
    &[
        kw("false", Opcode::False, Const),
        kw("float", Opcode::Float, Func(1)),
        kw("func", Opcode::Func, Control),
    ],
    // g o w
    &[
        kw("wend", Opcode::Wend, Control),
        kw("while", Opcode::While, Control),
    ],
];

/// Look up a word in the keyword tables. Keywords are case-sensitive.
pub fn lookup_keyword(word: &[u8]) -> Option<Keyword> {
    let first = *word.first()?;
    for row in KEYWORDS[(first & 7) as usize] {
        match row.spelling.as_bytes().cmp(word) {
            std::cmp::Ordering::Equal => {
                return Some(Keyword {
                    op: row.op,
                    class: row.class,
                })
            }
            // Rows are sorted: nothing later can match.
            std::cmp::Ordering::Greater => return None,
            std::cmp::Ordering::Less => {}
        }
    }
    None
}

/// Every keyword spelling, in bucket order.
pub fn all_keywords() -> impl Iterator<Item = &'static str> {
    KEYWORDS.iter().flat_map(|b| b.iter().map(|r| r.spelling))
}

// ─────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────

/// One operator table row.
#[derive(Debug, Clone, Copy)]
pub struct OperatorRow {
    pub spelling: &'static str,
    pub op: Opcode,
    pub info: OpInfo,
}

const fn op(spelling: &'static str, op: Opcode, info: u8) -> OperatorRow {
    OperatorRow {
        spelling,
        op,
        info: OpInfo(info),
    }
}

/// Prefix operators.
pub const UNOPS: &[OperatorRow] = &[
    op("-", Opcode::Neg, 0x1b),
    op("~", Opcode::Bnot, 0x1b),
    op("not", Opcode::Lnot, 0x1b),
];

/// Infix operators. Where spellings share a prefix the longest comes first.
pub const BINOPS: &[OperatorRow] = &[
    op("*", Opcode::Mul, 0x2a),
    op("/", Opcode::Div, 0x2a),
    op("%", Opcode::Mod, 0x2a),
    op("+", Opcode::Add, 0x29),
    op("-", Opcode::Sub, 0x29),
    op(">>>", Opcode::Asr, 0x28),
    op(">>", Opcode::Lsr, 0x28),
    op(">=", Opcode::Ge, 0x27),
    op(">", Opcode::Gt, 0x27),
    op("<<", Opcode::Lsl, 0x28),
    op("<=", Opcode::Le, 0x27),
    op("<>", Opcode::Ne, 0x26),
    op("<", Opcode::Lt, 0x27),
    op("==", Opcode::Eq, 0x26),
    op("&", Opcode::Band, 0x25),
    op("|", Opcode::Bor, 0x24),
    op("^", Opcode::Beor, 0x24),
    op("and", Opcode::Land, 0x23),
    op("or", Opcode::Lor, 0x22),
];
