//! Lexer tests: number and string literals, words, operator matching,
//! keyword lookup, error reporting and cursor behavior.

use tern_lexer::{lookup_keyword, ArgClass, Lexer, Number, StrLit};
use tern_types::{ErrorCode, Opcode, SourceFile, F16};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn src(text: &str) -> SourceFile {
    SourceFile::new("test.tn", text)
}

/// Lex one number from the start of `text`.
fn number(text: &str) -> Option<Number> {
    let sf = src(text);
    let mut lx = Lexer::new(&sf);
    lx.number().unwrap().map(|n| n.value)
}

fn number_error(text: &str) -> ErrorCode {
    let sf = src(text);
    let mut lx = Lexer::new(&sf);
    lx.number().unwrap_err().code
}

fn string(text: &str) -> Option<StrLit> {
    let sf = src(text);
    let mut lx = Lexer::new(&sf);
    lx.string().unwrap()
}

fn string_error(text: &str) -> ErrorCode {
    let sf = src(text);
    let mut lx = Lexer::new(&sf);
    lx.string().unwrap_err().code
}

/// Lex every binary operator in a whitespace-separated list.
fn binops(text: &str) -> Vec<Opcode> {
    let sf = src(text);
    let mut lx = Lexer::new(&sf);
    let mut out = Vec::new();
    while let Some(op) = lx.binop() {
        out.push(op.op);
    }
    assert!(lx.at_end(), "unconsumed input in {text:?}");
    out
}

// ─────────────────────────────────────────────────────────────────────
// Numbers
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_integer_literals() {
    assert_eq!(number("0"), Some(Number::Int(0)));
    assert_eq!(number("42;"), Some(Number::Int(42)));
    assert_eq!(number("-17"), Some(Number::Int(-17)));
    assert_eq!(number("+5"), Some(Number::Int(5)));
    assert_eq!(number("32767"), Some(Number::Int(32767)));
    assert_eq!(number("-32768"), Some(Number::Int(-32768)));
}

#[test]
fn test_integer_out_of_range() {
    assert_eq!(number_error("32768"), ErrorCode::INTEGER_OUT_OF_RANGE);
    assert_eq!(number_error("-32769"), ErrorCode::INTEGER_OUT_OF_RANGE);
    assert_eq!(number_error("99999999999999"), ErrorCode::INTEGER_OUT_OF_RANGE);
}

#[test]
fn test_float_literals() {
    assert_eq!(number("2.5"), Some(Number::Float(F16::from_f32(2.5))));
    assert_eq!(number(".5"), Some(Number::Float(F16::from_f32(0.5))));
    assert_eq!(number("3."), Some(Number::Float(F16::from_f32(3.0))));
    assert_eq!(number("1e3"), Some(Number::Float(F16::from_f32(1000.0))));
    assert_eq!(number("-2.5e-1"), Some(Number::Float(F16::from_f32(-0.25))));
    assert_eq!(number("1e+2"), Some(Number::Float(F16::from_f32(100.0))));
}

#[test]
fn test_exponent_without_digits_is_fatal() {
    assert_eq!(number_error("1e"), ErrorCode::MALFORMED_NUMBER);
    assert_eq!(number_error("1e+"), ErrorCode::MALFORMED_NUMBER);
    assert_eq!(number_error("2.5e;"), ErrorCode::MALFORMED_NUMBER);
}

#[test]
fn test_not_a_number_leaves_cursor() {
    let sf = src("  .x");
    let mut lx = Lexer::new(&sf);
    assert_eq!(lx.number().unwrap(), None);
    assert_eq!(lx.pos(), 2);
    assert_eq!(number("-"), None);
    assert_eq!(number("abc"), None);
}

#[test]
fn test_second_decimal_point_ends_number() {
    let sf = src("1.5.3");
    let mut lx = Lexer::new(&sf);
    let n = lx.number().unwrap().unwrap();
    assert_eq!(n.value, Number::Float(F16::from_f32(1.5)));
    assert_eq!((n.start, n.end), (0, 3));
}

// ─────────────────────────────────────────────────────────────────────
// Strings
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_string_kinds() {
    assert_eq!(string(r#""""#), Some(StrLit::Empty));
    assert_eq!(string(r#""x""#), Some(StrLit::Char(b'x')));
    assert_eq!(string(r#""\n""#), Some(StrLit::Char(b'\n')));
    assert_eq!(
        string(r#""hello""#),
        Some(StrLit::Multi {
            start: 1,
            end: 6,
            len: 5
        })
    );
}

#[test]
fn test_escaped_length_counts_characters() {
    assert_eq!(
        string(r#""a\"b""#),
        Some(StrLit::Multi {
            start: 1,
            end: 5,
            len: 3
        })
    );
    assert_eq!(string(r#""\\""#), Some(StrLit::Char(b'\\')));
}

#[test]
fn test_string_errors() {
    assert_eq!(string_error(r#""abc"#), ErrorCode::UNTERMINATED_STRING);
    assert_eq!(string_error(r#""abc\"#), ErrorCode::UNTERMINATED_STRING);
    assert_eq!(string_error(r#""a\qb""#), ErrorCode::INVALID_ESCAPE);
}

#[test]
fn test_string_error_position() {
    let sf = src("x = \"oops");
    let mut lx = Lexer::new(&sf);
    lx.word();
    assert!(lx.char(b'='));
    let err = lx.string().unwrap_err();
    assert_eq!((err.span.start_line, err.span.start_col), (1, 5));
}

// ─────────────────────────────────────────────────────────────────────
// Words and keywords
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_words() {
    let sf = src("  _tmp1 x2y;");
    let mut lx = Lexer::new(&sf);
    let w = lx.word().unwrap();
    assert_eq!(w.text, b"_tmp1");
    assert_eq!(w.start, 2);
    assert_eq!(lx.word().unwrap().text, b"x2y");
    assert_eq!(lx.word(), None);
    assert!(lx.char(b';'));
    assert!(lx.at_end());
}

#[test]
fn test_digit_cannot_start_word() {
    let sf = src("9lives");
    let mut lx = Lexer::new(&sf);
    assert_eq!(lx.word(), None);
}

#[test]
fn test_keyword_classes() {
    let class = |w: &str| lookup_keyword(w.as_bytes()).map(|k| k.class);
    assert_eq!(class("print"), Some(ArgClass::CmdAny));
    assert_eq!(class("stop"), Some(ArgClass::Cmd0));
    assert_eq!(class("input"), Some(ArgClass::Input));
    assert_eq!(class("true"), Some(ArgClass::Const));
    assert_eq!(class("left"), Some(ArgClass::Func(2)));
    assert_eq!(class("rnd"), Some(ArgClass::Func(0)));
    assert_eq!(class("while"), Some(ArgClass::Control));
    assert_eq!(class("whilst"), None);
    assert_eq!(class("WHILE"), None);
}

#[test]
fn test_every_keyword_is_found() {
    for kw in tern_lexer::token::all_keywords() {
        let found = lookup_keyword(kw.as_bytes()).unwrap();
        assert_eq!(found.op.name(), kw);
    }
}

// ─────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_binary_operators() {
    assert_eq!(
        binops("* / % + - == <> & | ^"),
        vec![
            Opcode::Mul,
            Opcode::Div,
            Opcode::Mod,
            Opcode::Add,
            Opcode::Sub,
            Opcode::Eq,
            Opcode::Ne,
            Opcode::Band,
            Opcode::Bor,
            Opcode::Beor
        ]
    );
}

#[test]
fn test_longest_spelling_wins() {
    assert_eq!(
        binops(">>> >> >= > << <= <>  <"),
        vec![
            Opcode::Asr,
            Opcode::Lsr,
            Opcode::Ge,
            Opcode::Gt,
            Opcode::Lsl,
            Opcode::Le,
            Opcode::Ne,
            Opcode::Lt
        ]
    );
}

#[test]
fn test_alphabetic_operators_any_case() {
    assert_eq!(binops("and AND Or"), vec![Opcode::Land, Opcode::Land, Opcode::Lor]);
    let sf = src("NOT x");
    let mut lx = Lexer::new(&sf);
    assert_eq!(lx.unop().map(|o| o.op), Some(Opcode::Lnot));
}

#[test]
fn test_alphabetic_operators_need_word_boundary() {
    let sf = src("android");
    let mut lx = Lexer::new(&sf);
    assert_eq!(lx.binop(), None);
    assert_eq!(lx.pos(), 0);

    let sf = src("nothing");
    let mut lx = Lexer::new(&sf);
    assert_eq!(lx.unop(), None);
    assert_eq!(lx.word().unwrap().text, b"nothing");
}

#[test]
fn test_single_equals_is_not_an_operator() {
    let sf = src("= 1");
    let mut lx = Lexer::new(&sf);
    assert_eq!(lx.binop(), None);
    assert!(lx.char(b'='));
}

#[test]
fn test_unary_minus_yields_to_numbers() {
    let sf = src("-5");
    let mut lx = Lexer::new(&sf);
    assert_eq!(lx.unop(), None);
    assert_eq!(lx.number().unwrap().unwrap().value, Number::Int(-5));

    let sf = src("-.5");
    let mut lx = Lexer::new(&sf);
    assert_eq!(lx.unop(), None);

    let sf = src("-x");
    let mut lx = Lexer::new(&sf);
    assert_eq!(lx.unop().map(|o| o.op), Some(Opcode::Neg));
    assert_eq!(lx.word().unwrap().text, b"x");
}

#[test]
fn test_operator_precedence_nibbles() {
    let sf = src("* + >> < == & | and or");
    let mut lx = Lexer::new(&sf);
    let mut precs = Vec::new();
    while let Some(op) = lx.binop() {
        precs.push(op.info.prec());
    }
    assert_eq!(precs, vec![0xa, 9, 8, 7, 6, 5, 4, 3, 2]);
}

// ─────────────────────────────────────────────────────────────────────
// Layout
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_line_breaks_are_whitespace() {
    let sf = src("x\r\n\t = \n 1 ;\n");
    let mut lx = Lexer::new(&sf);
    assert!(lx.word().is_some());
    assert!(lx.char(b'='));
    assert!(lx.number().unwrap().is_some());
    assert!(lx.peek_stmt_end());
    assert!(lx.char(b';'));
    assert!(lx.peek_stmt_end());
    assert!(lx.at_end());
}

#[test]
fn test_lexing_is_deterministic() {
    let text = "a = 1.5e2 >>> b and \"q\\tz\";";
    let first: Vec<usize> = {
        let sf = src(text);
        let mut lx = Lexer::new(&sf);
        lx.word();
        lx.char(b'=');
        lx.number().unwrap();
        lx.binop();
        lx.word();
        lx.binop();
        lx.string().unwrap();
        vec![lx.pos()]
    };
    for _ in 0..100 {
        let sf = src(text);
        let mut lx = Lexer::new(&sf);
        lx.word();
        lx.char(b'=');
        lx.number().unwrap();
        lx.binop();
        lx.word();
        lx.binop();
        lx.string().unwrap();
        assert_eq!(vec![lx.pos()], first);
    }
}
