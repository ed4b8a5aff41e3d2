//! Compile errors: every error code the compiler reports, where it points,
//! and the fixed-capacity limits.

use tern_types::{CompileError, ErrorCategory, ErrorCode, Limits, SourceFile};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn compile_err_with(source: &str, limits: &Limits) -> CompileError {
    let sf = SourceFile::new("test.tn", source);
    match tern_parser::compile(&sf, limits) {
        Ok(p) => panic!("expected an error, got:\n{}", p.disassemble()),
        Err(e) => e,
    }
}

fn compile_err(source: &str) -> CompileError {
    compile_err_with(source, &Limits::default())
}

fn code_of(source: &str) -> ErrorCode {
    compile_err(source).code
}

// ─────────────────────────────────────────────────────────────────────
// Lexical
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_lexical_errors_surface() {
    assert_eq!(code_of("x = 1e;"), ErrorCode::MALFORMED_NUMBER);
    assert_eq!(code_of("x = 40000;"), ErrorCode::INTEGER_OUT_OF_RANGE);
    assert_eq!(code_of("x = \"abc"), ErrorCode::UNTERMINATED_STRING);
    assert_eq!(code_of(r#"x = "a\qb";"#), ErrorCode::INVALID_ESCAPE);
}

// ─────────────────────────────────────────────────────────────────────
// Syntax
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_missing_semicolon_at_end() {
    let err = compile_err("x = 1");
    assert_eq!(err.code, ErrorCode::UNEXPECTED_END);
    assert_eq!(err.category, ErrorCategory::Syntax);
}

#[test]
fn test_trailing_input() {
    assert_eq!(code_of("x = 1 2;"), ErrorCode::TRAILING_INPUT);
}

#[test]
fn test_bad_statement() {
    assert_eq!(code_of(";"), ErrorCode::BAD_STATEMENT);
    assert_eq!(code_of("42;"), ErrorCode::BAD_STATEMENT);
}

#[test]
fn test_missing_term() {
    assert_eq!(code_of("x = ;"), ErrorCode::EXPECTED_TERM);
    assert_eq!(code_of("x = 1 +"), ErrorCode::UNEXPECTED_END);
}

#[test]
fn test_expected_closer_position() {
    let err = compile_err("x = (1;");
    assert_eq!(err.code, ErrorCode::EXPECTED_TOKEN);
    assert_eq!(err.message, "expected ')'");
    assert_eq!((err.span.start_line, err.span.start_col), (1, 7));
    assert_eq!(code_of("x = a[1;"), ErrorCode::EXPECTED_TOKEN);
}

#[test]
fn test_keywords_in_wrong_position() {
    assert_eq!(code_of("x = print;"), ErrorCode::UNEXPECTED_KEYWORD);
    assert_eq!(code_of("x = while;"), ErrorCode::UNEXPECTED_KEYWORD);
    assert_eq!(code_of("abs(1);"), ErrorCode::UNEXPECTED_KEYWORD);
    assert_eq!(code_of("input print;"), ErrorCode::RESERVED_WORD);
    assert_eq!(code_of("func if(); end;"), ErrorCode::RESERVED_WORD);
}

// ─────────────────────────────────────────────────────────────────────
// Semantic
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_builtin_arity() {
    let err = compile_err("x = left(\"ab\");");
    assert_eq!(err.code, ErrorCode::ARGUMENT_COUNT);
    assert_eq!(err.message, "too few arguments to 'left': expected 2, got 1");
    let err = compile_err("x = abs(1, 2);");
    assert_eq!(err.message, "too many arguments to 'abs': expected 1, got 2");
    assert_eq!(code_of("x = len();"), ErrorCode::ARGUMENT_COUNT);
}

#[test]
fn test_unmatched_closers() {
    let err = compile_err("wend;");
    assert_eq!(err.code, ErrorCode::UNMATCHED_CONTROL);
    assert_eq!(err.message, "'wend' without 'while'");

    let err = compile_err("while 1; endif;");
    assert_eq!(err.message, "'endif' does not match open 'while'");

    assert_eq!(code_of("if 1; else; else; endif;"), ErrorCode::UNMATCHED_CONTROL);
    assert_eq!(code_of("until 1;"), ErrorCode::UNMATCHED_CONTROL);
    assert_eq!(code_of("end;"), ErrorCode::UNMATCHED_CONTROL);
    assert_eq!(code_of("func f(); if 1; end;"), ErrorCode::UNMATCHED_CONTROL);
}

#[test]
fn test_unterminated_control_points_at_opener() {
    let err = compile_err("x = 1;\nif x; print 1;");
    assert_eq!(err.code, ErrorCode::UNTERMINATED_CONTROL);
    assert_eq!(err.message, "unterminated 'if'");
    assert_eq!((err.span.start_line, err.span.start_col), (2, 1));
    assert_eq!(code_of("func f(); return 1;"), ErrorCode::UNTERMINATED_CONTROL);
}

#[test]
fn test_redefinition() {
    assert_eq!(
        code_of("func f(); return 1; end; proc f(); end;"),
        ErrorCode::REDEFINITION
    );
    assert_eq!(code_of("func f(); return 1; end; f = 2;"), ErrorCode::REDEFINITION);
    assert_eq!(code_of("func f(f); return 1; end;"), ErrorCode::REDEFINITION);
    assert_eq!(
        code_of("proc p(); end; proc q(); p = 1; end;"),
        ErrorCode::REDEFINITION
    );
}

#[test]
fn test_duplicate_parameter() {
    let err = compile_err("func f(a, a); return a; end;");
    assert_eq!(err.code, ErrorCode::DUPLICATE_PARAMETER);
    assert_eq!(err.message, "duplicate parameter 'a'");
}

#[test]
fn test_definitions_only_at_top_level() {
    assert_eq!(
        code_of("while 1; func f(); end; wend;"),
        ErrorCode::MISPLACED_DEFINITION
    );
    assert_eq!(
        code_of("proc p(); proc q(); end; end;"),
        ErrorCode::MISPLACED_DEFINITION
    );
}

#[test]
fn test_return_rules() {
    assert_eq!(code_of("return 1;"), ErrorCode::MISPLACED_RETURN);
    assert_eq!(code_of("proc p(); return 1; end;"), ErrorCode::MISPLACED_RETURN);
    assert_eq!(code_of("func f(); return; end;"), ErrorCode::MISPLACED_RETURN);
}

#[test]
fn test_break_outside_loop() {
    assert_eq!(code_of("break;"), ErrorCode::BREAK_OUTSIDE_LOOP);
    assert_eq!(code_of("if 1; break; endif;"), ErrorCode::BREAK_OUTSIDE_LOOP);
}

// ─────────────────────────────────────────────────────────────────────
// Resource limits
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_control_depth_limit() {
    let limits = Limits {
        control_depth: 2,
        ..Limits::default()
    };
    let err = compile_err_with("if 1; if 1; if 1; endif; endif; endif;", &limits);
    assert_eq!(err.code, ErrorCode::TOO_COMPLEX);
    assert_eq!(err.message, "too many nested control statements");
}

#[test]
fn test_pending_operator_limit() {
    let limits = Limits {
        pending_ops: 4,
        ..Limits::default()
    };
    let err = compile_err_with("x = ((((1))));", &limits);
    assert_eq!(err.code, ErrorCode::TOO_COMPLEX);
    assert_eq!(err.message, "expression is too complex");
}

#[test]
fn test_loop_depth_limit() {
    let limits = Limits {
        loop_depth: 1,
        ..Limits::default()
    };
    let err = compile_err_with("repeat; repeat; until 1; until 1;", &limits);
    assert_eq!(err.code, ErrorCode::TOO_COMPLEX);
    assert_eq!(err.message, "too many nested loops");
}

#[test]
fn test_loop_exit_limit() {
    let limits = Limits {
        loop_exits: 2,
        ..Limits::default()
    };
    let err = compile_err_with("while 1; break; break; wend;", &limits);
    assert_eq!(err.code, ErrorCode::TOO_COMPLEX);
    assert_eq!(err.message, "control flow is too complicated");
}

#[test]
fn test_too_many_locals() {
    let limits = Limits {
        max_slots: 2,
        ..Limits::default()
    };
    let err = compile_err_with("proc p(a, b, c); end;", &limits);
    assert_eq!(err.code, ErrorCode::TOO_MANY_LOCALS);
    let err = compile_err_with("proc p(a, b); c = 1; end;", &limits);
    assert_eq!(err.code, ErrorCode::TOO_MANY_LOCALS);
}

#[test]
fn test_heap_exhausted() {
    let limits = Limits {
        heap_size: 16,
        ..Limits::default()
    };
    let err = compile_err_with("abcdefg = 1;", &limits);
    assert_eq!(err.code, ErrorCode::HEAP_EXHAUSTED);
    assert_eq!(err.category, ErrorCategory::Resource);
}

#[test]
fn test_code_overflow() {
    let limits = Limits {
        code_size: 4,
        ..Limits::default()
    };
    assert_eq!(compile_err_with("x = 1;", &limits).code, ErrorCode::CODE_OVERFLOW);
}

#[test]
fn test_unaddressable_limits_rejected() {
    let limits = Limits {
        heap_size: 70_000,
        code_size: 60_000,
        ..Limits::default()
    };
    let err = compile_err_with("x = 1;", &limits);
    assert_eq!(err.code, ErrorCode::INVALID_LIMITS);
    assert!(err.message.contains("heap_size"), "{}", err.message);
}

#[test]
fn test_largest_heap_fills_without_wrapping() {
    let limits = Limits {
        heap_size: u16::MAX as usize,
        code_size: 60_000,
        ..Limits::default()
    };
    let literal = "x".repeat(200);
    let source: String = (0..340).map(|i| format!("v{i} = \"{literal}\";\n")).collect();
    let err = compile_err_with(&source, &limits);
    assert_eq!(err.code, ErrorCode::HEAP_EXHAUSTED);
    assert!(err.span.start_line > 250, "{}", err.span);
}

// ─────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_errors_are_deterministic() {
    let first = compile_err("while 1; if 2; wend;");
    for _ in 0..100 {
        assert_eq!(compile_err("while 1; if 2; wend;"), first);
    }
}
