//! Operator-precedence expression compiler.
//!
//! Expressions are compiled straight to postfix bytecode. Operators wait on
//! the pending stack until an incoming operator of lower or equal precedence
//! (or the end of the expression) forces them out:
//!
//! | prec | operators |
//! |------|-----------|
//! | 0xB  | unary `-` `~` `not` |
//! | 0xA  | `*` `/` `%` |
//! | 0x9  | `+` `-` |
//! | 0x8  | `>>>` `>>` `<<` |
//! | 0x7  | `<=` `<` `>` `>=` |
//! | 0x6  | `==` `<>` |
//! | 0x5  | `&` |
//! | 0x4  | `\|` `^` |
//! | 0x3  | `and` |
//! | 0x2  | `or` |
//!
//! Every expression (and therefore every group, call argument and index)
//! opens with a mark on the pending stack. Popping stops at the mark; the
//! mark itself is only consumed once the expression has no operator left.

use tern_lexer::{lookup_keyword, unescape, ArgClass, Number, OpInfo, StrLit, Word, PREC_MARK, PREC_MAX};
use tern_types::{ErrorCode, Opcode, Result};

use crate::parser::{Parser, Pending};

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Compile one expression, leaving its value on the VM stack.
    pub(crate) fn expr(&mut self) -> Result<()> {
        self.push_pending(Pending::MARK)?;
        loop {
            self.unops()?;
            self.terminal()?;

            let incoming = match self.lx.binop() {
                Some(tok) => Pending {
                    op: tok.op,
                    info: tok.info,
                },
                None => Pending {
                    op: Opcode::Fail,
                    info: OpInfo::NONE,
                },
            };
            let prec = incoming.info.prec();

            while let Some(&top) = self.pending.last() {
                if prec > top.info.prec() && prec < PREC_MAX {
                    break;
                }
                self.pending.pop();
                if top.info.prec() == PREC_MARK {
                    break;
                }
                self.emit_op(top.op)?;
            }

            if prec == PREC_MAX {
                return Ok(());
            }
            self.push_pending(incoming)?;
        }
    }

    /// Compile a comma-separated expression list up to `close`, which has
    /// already been opened. Returns the number of expressions.
    pub(crate) fn expr_list(&mut self, close: u8) -> Result<usize> {
        if self.lx.char(close) {
            return Ok(0);
        }
        let mut n = 0;
        loop {
            self.expr()?;
            n += 1;
            if self.lx.char(b',') {
                continue;
            }
            self.expect(close)?;
            return Ok(n);
        }
    }

    fn push_pending(&mut self, p: Pending) -> Result<()> {
        self.pending.push(p).map_err(|m| self.too_complex(m))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Operands
    // ══════════════════════════════════════════════════════════════════════════

    fn unops(&mut self) -> Result<()> {
        while let Some(tok) = self.lx.unop() {
            self.push_pending(Pending {
                op: tok.op,
                info: tok.info,
            })?;
        }
        Ok(())
    }

    fn terminal(&mut self) -> Result<()> {
        if self.lx.char(b'(') {
            self.expr()?;
            return self.expect(b')');
        }
        if self.lx.char(b'[') {
            return self.array_literal();
        }
        if let Some(lit) = self.lx.number()? {
            return match lit.value {
                Number::Int(i) => self.emit_lit(Opcode::LitInt, i as u16),
                Number::Float(f) => self.emit_lit(Opcode::LitFloat, f.to_bits()),
            };
        }
        if let Some(lit) = self.lx.string()? {
            return self.string_literal(lit);
        }

        let Some(word) = self.lx.word() else {
            if self.lx.at_end() {
                return Err(self.err_here(
                    ErrorCode::UNEXPECTED_END,
                    "expected an expression but reached end of input",
                ));
            }
            return Err(self.err_here(ErrorCode::EXPECTED_TERM, "expected an expression"));
        };

        if let Some(kw) = lookup_keyword(word.text) {
            return match kw.class {
                ArgClass::Const => self.emit_op(kw.op),
                ArgClass::Func(arity) => {
                    self.builtin_args(word, arity)?;
                    self.emit_op(kw.op)
                }
                _ => Err(self.err_at(
                    ErrorCode::UNEXPECTED_KEYWORD,
                    format!("unexpected '{}' in expression", word.as_str()),
                    word.start,
                    word.end(),
                )),
            };
        }

        let id = self.intern(word.text)?;
        if self.lx.char(b'(') {
            let n = self.expr_list(b')')?;
            let n = self.arg_count(n, word)?;
            self.emit_op(Opcode::CallFunc)?;
            self.emit_byte(n)?;
            return self.emit_word(id.offset());
        }

        match self.slot_of(id) {
            Some(slot) => {
                self.emit_op(Opcode::SlotGet)?;
                self.emit_byte(slot)?;
            }
            None => self.emit_ident(Opcode::IdentGet, id)?,
        }
        self.index_suffix()
    }

    fn emit_lit(&mut self, op: Opcode, bits: u16) -> Result<()> {
        self.emit_op(op)?;
        self.emit_word(bits)
    }

    fn string_literal(&mut self, lit: StrLit) -> Result<()> {
        match lit {
            StrLit::Empty => self.emit_op(Opcode::LitStrEmpty),
            StrLit::Char(c) => {
                self.emit_op(Opcode::LitStrChar)?;
                self.emit_byte(c)
            }
            StrLit::Multi { start, end, .. } => {
                let text = unescape(&self.lx.source().bytes()[start..end]);
                let s = match self.heap.alloc_str(&text) {
                    Ok(s) => s,
                    Err(e) => return Err(self.heap_error(e)),
                };
                self.emit_lit(Opcode::LitStr, s.offset())
            }
        }
    }

    /// `[e1, ..., eN]`, with the `[` already consumed.
    fn array_literal(&mut self) -> Result<()> {
        let start = self.lx.pos() - 1;
        let n = self.expr_list(b']')?;
        let Ok(n) = u8::try_from(n) else {
            return Err(self.err_at(
                ErrorCode::TOO_COMPLEX,
                format!("array literal has {n} elements, at most 255 allowed"),
                start,
                self.lx.pos(),
            ));
        };
        self.emit_op(Opcode::Array)?;
        self.emit_byte(n)
    }

    /// Any number of `[i]` and `[i:j]` suffixes.
    fn index_suffix(&mut self) -> Result<()> {
        while self.lx.char(b'[') {
            self.expr()?;
            if self.lx.char(b':') {
                self.expr()?;
                self.expect(b']')?;
                self.emit_op(Opcode::Slice)?;
            } else {
                self.expect(b']')?;
                self.emit_op(Opcode::Index)?;
            }
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Arguments
    // ══════════════════════════════════════════════════════════════════════════

    /// Parenthesized arguments of a fixed-arity built-in.
    fn builtin_args(&mut self, word: Word<'_>, arity: u8) -> Result<()> {
        self.expect(b'(')?;
        let n = self.expr_list(b')')?;
        let name = word.as_str();
        let problem = match n.cmp(&(arity as usize)) {
            std::cmp::Ordering::Less => "too few",
            std::cmp::Ordering::Greater => "too many",
            std::cmp::Ordering::Equal => return Ok(()),
        };
        Err(self.err_at(
            ErrorCode::ARGUMENT_COUNT,
            format!("{problem} arguments to '{name}': expected {arity}, got {n}"),
            word.start,
            word.end(),
        ))
    }

    /// Check a call's argument count fits the one-byte operand.
    pub(crate) fn arg_count(&self, n: usize, word: Word<'_>) -> Result<u8> {
        u8::try_from(n).map_err(|_| {
            self.err_at(
                ErrorCode::ARGUMENT_COUNT,
                format!("too many arguments to '{}': {n}", word.as_str()),
                word.start,
                word.end(),
            )
        })
    }
}
