//! Statement and control-flow compilation.
//!
//! Control constructs are compiled with backpatched jumps:
//!
//! ```text
//! if c; A; else; B; endif;     c jfalse→L1  A  jump→L2  L1: B  L2:
//! while c; A; wend;            L0: c jfalse→L1  A  jump→L0  L1:
//! repeat; A; until c;          L0: A  c jfalse→L0
//! func f(a); A; end;           jump→L1  A  return_missing  L1:
//! ```
//!
//! `break` and the `while` exit jump are loop exits: they are collected per
//! loop and all resolved when the loop closes.

use tracing::debug;

use tern_codegen::Fixup;
use tern_lexer::{lookup_keyword, ArgClass, Word};
use tern_types::{CompileError, ErrorCode, IdentRef, Opcode, Result, Value, NO_SLOT};

use crate::parser::{Control, FuncKind, FuncState, Parser};

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Program
    // ══════════════════════════════════════════════════════════════════════════

    /// Compile `{ statement ";" }` up to the end of input, then `stop`.
    pub(crate) fn parse_program(&mut self) -> Result<()> {
        while !self.lx.at_end() {
            self.statement()?;
            if self.lx.char(b';') {
                continue;
            }
            if self.lx.at_end() {
                return Err(self.err_here(
                    ErrorCode::UNEXPECTED_END,
                    "expected ';' but reached end of input",
                ));
            }
            return Err(self.err_here(ErrorCode::TRAILING_INPUT, "expected ';' after statement"));
        }

        if let Some(open) = self.control.last().copied() {
            return Err(self.err_at(
                ErrorCode::UNTERMINATED_CONTROL,
                format!("unterminated '{}'", open.op),
                open.start,
                open.end,
            ));
        }
        self.emit_op(Opcode::Stop)
    }

    fn statement(&mut self) -> Result<()> {
        let Some(word) = self.lx.word() else {
            return Err(self.err_here(ErrorCode::BAD_STATEMENT, "expected a statement"));
        };
        let span = self.lx.source().span(word.start, word.end());
        self.source_map.push(self.code.pos(), span);

        if let Some(kw) = lookup_keyword(word.text) {
            return match kw.class {
                ArgClass::Cmd0 => self.emit_op(kw.op),
                ArgClass::CmdAny => self.print_stmt(word),
                ArgClass::Input => self.input_stmt(),
                ArgClass::Control => self.control_stmt(kw.op, word),
                ArgClass::Const | ArgClass::Func(_) => Err(self.err_at(
                    ErrorCode::UNEXPECTED_KEYWORD,
                    format!("'{}' cannot start a statement", word.as_str()),
                    word.start,
                    word.end(),
                )),
            };
        }

        let id = self.intern(word.text)?;
        if self.lx.char(b'=') {
            self.expr()?;
            return self.store(id, word);
        }

        // Procedure call: `name a, b`.
        let n = self.stmt_args()?;
        let n = self.arg_count(n, word)?;
        self.emit_op(Opcode::CallProc)?;
        self.emit_byte(n)?;
        self.emit_word(id.offset())
    }

    /// Unparenthesized comma-separated arguments running to the end of the
    /// statement.
    fn stmt_args(&mut self) -> Result<usize> {
        if self.lx.peek_stmt_end() {
            return Ok(0);
        }
        let mut n = 0;
        loop {
            self.expr()?;
            n += 1;
            if !self.lx.char(b',') {
                return Ok(n);
            }
        }
    }

    fn print_stmt(&mut self, word: Word<'_>) -> Result<()> {
        let n = self.stmt_args()?;
        let n = self.arg_count(n, word)?;
        self.emit_op(Opcode::Print)?;
        self.emit_byte(n)
    }

    /// `input a, b`: each name receives one line of console input.
    fn input_stmt(&mut self) -> Result<()> {
        loop {
            let name = self.name("a variable name after 'input'")?;
            let id = self.intern(name.text)?;
            self.emit_op(Opcode::Input)?;
            self.store(id, name)?;
            if !self.lx.char(b',') {
                return Ok(());
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Names and Slots
    // ══════════════════════════════════════════════════════════════════════════

    /// Lex an identifier that must not be a keyword.
    fn name(&mut self, what: &str) -> Result<Word<'src>> {
        let Some(word) = self.lx.word() else {
            if self.lx.at_end() {
                return Err(self.err_here(
                    ErrorCode::UNEXPECTED_END,
                    format!("expected {what} but reached end of input"),
                ));
            }
            return Err(self.err_here(ErrorCode::EXPECTED_TOKEN, format!("expected {what}")));
        };
        if lookup_keyword(word.text).is_some() {
            return Err(self.err_at(
                ErrorCode::RESERVED_WORD,
                format!("'{}' is a reserved word", word.as_str()),
                word.start,
                word.end(),
            ));
        }
        Ok(word)
    }

    /// Pop the value on top of the VM stack into `id`. Inside a function a
    /// name without a slot becomes a new local.
    fn store(&mut self, id: IdentRef, word: Word<'_>) -> Result<()> {
        if self.func.is_none() {
            if matches!(self.heap.ident_value(id), Value::Proc(_) | Value::Func(_)) {
                return Err(self.redefinition(id, word));
            }
            return self.emit_ident(Opcode::IdentSet, id);
        }
        let slot = match self.slot_of(id) {
            Some(slot) => slot,
            None => self.declare_local(id, word)?,
        };
        self.emit_op(Opcode::SlotSet)?;
        self.emit_byte(slot)
    }

    /// Give `id` the next slot of the function being compiled.
    fn declare_local(&mut self, id: IdentRef, word: Word<'_>) -> Result<u8> {
        if matches!(self.heap.ident_value(id), Value::Proc(_) | Value::Func(_)) {
            return Err(self.redefinition(id, word));
        }
        let max_slots = self.max_slots;
        let Some(func) = self.func.as_mut() else {
            return Err(self.err_at(
                ErrorCode::MISPLACED_DEFINITION,
                "local outside of a func or proc",
                word.start,
                word.end(),
            ));
        };
        if func.locals.len() >= max_slots {
            return Err(self.err_at(
                ErrorCode::TOO_MANY_LOCALS,
                format!("too many parameters and locals (at most {max_slots})"),
                word.start,
                word.end(),
            ));
        }
        let slot = func.locals.len() as u8;
        func.locals.push(id);
        let owner = func.id;
        let count = func.locals.len() as u8;
        self.heap.set_ident_slot(id, slot);
        self.heap.set_ident_slot(owner, count);
        Ok(slot)
    }

    fn redefinition(&self, id: IdentRef, word: Word<'_>) -> CompileError {
        let what = match self.heap.ident_value(id) {
            Value::Func(_) => "func",
            _ => "proc",
        };
        self.err_at(
            ErrorCode::REDEFINITION,
            format!("'{}' is already defined as a {what}", word.as_str()),
            word.start,
            word.end(),
        )
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Control Flow
    // ══════════════════════════════════════════════════════════════════════════

    fn control_stmt(&mut self, op: Opcode, word: Word<'_>) -> Result<()> {
        match op {
            Opcode::If => {
                self.push_control(op, word)?;
                self.expr()?;
                let skip = self.emit_forward(Opcode::Jfalse)?;
                self.forward.push(skip).map_err(|m| self.too_complex(m))
            }
            Opcode::Else => {
                self.pop_control(word, &[Opcode::If])?;
                self.push_control(op, word)?;
                let skip = self.pop_forward()?;
                // The if-skip lands after the jump emitted next.
                let target = self.code.pos() + 3;
                self.patch_to(skip, target)?;
                let over = self.emit_forward(Opcode::Jump)?;
                self.forward.push(over).map_err(|m| self.too_complex(m))
            }
            Opcode::Endif => {
                self.pop_control(word, &[Opcode::If, Opcode::Else])?;
                let skip = self.pop_forward()?;
                self.patch(skip)
            }
            Opcode::While => {
                self.push_control(op, word)?;
                self.begin_loop()?;
                self.expr()?;
                let exit = self.emit_forward(Opcode::Jfalse)?;
                self.loop_exit(exit)
            }
            Opcode::Wend => {
                self.pop_control(word, &[Opcode::While])?;
                self.end_loop(Opcode::Jump)
            }
            Opcode::Repeat => {
                self.push_control(op, word)?;
                self.begin_loop()
            }
            Opcode::Until => {
                self.pop_control(word, &[Opcode::Repeat])?;
                self.expr()?;
                self.end_loop(Opcode::Jfalse)
            }
            Opcode::Break => {
                if self.loop_starts.is_empty() {
                    return Err(self.err_at(
                        ErrorCode::BREAK_OUTSIDE_LOOP,
                        "'break' outside of a loop",
                        word.start,
                        word.end(),
                    ));
                }
                let exit = self.emit_forward(Opcode::Jump)?;
                self.loop_exit(exit)
            }
            Opcode::Func | Opcode::Proc => self.func_def(op, word),
            Opcode::Return => self.return_stmt(word),
            _ => self.func_end(word),
        }
    }

    fn push_control(&mut self, op: Opcode, word: Word<'_>) -> Result<()> {
        let entry = Control {
            op,
            start: word.start,
            end: word.end(),
        };
        self.control.push(entry).map_err(|m| self.too_complex(m))
    }

    /// Close the innermost construct, which must be one of `openers`.
    fn pop_control(&mut self, word: Word<'_>, openers: &[Opcode]) -> Result<Control> {
        let message = match self.control.last().copied() {
            Some(open) if openers.contains(&open.op) => {
                self.control.pop();
                return Ok(open);
            }
            Some(open) => format!("'{}' does not match open '{}'", word.as_str(), open.op),
            None => format!("'{}' without '{}'", word.as_str(), openers[0]),
        };
        Err(self.err_at(ErrorCode::UNMATCHED_CONTROL, message, word.start, word.end()))
    }

    fn pop_forward(&mut self) -> Result<Fixup> {
        match self.forward.pop() {
            Some(fixup) => Ok(fixup),
            None => Err(self.err_here(ErrorCode::UNMATCHED_CONTROL, "unbalanced control statement")),
        }
    }

    // ── Loops ─────────────────────────────────────────────────────────────────

    fn begin_loop(&mut self) -> Result<()> {
        let start = self.code.pos();
        self.loop_starts.push(start).map_err(|m| self.too_complex(m))?;
        let outer = self.exit_count;
        self.saved_exit_counts
            .push(outer)
            .map_err(|m| self.too_complex(m))?;
        self.exit_count = 0;
        debug!(start, depth = self.loop_starts.len(), "loop opened");
        Ok(())
    }

    fn loop_exit(&mut self, exit: Fixup) -> Result<()> {
        self.loop_exits.push(exit).map_err(|m| self.too_complex(m))?;
        self.exit_count += 1;
        Ok(())
    }

    /// Jump back to the loop start with `op`, then land every exit here.
    fn end_loop(&mut self, op: Opcode) -> Result<()> {
        let Some(start) = self.loop_starts.pop() else {
            return Err(self.err_here(ErrorCode::UNMATCHED_CONTROL, "unbalanced loop"));
        };
        self.emit_backward(op, start)?;
        let exits = self.exit_count;
        for _ in 0..exits {
            let Some(exit) = self.loop_exits.pop() else {
                break;
            };
            self.patch(exit)?;
        }
        self.exit_count = self.saved_exit_counts.pop().unwrap_or(0);
        debug!(start, end = self.code.pos(), exits, "loop closed");
        Ok(())
    }

    // ── Functions ─────────────────────────────────────────────────────────────

    /// `func name(a, b)` / `proc name(a, b)`.
    fn func_def(&mut self, op: Opcode, word: Word<'_>) -> Result<()> {
        if !self.control.is_empty() || self.func.is_some() {
            return Err(self.err_at(
                ErrorCode::MISPLACED_DEFINITION,
                format!("'{}' is only allowed at top level", word.as_str()),
                word.start,
                word.end(),
            ));
        }
        self.push_control(op, word)?;
        let skip = self.emit_forward(Opcode::Jump)?;
        self.forward.push(skip).map_err(|m| self.too_complex(m))?;

        let name = self.name(&format!("a name after '{}'", word.as_str()))?;
        let id = self.intern(name.text)?;
        if self.heap.ident_value(id) != Value::Unset {
            return Err(self.err_at(
                ErrorCode::REDEFINITION,
                format!("'{}' is already defined", name.as_str()),
                name.start,
                name.end(),
            ));
        }

        let entry = match u16::try_from(self.code.pos()) {
            Ok(entry) => entry,
            Err(_) => {
                return Err(self.err_here(ErrorCode::CODE_OVERFLOW, "function entry is out of range"))
            }
        };
        let (kind, value) = if op == Opcode::Func {
            (FuncKind::Func, Value::Func(entry))
        } else {
            (FuncKind::Proc, Value::Proc(entry))
        };
        self.heap.set_ident_value(id, value);
        self.heap.set_ident_slot(id, 0);
        self.func = Some(FuncState {
            id,
            kind,
            locals: Vec::new(),
        });

        self.expect(b'(')?;
        if !self.lx.char(b')') {
            loop {
                let param = self.name("a parameter name")?;
                let pid = self.intern(param.text)?;
                if self.slot_of(pid).is_some() {
                    return Err(self.err_at(
                        ErrorCode::DUPLICATE_PARAMETER,
                        format!("duplicate parameter '{}'", param.as_str()),
                        param.start,
                        param.end(),
                    ));
                }
                self.declare_local(pid, param)?;
                if !self.lx.char(b',') {
                    break;
                }
            }
            self.expect(b')')?;
        }

        let nargs = self.func.as_ref().map_or(0, |f| f.locals.len()) as u8;
        self.heap.set_ident_arg_count(id, nargs);
        debug!(name = name.as_str(), entry, nargs, "{} defined", word.as_str());
        Ok(())
    }

    fn return_stmt(&mut self, word: Word<'_>) -> Result<()> {
        let Some(kind) = self.func.as_ref().map(|f| f.kind) else {
            return Err(self.err_at(
                ErrorCode::MISPLACED_RETURN,
                "'return' outside of a func or proc",
                word.start,
                word.end(),
            ));
        };
        let has_value = !self.lx.peek_stmt_end();
        match (kind, has_value) {
            (FuncKind::Proc, false) => self.emit_op(Opcode::ReturnProc),
            (FuncKind::Func, true) => {
                self.expr()?;
                self.emit_op(Opcode::ReturnFunc)
            }
            (FuncKind::Proc, true) => Err(self.err_here(
                ErrorCode::MISPLACED_RETURN,
                "'return' in a proc takes no value",
            )),
            (FuncKind::Func, false) => Err(self.err_at(
                ErrorCode::MISPLACED_RETURN,
                "'return' in a func needs a value",
                word.start,
                word.end(),
            )),
        }
    }

    /// `end`: close the function body and release its slots.
    fn func_end(&mut self, word: Word<'_>) -> Result<()> {
        self.pop_control(word, &[Opcode::Func, Opcode::Proc])?;
        let Some(func) = self.func.take() else {
            return Err(self.err_at(
                ErrorCode::UNMATCHED_CONTROL,
                "'end' without 'func'",
                word.start,
                word.end(),
            ));
        };
        let fallthrough = match func.kind {
            FuncKind::Proc => Opcode::ReturnProc,
            FuncKind::Func => Opcode::ReturnMissing,
        };
        self.emit_op(fallthrough)?;
        for &local in &func.locals {
            self.heap.set_ident_slot(local, NO_SLOT);
        }
        let skip = self.pop_forward()?;
        self.patch(skip)?;
        debug!(slots = func.locals.len(), end = self.code.pos(), "function closed");
        Ok(())
    }
}
