//! The bytecode interpreter.
//!
//! A fetch/dispatch loop over [`Program::code`]. Values live on a byte
//! stack; a call frame is the callee's slots (arguments first) followed by
//! three saved words: the caller's frame pointer, the stack pointer to
//! restore on return and the return address.
//!
//! ```text
//!   fp ─► slot 0 │ slot 1 │ … │ slot n-1 │ old fp │ old sp │ return pc │ temporaries…
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tern_codegen::{decode, Instruction, Program};
use tern_types::{Heap, IdentRef, Limits, Opcode, Value, F16, VALUE_SIZE};
use tracing::{debug, trace};

use crate::builtins;
use crate::console::Console;
use crate::error::{RuntimeError, RuntimeResult, Trap};
use crate::stack::OperandStack;

enum Flow {
    Continue,
    Halt,
}

/// One execution of a program.
///
/// The VM works on its own copy of the program heap, so globals and
/// allocations never leak between runs. `rnd()` draws from a generator
/// seeded by [`Limits::seed`].
pub struct Vm<'p> {
    program: &'p Program,
    heap: Heap,
    stack: OperandStack,
    rng: StdRng,
    pc: usize,
    fp: usize,
    depth: usize,
}

impl<'p> Vm<'p> {
    /// Prepare a run of `program`. Limits are validated first: frame words
    /// are 16 bits wide, so a larger stack could not be addressed.
    pub fn new(program: &'p Program, limits: &Limits) -> RuntimeResult<Self> {
        limits.validate().map_err(RuntimeError::InvalidLimits)?;
        Ok(Self {
            program,
            heap: program.heap.clone(),
            stack: OperandStack::new(limits.stack_size),
            rng: StdRng::seed_from_u64(limits.seed),
            pc: 0,
            fp: 0,
            depth: 0,
        })
    }

    /// The heap as the program left it.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Run until `stop` or the first runtime error.
    pub fn run(&mut self, console: &mut dyn Console) -> Result<(), Trap> {
        debug!(code_len = self.program.code.len(), "run started");
        loop {
            let at = self.pc;
            match self.step(console) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Halt) => {
                    debug!(pc = at, heap_used = self.heap.used(), "halted");
                    return Ok(());
                }
                Err(error) => {
                    debug!(pc = at, %error, "trap");
                    return Err(Trap { pc: at, error });
                }
            }
        }
    }

    fn fetch(&self) -> RuntimeResult<Instruction> {
        let code = &self.program.code;
        match decode(code, self.pc) {
            Some(ins) if ins.op.is_executable() => Ok(ins),
            Some(ins) => Err(RuntimeError::UnknownOpcode(ins.op as u8)),
            None => match code.get(self.pc) {
                Some(&b) if Opcode::from_u8(b).is_none() => Err(RuntimeError::UnknownOpcode(b)),
                _ => Err(RuntimeError::CodeOverrun(self.pc)),
            },
        }
    }

    fn step(&mut self, console: &mut dyn Console) -> RuntimeResult<Flow> {
        let ins = self.fetch()?;
        trace!(pc = ins.offset, op = ins.op.name(), sp = self.stack.sp(), "step");
        self.pc = ins.next();

        match ins.op {
            Opcode::Stop => return Ok(Flow::Halt),

            // ── Literals ──
            Opcode::LitInt => self.stack.push(Value::Int(ins.word as i16))?,
            Opcode::LitFloat => self.stack.push(Value::Float(F16::from_bits(ins.word)))?,
            Opcode::LitStrEmpty => self.stack.push(Value::StrEmpty)?,
            Opcode::LitStrChar => self.stack.push(Value::StrChar(ins.byte))?,
            Opcode::LitStr => {
                let s = self.heap.str_at(ins.word)?;
                self.stack.push(Value::Str(s))?;
            }
            Opcode::Rnd => {
                let bits: u16 = self.rng.gen();
                self.stack.push(Value::Int(bits as i16))?;
            }
            Opcode::True => self.stack.push(Value::Bool(true))?,
            Opcode::False => self.stack.push(Value::Bool(false))?,
            Opcode::Array => {
                let elems = self.stack.pop_n(ins.byte as usize)?;
                let arr = builtins::array(&mut self.heap, &elems)?;
                self.stack.push(arr)?;
            }

            // ── Variables ──
            Opcode::IdentGet => {
                let id = self.heap.ident_at(ins.word)?;
                match self.heap.ident_value(id) {
                    Value::Unset => {
                        return Err(RuntimeError::UndefinedVariable(self.heap.ident_display(id)))
                    }
                    v => self.stack.push(v)?,
                }
            }
            Opcode::IdentSet => {
                let id = self.heap.ident_at(ins.word)?;
                let v = self.stack.pop()?;
                self.heap.set_ident_value(id, v);
            }
            Opcode::SlotGet => match self.stack.get(self.slot(ins.byte))? {
                Value::Unset => {
                    return Err(RuntimeError::UndefinedVariable(format!("local #{}", ins.byte)))
                }
                v => self.stack.push(v)?,
            },
            Opcode::SlotSet => {
                let v = self.stack.pop()?;
                self.stack.set(self.slot(ins.byte), v)?;
            }

            // ── Operators and built-ins ──
            Opcode::Neg
            | Opcode::Bnot
            | Opcode::Lnot
            | Opcode::Abs
            | Opcode::Sgn
            | Opcode::Sqrt
            | Opcode::Int
            | Opcode::Float
            | Opcode::Asc
            | Opcode::Chr
            | Opcode::Str
            | Opcode::Len => {
                let a = self.stack.pop()?;
                let r = builtins::unary(ins.op, a, &mut self.heap)?;
                self.stack.push(r)?;
            }
            Opcode::Mul
            | Opcode::Div
            | Opcode::Mod
            | Opcode::Add
            | Opcode::Sub
            | Opcode::Asr
            | Opcode::Lsr
            | Opcode::Lsl
            | Opcode::Le
            | Opcode::Lt
            | Opcode::Gt
            | Opcode::Ge
            | Opcode::Eq
            | Opcode::Ne
            | Opcode::Band
            | Opcode::Bor
            | Opcode::Beor
            | Opcode::Land
            | Opcode::Lor => {
                let b = self.stack.pop()?;
                let a = self.stack.pop()?;
                let r = builtins::binary(ins.op, a, b, &mut self.heap)?;
                self.stack.push(r)?;
            }
            Opcode::Left | Opcode::Right => {
                let n = self.stack.pop()?;
                let s = self.stack.pop()?;
                let r = if ins.op == Opcode::Left {
                    builtins::left(&mut self.heap, s, n)?
                } else {
                    builtins::right(&mut self.heap, s, n)?
                };
                self.stack.push(r)?;
            }
            Opcode::Substr => {
                let n = self.stack.pop()?;
                let start = self.stack.pop()?;
                let s = self.stack.pop()?;
                let r = builtins::substr(&mut self.heap, s, start, n)?;
                self.stack.push(r)?;
            }
            Opcode::Index => {
                let i = self.stack.pop()?;
                let c = self.stack.pop()?;
                let r = builtins::index(&self.heap, c, i)?;
                self.stack.push(r)?;
            }
            Opcode::Slice => {
                let j = self.stack.pop()?;
                let i = self.stack.pop()?;
                let c = self.stack.pop()?;
                let r = builtins::slice(&mut self.heap, c, i, j)?;
                self.stack.push(r)?;
            }

            // ── Console ──
            Opcode::Print => {
                let values = self.stack.pop_n(ins.byte as usize)?;
                let mut line = Vec::new();
                for (i, v) in values.into_iter().enumerate() {
                    if i > 0 {
                        line.push(b' ');
                    }
                    builtins::render(&self.heap, v, &mut line);
                }
                console.write_line(&line)?;
            }
            Opcode::Input => {
                let line = console.read_line()?;
                let v = builtins::make_str(&mut self.heap, &line)?;
                self.stack.push(v)?;
            }

            // ── Control ──
            Opcode::Jump => self.pc = ins.jump_target(),
            Opcode::Jfalse => match self.stack.pop()? {
                Value::Bool(false) => self.pc = ins.jump_target(),
                Value::Bool(true) => {}
                other => {
                    return Err(RuntimeError::TypeMismatch {
                        op: "condition",
                        operands: other.kind().name().to_string(),
                    })
                }
            },
            Opcode::CallProc | Opcode::CallFunc => self.call(ins)?,
            Opcode::ReturnFunc => {
                let v = self.stack.pop()?;
                self.leave()?;
                self.stack.push(v)?;
            }
            Opcode::ReturnProc => self.leave()?,
            Opcode::ReturnMissing => return Err(RuntimeError::MissingReturn),

            other => return Err(RuntimeError::UnknownOpcode(other as u8)),
        }
        Ok(Flow::Continue)
    }

    fn slot(&self, n: u8) -> usize {
        self.fp + VALUE_SIZE * n as usize
    }

    /// Resolve the callee, check it, and push its frame.
    fn call(&mut self, ins: Instruction) -> RuntimeResult<()> {
        let id = self.heap.ident_at(ins.word)?;
        let is_proc = ins.op == Opcode::CallProc;
        let entry = match self.heap.ident_value(id) {
            Value::Unset => return Err(RuntimeError::UndefinedCallTarget(self.name(id))),
            Value::Proc(entry) if is_proc => entry,
            Value::Func(entry) if !is_proc => entry,
            _ => {
                return Err(RuntimeError::BadCallTarget {
                    name: self.name(id),
                    expected: if is_proc { "proc" } else { "func" },
                })
            }
        };
        let expected = self.heap.ident_arg_count(id);
        if ins.byte != expected {
            return Err(RuntimeError::ArgumentCount {
                name: self.name(id),
                expected,
                found: ins.byte,
            });
        }

        // Arguments already sit in the first slots; the rest start unset.
        // The slot count comes from the record named by the call, so calling
        // through a copy (`q = p; q;`) uses the copy's NO_SLOT byte and
        // reserves a 255-slot frame.
        let base = self
            .stack
            .sp()
            .checked_sub(VALUE_SIZE * ins.byte as usize)
            .ok_or(RuntimeError::StackUnderflow)?;
        let slots = self.heap.ident_slot(id) as usize;
        self.stack.set_sp(base + VALUE_SIZE * slots)?;
        self.stack.push_word(self.fp as u16)?;
        self.stack.push_word(base as u16)?;
        self.stack.push_word(self.pc as u16)?;

        self.depth += 1;
        debug!(callee = %self.name(id), entry, slots, depth = self.depth, "call");
        self.fp = base;
        self.pc = entry as usize;
        Ok(())
    }

    /// Pop the current frame, restoring the caller's registers.
    fn leave(&mut self) -> RuntimeResult<()> {
        let pc = self.stack.pop_word()?;
        let sp = self.stack.pop_word()?;
        let fp = self.stack.pop_word()?;
        self.stack.set_sp(sp as usize)?;
        self.fp = fp as usize;
        self.pc = pc as usize;
        self.depth = self.depth.saturating_sub(1);
        debug!(pc, depth = self.depth, "return");
        Ok(())
    }

    fn name(&self, id: IdentRef) -> String {
        self.heap.ident_display(id)
    }
}
