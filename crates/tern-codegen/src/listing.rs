//! Bytecode disassembler.
//!
//! Identifier operands are shown by name, string literals by their text and
//! jumps by their absolute target.

use std::fmt::Write;

use tern_types::{Heap, Opcode, Shape, F16};

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub offset: usize,
    pub op: Opcode,
    /// Raw operand bytes, zero-extended: byte operands in `byte`, word
    /// operands in `word`, calls use both.
    pub byte: u8,
    pub word: u16,
}

impl Instruction {
    /// Offset of the following instruction.
    pub fn next(&self) -> usize {
        self.offset + 1 + self.op.shape().size()
    }

    /// Absolute target of a jump instruction.
    pub fn jump_target(&self) -> usize {
        (self.next() as i64 + self.word as i16 as i64) as usize
    }
}

/// Decode the instruction at `offset`. `None` for a byte that is not an
/// opcode or an operand running past the end of the code.
pub fn decode(code: &[u8], offset: usize) -> Option<Instruction> {
    let op = Opcode::from_u8(*code.get(offset)?)?;
    let operand = code.get(offset + 1..offset + 1 + op.shape().size())?;
    let (byte, word) = match op.shape() {
        Shape::None => (0, 0),
        Shape::Byte => (operand[0], 0),
        Shape::Word => (0, u16::from_be_bytes([operand[0], operand[1]])),
        Shape::Call => (operand[0], u16::from_be_bytes([operand[1], operand[2]])),
    };
    Some(Instruction {
        offset,
        op,
        byte,
        word,
    })
}

fn ident_name(heap: &Heap, offset: u16) -> String {
    match heap.ident_at(offset) {
        Ok(id) => heap.ident_display(id),
        Err(_) => format!("@{offset:#06x}"),
    }
}

fn operand_text(ins: &Instruction, heap: &Heap) -> String {
    match ins.op {
        Opcode::LitInt => format!("{}", ins.word as i16),
        Opcode::LitFloat => format!("{}", F16::from_bits(ins.word).to_f32()),
        Opcode::LitStrChar => format!("{:?}", ins.byte as char),
        Opcode::LitStr => match heap.str_at(ins.word) {
            Ok(s) => format!("{:?}", String::from_utf8_lossy(heap.str_bytes(s))),
            Err(_) => format!("@{:#06x}", ins.word),
        },
        Opcode::IdentGet | Opcode::IdentSet => ident_name(heap, ins.word),
        Opcode::SlotGet | Opcode::SlotSet => format!("#{}", ins.byte),
        Opcode::CallProc | Opcode::CallFunc => {
            format!("{}/{}", ident_name(heap, ins.word), ins.byte)
        }
        Opcode::Jump | Opcode::Jfalse => format!("-> {:04x}", ins.jump_target()),
        _ => match ins.op.shape() {
            Shape::Byte => format!("{}", ins.byte),
            Shape::Word => format!("{}", ins.word),
            Shape::Call => format!("{} {}", ins.byte, ins.word),
            Shape::None => String::new(),
        },
    }
}

/// Render `code` one instruction per line.
pub fn disassemble(code: &[u8], heap: &Heap) -> String {
    let mut out = String::new();
    let mut pc = 0;
    while pc < code.len() {
        let Some(ins) = decode(code, pc) else {
            let _ = writeln!(out, "{pc:04x} .byte {:#04x}", code[pc]);
            pc += 1;
            continue;
        };
        let operands = operand_text(&ins, heap);
        if operands.is_empty() {
            let _ = writeln!(out, "{pc:04x} {}", ins.op);
        } else {
            let _ = writeln!(out, "{pc:04x} {} {operands}", ins.op);
        }
        pc = ins.next();
    }
    out
}
