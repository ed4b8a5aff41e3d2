//! Bytecode instruction set.
//!
//! Every opcode lives in the high half of the byte range (`0x80..`), in a
//! fixed order shared by the compiler and the VM. Operators and keywords
//! double as opcodes; control keywords are never emitted and only serve as
//! keyword-table identities.
//!
//! Operands follow the opcode byte and are big-endian:
//!
//! | shape  | bytes | used by |
//! |--------|-------|---------|
//! | `None` | 0 | operators, built-ins, `stop`, returns |
//! | `Byte` | 1 | `print`/`array` counts, slots, `lit_str_char` |
//! | `Word` | 2 | identifiers, int/float/heap literals, relative jumps |
//! | `Call` | 3 | argument count byte, then callee identifier word |

/// Operand layout following an opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    None,
    Byte,
    Word,
    Call,
}

impl Shape {
    /// Operand bytes following the opcode.
    pub fn size(self) -> usize {
        match self {
            Shape::None => 0,
            Shape::Byte => 1,
            Shape::Word => 2,
            Shape::Call => 3,
        }
    }
}

macro_rules! opcodes {
    (
        $first:ident => $first_name:literal $first_shape:ident,
        $($variant:ident => $name:literal $shape:ident,)*
    ) => {
        /// A bytecode opcode.
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Opcode {
            $first = 0x80,
            $($variant,)*
        }

        impl Opcode {
            /// Every opcode in encoding order.
            pub const ALL: &'static [Opcode] = &[Opcode::$first, $(Opcode::$variant,)*];

            pub fn name(self) -> &'static str {
                match self {
                    Opcode::$first => $first_name,
                    $(Opcode::$variant => $name,)*
                }
            }

            pub fn shape(self) -> Shape {
                match self {
                    Opcode::$first => Shape::$first_shape,
                    $(Opcode::$variant => Shape::$shape,)*
                }
            }
        }
    };
}

opcodes! {
    Fail => "fail" None,
    Mark => "mark" None,

    // ── Operators ──
    Neg => "neg" None,
    Bnot => "bnot" None,
    Lnot => "lnot" None,
    Mul => "mul" None,
    Div => "div" None,
    Mod => "mod" None,
    Add => "add" None,
    Sub => "sub" None,
    Asr => "asr" None,
    Lsr => "lsr" None,
    Lsl => "lsl" None,
    Le => "le" None,
    Lt => "lt" None,
    Gt => "gt" None,
    Ge => "ge" None,
    Eq => "eq" None,
    Ne => "ne" None,
    Band => "band" None,
    Bor => "bor" None,
    Beor => "beor" None,
    Land => "land" None,
    Lor => "lor" None,

    // ── Keywords ──
    Abs => "abs" None,
    Asc => "asc" None,
    Break => "break" None,
    Chr => "chr" None,
    Else => "else" None,
    End => "end" None,
    Endif => "endif" None,
    False => "false" None,
    Float => "float" None,
    Func => "func" None,
    If => "if" None,
    Input => "input" None,
    Int => "int" None,
    Left => "left" None,
    Len => "len" None,
    Print => "print" Byte,
    Proc => "proc" None,
    Repeat => "repeat" None,
    Return => "return" None,
    Right => "right" None,
    Rnd => "rnd" None,
    Sgn => "sgn" None,
    Sqrt => "sqrt" None,
    Stop => "stop" None,
    Str => "str" None,
    Substr => "substr" None,
    True => "true" None,
    Until => "until" None,
    Wend => "wend" None,
    While => "while" None,

    // ── Internal ──
    Index => "index" None,
    Slice => "slice" None,
    Array => "array" Byte,
    CallProc => "call_proc" Call,
    CallFunc => "call_func" Call,
    IdentGet => "ident_get" Word,
    IdentSet => "ident_set" Word,
    SlotGet => "slot_get" Byte,
    SlotSet => "slot_set" Byte,
    LitInt => "lit_int" Word,
    LitFloat => "lit_float" Word,
    LitStrEmpty => "lit_str_empty" None,
    LitStrChar => "lit_str_char" Byte,
    LitStr => "lit_str" Word,
    Jump => "jump" Word,
    Jfalse => "jfalse" Word,
    ReturnFunc => "return_func" None,
    ReturnProc => "return_proc" None,
    ReturnMissing => "return_missing" None,
}

impl Opcode {
    pub fn from_u8(b: u8) -> Option<Opcode> {
        b.checked_sub(0x80)
            .and_then(|i| Self::ALL.get(i as usize))
            .copied()
    }

    /// Whether the VM executes this opcode. Control keywords and the
    /// expression-compiler sentinels are never emitted.
    pub fn is_executable(self) -> bool {
        !matches!(
            self,
            Opcode::Fail
                | Opcode::Mark
                | Opcode::Break
                | Opcode::Else
                | Opcode::End
                | Opcode::Endif
                | Opcode::Func
                | Opcode::If
                | Opcode::Proc
                | Opcode::Repeat
                | Opcode::Return
                | Opcode::Until
                | Opcode::Wend
                | Opcode::While
        )
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
