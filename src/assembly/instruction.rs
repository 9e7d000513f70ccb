//! CIL instruction records, operands and the opcode table.
//!
//! Instructions here are already decoded: each record carries its [`OpCode`], a typed
//! [`Operand`] and its layout (`offset`/`size`) inside the method body. Branch targets
//! are absolute body offsets, so re-laying out a body only has to remap them.
//!
//! ```rust
//! use dotrename::assembly::{Instruction, OpCode};
//!
//! let ret = Instruction::simple(OpCode::Ret);
//! assert_eq!(ret.size, 1);
//! assert_eq!(ret.opcode.mnemonic(), "ret");
//! ```

use std::fmt;

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::metadata::token::Token;

/// Types of operands for CIL instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    /// No operand present
    None,
    /// Signed 8-bit integer (short immediates, short branches)
    Int8,
    /// Unsigned 8-bit integer (short argument/local indices)
    UInt8,
    /// Unsigned 16-bit integer (argument/local indices)
    UInt16,
    /// Signed 32-bit integer (immediates, long branches)
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// 32-bit floating point
    Float32,
    /// 64-bit floating point
    Float64,
    /// Metadata token reference
    Token,
    /// Switch table operand
    Switch,
}

impl OperandType {
    /// Returns the size in bytes of this operand type, `None` for the variable-size switch table.
    #[must_use]
    pub const fn size(&self) -> Option<usize> {
        match self {
            OperandType::None => Some(0),
            OperandType::Int8 | OperandType::UInt8 => Some(1),
            OperandType::UInt16 => Some(2),
            OperandType::Int32 | OperandType::Float32 | OperandType::Token => Some(4),
            OperandType::Int64 | OperandType::Float64 => Some(8),
            OperandType::Switch => None,
        }
    }
}

/// How an instruction affects control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowType {
    /// Normal execution continues to next instruction
    Sequential,
    /// Conditional branch to another location
    ConditionalBranch,
    /// Always branches to another location (unconditional jump)
    UnconditionalBranch,
    /// Call to another method
    Call,
    /// Returns from current method
    Return,
    /// Multi-way branch (switch statement)
    Switch,
    /// Exception throwing
    Throw,
    /// Leave protected region (try/catch/finally)
    Leave,
}

macro_rules! opcodes {
    ($( $variant:ident => ($mnemonic:literal, $prefix:literal, $byte:literal, $operand:ident, $flow:ident) ),* $(,)?) => {
        /// CIL opcodes understood by the instruction scanner.
        ///
        /// The `Display`/`FromStr` forms are the ECMA-335 mnemonics (`ldarg.0`, `br.s`, ...).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, EnumIter)]
        pub enum OpCode {
            $(
                #[doc = concat!("`", $mnemonic, "`")]
                #[strum(serialize = $mnemonic)]
                $variant,
            )*
        }

        impl OpCode {
            /// The `0xFE` prefix byte for two-byte opcodes, `0` otherwise.
            #[must_use]
            pub const fn prefix(self) -> u8 {
                match self { $( OpCode::$variant => $prefix, )* }
            }

            /// The (second, for prefixed opcodes) opcode byte.
            #[must_use]
            pub const fn byte(self) -> u8 {
                match self { $( OpCode::$variant => $byte, )* }
            }

            /// The operand encoding this opcode expects.
            #[must_use]
            pub const fn operand_type(self) -> OperandType {
                match self { $( OpCode::$variant => OperandType::$operand, )* }
            }

            /// How this opcode affects control flow.
            #[must_use]
            pub const fn flow_type(self) -> FlowType {
                match self { $( OpCode::$variant => FlowType::$flow, )* }
            }
        }
    };
}

opcodes! {
    Nop => ("nop", 0x00, 0x00, None, Sequential),
    Ldarg0 => ("ldarg.0", 0x00, 0x02, None, Sequential),
    Ldarg1 => ("ldarg.1", 0x00, 0x03, None, Sequential),
    Ldarg2 => ("ldarg.2", 0x00, 0x04, None, Sequential),
    Ldarg3 => ("ldarg.3", 0x00, 0x05, None, Sequential),
    Ldloc0 => ("ldloc.0", 0x00, 0x06, None, Sequential),
    Ldloc1 => ("ldloc.1", 0x00, 0x07, None, Sequential),
    Ldloc2 => ("ldloc.2", 0x00, 0x08, None, Sequential),
    Ldloc3 => ("ldloc.3", 0x00, 0x09, None, Sequential),
    Stloc0 => ("stloc.0", 0x00, 0x0A, None, Sequential),
    Stloc1 => ("stloc.1", 0x00, 0x0B, None, Sequential),
    Stloc2 => ("stloc.2", 0x00, 0x0C, None, Sequential),
    Stloc3 => ("stloc.3", 0x00, 0x0D, None, Sequential),
    LdargS => ("ldarg.s", 0x00, 0x0E, UInt8, Sequential),
    LdargaS => ("ldarga.s", 0x00, 0x0F, UInt8, Sequential),
    StargS => ("starg.s", 0x00, 0x10, UInt8, Sequential),
    LdlocS => ("ldloc.s", 0x00, 0x11, UInt8, Sequential),
    LdlocaS => ("ldloca.s", 0x00, 0x12, UInt8, Sequential),
    StlocS => ("stloc.s", 0x00, 0x13, UInt8, Sequential),
    Ldnull => ("ldnull", 0x00, 0x14, None, Sequential),
    LdcI4M1 => ("ldc.i4.m1", 0x00, 0x15, None, Sequential),
    LdcI40 => ("ldc.i4.0", 0x00, 0x16, None, Sequential),
    LdcI41 => ("ldc.i4.1", 0x00, 0x17, None, Sequential),
    LdcI42 => ("ldc.i4.2", 0x00, 0x18, None, Sequential),
    LdcI43 => ("ldc.i4.3", 0x00, 0x19, None, Sequential),
    LdcI44 => ("ldc.i4.4", 0x00, 0x1A, None, Sequential),
    LdcI45 => ("ldc.i4.5", 0x00, 0x1B, None, Sequential),
    LdcI46 => ("ldc.i4.6", 0x00, 0x1C, None, Sequential),
    LdcI47 => ("ldc.i4.7", 0x00, 0x1D, None, Sequential),
    LdcI48 => ("ldc.i4.8", 0x00, 0x1E, None, Sequential),
    LdcI4S => ("ldc.i4.s", 0x00, 0x1F, Int8, Sequential),
    LdcI4 => ("ldc.i4", 0x00, 0x20, Int32, Sequential),
    LdcI8 => ("ldc.i8", 0x00, 0x21, Int64, Sequential),
    LdcR4 => ("ldc.r4", 0x00, 0x22, Float32, Sequential),
    LdcR8 => ("ldc.r8", 0x00, 0x23, Float64, Sequential),
    Dup => ("dup", 0x00, 0x25, None, Sequential),
    Pop => ("pop", 0x00, 0x26, None, Sequential),
    Call => ("call", 0x00, 0x28, Token, Call),
    Ret => ("ret", 0x00, 0x2A, None, Return),
    BrS => ("br.s", 0x00, 0x2B, Int8, UnconditionalBranch),
    BrfalseS => ("brfalse.s", 0x00, 0x2C, Int8, ConditionalBranch),
    BrtrueS => ("brtrue.s", 0x00, 0x2D, Int8, ConditionalBranch),
    BeqS => ("beq.s", 0x00, 0x2E, Int8, ConditionalBranch),
    BgeS => ("bge.s", 0x00, 0x2F, Int8, ConditionalBranch),
    BgtS => ("bgt.s", 0x00, 0x30, Int8, ConditionalBranch),
    BleS => ("ble.s", 0x00, 0x31, Int8, ConditionalBranch),
    BltS => ("blt.s", 0x00, 0x32, Int8, ConditionalBranch),
    BneUnS => ("bne.un.s", 0x00, 0x33, Int8, ConditionalBranch),
    Br => ("br", 0x00, 0x38, Int32, UnconditionalBranch),
    Brfalse => ("brfalse", 0x00, 0x39, Int32, ConditionalBranch),
    Brtrue => ("brtrue", 0x00, 0x3A, Int32, ConditionalBranch),
    Beq => ("beq", 0x00, 0x3B, Int32, ConditionalBranch),
    Bge => ("bge", 0x00, 0x3C, Int32, ConditionalBranch),
    Bgt => ("bgt", 0x00, 0x3D, Int32, ConditionalBranch),
    Ble => ("ble", 0x00, 0x3E, Int32, ConditionalBranch),
    Blt => ("blt", 0x00, 0x3F, Int32, ConditionalBranch),
    BneUn => ("bne.un", 0x00, 0x40, Int32, ConditionalBranch),
    Switch => ("switch", 0x00, 0x45, Switch, Switch),
    Add => ("add", 0x00, 0x58, None, Sequential),
    Sub => ("sub", 0x00, 0x59, None, Sequential),
    Mul => ("mul", 0x00, 0x5A, None, Sequential),
    Div => ("div", 0x00, 0x5B, None, Sequential),
    Rem => ("rem", 0x00, 0x5D, None, Sequential),
    And => ("and", 0x00, 0x5F, None, Sequential),
    Or => ("or", 0x00, 0x60, None, Sequential),
    Xor => ("xor", 0x00, 0x61, None, Sequential),
    Neg => ("neg", 0x00, 0x65, None, Sequential),
    Not => ("not", 0x00, 0x66, None, Sequential),
    ConvI4 => ("conv.i4", 0x00, 0x69, None, Sequential),
    ConvR4 => ("conv.r4", 0x00, 0x6B, None, Sequential),
    ConvR8 => ("conv.r8", 0x00, 0x6C, None, Sequential),
    Callvirt => ("callvirt", 0x00, 0x6F, Token, Call),
    Ldstr => ("ldstr", 0x00, 0x72, Token, Sequential),
    Newobj => ("newobj", 0x00, 0x73, Token, Call),
    Castclass => ("castclass", 0x00, 0x74, Token, Sequential),
    Isinst => ("isinst", 0x00, 0x75, Token, Sequential),
    Throw => ("throw", 0x00, 0x7A, None, Throw),
    Ldfld => ("ldfld", 0x00, 0x7B, Token, Sequential),
    Ldflda => ("ldflda", 0x00, 0x7C, Token, Sequential),
    Stfld => ("stfld", 0x00, 0x7D, Token, Sequential),
    Ldsfld => ("ldsfld", 0x00, 0x7E, Token, Sequential),
    Ldsflda => ("ldsflda", 0x00, 0x7F, Token, Sequential),
    Stsfld => ("stsfld", 0x00, 0x80, Token, Sequential),
    Box => ("box", 0x00, 0x8C, Token, Sequential),
    Newarr => ("newarr", 0x00, 0x8D, Token, Sequential),
    Ldlen => ("ldlen", 0x00, 0x8E, None, Sequential),
    LdelemRef => ("ldelem.ref", 0x00, 0x9A, None, Sequential),
    StelemRef => ("stelem.ref", 0x00, 0xA2, None, Sequential),
    UnboxAny => ("unbox.any", 0x00, 0xA5, Token, Sequential),
    Ldtoken => ("ldtoken", 0x00, 0xD0, Token, Sequential),
    Leave => ("leave", 0x00, 0xDD, Int32, Leave),
    LeaveS => ("leave.s", 0x00, 0xDE, Int8, Leave),
    Ceq => ("ceq", 0xFE, 0x01, None, Sequential),
    Cgt => ("cgt", 0xFE, 0x02, None, Sequential),
    Clt => ("clt", 0xFE, 0x04, None, Sequential),
    Ldftn => ("ldftn", 0xFE, 0x06, Token, Sequential),
    Ldarg => ("ldarg", 0xFE, 0x09, UInt16, Sequential),
    Ldarga => ("ldarga", 0xFE, 0x0A, UInt16, Sequential),
    Starg => ("starg", 0xFE, 0x0B, UInt16, Sequential),
    Ldloc => ("ldloc", 0xFE, 0x0C, UInt16, Sequential),
    Ldloca => ("ldloca", 0xFE, 0x0D, UInt16, Sequential),
    Stloc => ("stloc", 0xFE, 0x0E, UInt16, Sequential),
}

impl OpCode {
    /// The textual mnemonic (`"ldstr"`, `"br.s"`, ...).
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        self.into()
    }

    /// Number of bytes the opcode itself occupies (1, or 2 with the `0xFE` prefix).
    #[must_use]
    pub const fn opcode_size(self) -> u64 {
        if self.prefix() == 0 {
            1
        } else {
            2
        }
    }

    /// Returns `true` for branch instructions carrying a single target.
    #[must_use]
    pub const fn is_branch(self) -> bool {
        matches!(
            self.flow_type(),
            FlowType::ConditionalBranch | FlowType::UnconditionalBranch | FlowType::Leave
        )
    }
}

/// A constant encoded in the instruction stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Immediate {
    /// `ldc.i4.s`
    Int8(i8),
    /// `unaligned.` and other byte-sized operands
    UInt8(u8),
    /// `ldc.i4`
    Int32(i32),
    /// `ldc.i8`
    Int64(i64),
    /// `ldc.r4`
    Float32(f32),
    /// `ldc.r8`
    Float64(f64),
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Immediate::Int8(value) => write!(f, "{value}"),
            Immediate::UInt8(value) => write!(f, "{value}"),
            Immediate::Int32(value) => write!(f, "{value}"),
            Immediate::Int64(value) => write!(f, "{value}"),
            Immediate::Float32(value) => write!(f, "{value}"),
            Immediate::Float64(value) => write!(f, "{value}"),
        }
    }
}

/// A decoded instruction operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operand present
    None,
    /// Immediate value (constant embedded in instruction)
    Immediate(Immediate),
    /// Branch target, as an absolute offset inside the body
    Target(u64),
    /// Metadata token reference (fields, methods, types, user strings)
    Token(Token),
    /// Local variable index
    Local(u16),
    /// Method argument index
    Argument(u16),
    /// Switch table, as absolute offsets inside the body
    Switch(Vec<u64>),
}

impl Operand {
    /// The token carried by this operand, if any.
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        match self {
            Operand::Token(token) => Some(*token),
            _ => None,
        }
    }

    /// Disassembly text of the operand, `None` for `Operand::None`.
    #[must_use]
    pub fn as_string(&self) -> Option<String> {
        match self {
            Operand::None => None,
            Operand::Immediate(imm) => Some(imm.to_string()),
            Operand::Target(t) => Some(format!("IL_{t:04x}")),
            Operand::Token(t) => Some(format!("0x{:08X}", t.value())),
            Operand::Local(l) => Some(format!("V_{l}")),
            Operand::Argument(a) => Some(format!("A_{a}")),
            Operand::Switch(targets) => Some(format!("switch({})", targets.len())),
        }
    }
}

/// A decoded CIL instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Offset of this instruction inside the method body
    pub offset: u64,
    /// Size of this instruction in bytes
    pub size: u64,
    /// The opcode
    pub opcode: OpCode,
    /// The operand data for this instruction
    pub operand: Operand,
}

impl Instruction {
    /// Creates an instruction at offset 0; the owning body assigns the final layout.
    #[must_use]
    pub fn new(opcode: OpCode, operand: Operand) -> Self {
        let mut instruction = Instruction {
            offset: 0,
            size: 0,
            opcode,
            operand,
        };
        instruction.size = instruction.encoded_size();
        instruction
    }

    /// An instruction without operand.
    #[must_use]
    pub fn simple(opcode: OpCode) -> Self {
        Self::new(opcode, Operand::None)
    }

    /// An instruction carrying a metadata token.
    #[must_use]
    pub fn with_token(opcode: OpCode, token: Token) -> Self {
        Self::new(opcode, Operand::Token(token))
    }

    /// The size this instruction occupies when encoded.
    #[must_use]
    pub fn encoded_size(&self) -> u64 {
        let operand = match (self.opcode.operand_type().size(), &self.operand) {
            (Some(size), _) => size as u64,
            (None, Operand::Switch(targets)) => 4 + 4 * targets.len() as u64,
            (None, _) => 4,
        };
        self.opcode.opcode_size() + operand
    }

    /// Returns `true` if this instruction is a branch instruction.
    #[must_use]
    pub fn is_branch(&self) -> bool {
        self.opcode.is_branch() || self.opcode == OpCode::Switch
    }

    /// The string of an `ldstr` operand token, for use with the user string heap.
    #[must_use]
    pub fn user_string_token(&self) -> Option<Token> {
        if self.opcode != OpCode::Ldstr {
            return None;
        }
        self.operand.token()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IL_{:04x}: {}", self.offset, self.opcode)?;
        if let Some(operand) = self.operand.as_string() {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use crate::metadata::token::TableId;

    #[test]
    fn test_mnemonic_roundtrip() {
        assert_eq!(OpCode::LdcI4S.mnemonic(), "ldc.i4.s");
        assert_eq!(OpCode::from_str("bne.un.s").ok(), Some(OpCode::BneUnS));
        assert_eq!(OpCode::from_str("ldstr").ok(), Some(OpCode::Ldstr));
        assert!(OpCode::from_str("ldstr.s").is_err());
        assert_eq!(format!("{}", OpCode::Ldarg0), "ldarg.0");
    }

    #[test]
    fn test_encoded_sizes() {
        assert_eq!(Instruction::simple(OpCode::Ret).size, 1);
        assert_eq!(
            Instruction::new(OpCode::LdcI4S, Operand::Immediate(Immediate::Int8(4))).size,
            2
        );
        assert_eq!(
            Instruction::with_token(OpCode::Ldfld, Token::from_parts(TableId::Field, 1)).size,
            5
        );
        assert_eq!(Instruction::new(OpCode::Ldarg, Operand::Argument(7)).size, 4);
        assert_eq!(
            Instruction::new(OpCode::Switch, Operand::Switch(vec![0, 4])).size,
            13
        );
    }

    #[test]
    fn test_flow_types() {
        assert!(OpCode::BrS.is_branch());
        assert!(OpCode::LeaveS.is_branch());
        assert!(!OpCode::Call.is_branch());
        assert_eq!(OpCode::Callvirt.flow_type(), FlowType::Call);
        assert_eq!(OpCode::Ret.flow_type(), FlowType::Return);
    }

    #[test]
    fn test_user_string_token() {
        let token = Token::from_parts(TableId::UserString, 1);
        assert_eq!(
            Instruction::with_token(OpCode::Ldstr, token).user_string_token(),
            Some(token)
        );
        assert_eq!(
            Instruction::with_token(OpCode::Ldfld, token).user_string_token(),
            None
        );
    }

    #[test]
    fn test_display() {
        let mut instruction = Instruction::new(OpCode::LdcI4S, Operand::Immediate(Immediate::Int8(-3)));
        instruction.offset = 0x12;
        assert_eq!(instruction.to_string(), "IL_0012: ldc.i4.s -3");

        let call = Instruction::with_token(OpCode::Call, Token::from_parts(TableId::MethodDef, 2));
        assert_eq!(call.to_string(), "IL_0000: call 0x06000002");
    }
}
