//! CIL instruction model used by the instruction scanner.
//!
//! # Key Components
//!
//! - [`OpCode`] - The opcode table with mnemonics, operand encodings and flow types
//! - [`Instruction`] / [`Operand`] - Decoded instruction records
//! - [`MethodBody`] - A laid-out instruction stream with macro simplification
//!   ([`MethodBody::simplify_macros`]) and optimization ([`MethodBody::optimize_macros`])
//!
//! Bodies are built from opcode/operand pairs; there is no byte-level decoder.

mod body;
mod instruction;
mod macros;

pub use body::MethodBody;
pub use instruction::{FlowType, Immediate, Instruction, OpCode, Operand, OperandType};
pub use macros::is_macro;
