//! Method bodies as laid-out instruction sequences.

use crate::{
    assembly::instruction::{Instruction, OpCode, Operand},
    Result,
};

/// The instruction stream of a method.
///
/// Instructions are kept in order with consecutive offsets; branch operands hold
/// absolute offsets of instructions in the same body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodBody {
    /// Decoded instructions, in layout order
    pub instructions: Vec<Instruction>,
}

impl MethodBody {
    /// Builds a body from opcode/operand pairs.
    ///
    /// Branch operands ([`Operand::Target`] and [`Operand::Switch`]) are given as
    /// *instruction indices* and translated into offsets once the layout is known. An
    /// index equal to the instruction count addresses the end of the body.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a branch index is out of range.
    pub fn assemble(code: Vec<(OpCode, Operand)>) -> Result<Self> {
        let mut instructions: Vec<Instruction> = code
            .into_iter()
            .map(|(opcode, operand)| Instruction::new(opcode, operand))
            .collect();

        let mut offsets = Vec::with_capacity(instructions.len() + 1);
        let mut offset = 0u64;
        for instruction in &mut instructions {
            instruction.offset = offset;
            offsets.push(offset);
            offset += instruction.size;
        }
        offsets.push(offset);

        let index_to_offset = |index: u64| -> Result<u64> {
            usize::try_from(index)
                .ok()
                .and_then(|index| offsets.get(index).copied())
                .ok_or_else(|| malformed_error!("Branch index {} is out of range", index))
        };

        for instruction in &mut instructions {
            match &mut instruction.operand {
                Operand::Target(target) => *target = index_to_offset(*target)?,
                Operand::Switch(targets) => {
                    for target in targets.iter_mut() {
                        *target = index_to_offset(*target)?;
                    }
                }
                _ => {}
            }
        }

        Ok(MethodBody { instructions })
    }

    /// Size of the encoded body in bytes.
    #[must_use]
    pub fn code_size(&self) -> u64 {
        self.instructions
            .last()
            .map_or(0, |last| last.offset + last.size)
    }

    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns `true` if the body has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Iterates the instructions in layout order.
    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }

    /// Recomputes sizes and offsets after opcodes changed, remapping branch targets.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a branch target is not an instruction boundary.
    pub(crate) fn relayout(&mut self) -> Result<()> {
        let old_offsets: Vec<u64> = self.instructions.iter().map(|i| i.offset).collect();
        let old_end = self.code_size();

        let mut new_offsets = Vec::with_capacity(self.instructions.len());
        let mut offset = 0u64;
        for instruction in &mut self.instructions {
            instruction.size = instruction.encoded_size();
            new_offsets.push(offset);
            offset += instruction.size;
        }
        let new_end = offset;

        let remap = |target: u64| -> Result<u64> {
            if target == old_end {
                return Ok(new_end);
            }
            old_offsets
                .binary_search(&target)
                .map(|index| new_offsets[index])
                .map_err(|_| {
                    malformed_error!("Branch target 0x{:x} is not an instruction boundary", target)
                })
        };

        for (index, instruction) in self.instructions.iter_mut().enumerate() {
            instruction.offset = new_offsets[index];
            match &mut instruction.operand {
                Operand::Target(target) => *target = remap(*target)?,
                Operand::Switch(targets) => {
                    for target in targets.iter_mut() {
                        *target = remap(*target)?;
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }
}

impl<'a> IntoIterator for &'a MethodBody {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::instruction::Immediate;

    #[test]
    fn test_assemble_layout() {
        let body = MethodBody::assemble(vec![
            (OpCode::Ldarg0, Operand::None),
            (OpCode::BrfalseS, Operand::Target(3)),
            (OpCode::LdcI4S, Operand::Immediate(Immediate::Int8(42))),
            (OpCode::Ret, Operand::None),
        ])
        .unwrap();

        let offsets: Vec<u64> = body.iter().map(|i| i.offset).collect();
        assert_eq!(offsets, vec![0, 1, 3, 5]);
        assert_eq!(body.code_size(), 6);
        assert_eq!(body.instructions[1].operand, Operand::Target(5));
    }

    #[test]
    fn test_assemble_rejects_bad_index() {
        let result = MethodBody::assemble(vec![
            (OpCode::Br, Operand::Target(7)),
            (OpCode::Ret, Operand::None),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_relayout_remaps_targets() {
        let mut body = MethodBody::assemble(vec![
            (OpCode::BrS, Operand::Target(2)),
            (OpCode::Nop, Operand::None),
            (OpCode::Ret, Operand::None),
        ])
        .unwrap();
        assert_eq!(body.instructions[0].operand, Operand::Target(3));

        body.instructions[0].opcode = OpCode::Br;
        body.relayout().unwrap();
        assert_eq!(body.instructions[2].offset, 6);
        assert_eq!(body.instructions[0].operand, Operand::Target(6));
    }
}
