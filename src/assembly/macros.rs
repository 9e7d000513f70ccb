//! Expansion and compaction of macro (short-form) opcodes.
//!
//! CIL encodes many instructions in several forms: `ldarg.0` and `ldarg.s 0` are both
//! shorthands for `ldarg 0`, `br.s` is a `br` with an 8-bit displacement. Scanning is
//! simpler on one canonical form, so [`MethodBody::simplify_macros`] rewrites a body
//! into explicit long forms and [`MethodBody::optimize_macros`] picks the most compact
//! encoding again afterwards.

use crate::{
    assembly::{
        body::MethodBody,
        instruction::{Immediate, OpCode, Operand},
    },
    Result,
};

/// Upper bound on branch shrinking rounds; each round can only enable further shrinking.
const MAX_SHRINK_ROUNDS: usize = 100;

/// Long form of a short branch, `None` for anything else.
fn long_branch(opcode: OpCode) -> Option<OpCode> {
    Some(match opcode {
        OpCode::BrS => OpCode::Br,
        OpCode::BrfalseS => OpCode::Brfalse,
        OpCode::BrtrueS => OpCode::Brtrue,
        OpCode::BeqS => OpCode::Beq,
        OpCode::BgeS => OpCode::Bge,
        OpCode::BgtS => OpCode::Bgt,
        OpCode::BleS => OpCode::Ble,
        OpCode::BltS => OpCode::Blt,
        OpCode::BneUnS => OpCode::BneUn,
        OpCode::LeaveS => OpCode::Leave,
        _ => return None,
    })
}

/// Short form of a long branch, `None` for anything else.
fn short_branch(opcode: OpCode) -> Option<OpCode> {
    Some(match opcode {
        OpCode::Br => OpCode::BrS,
        OpCode::Brfalse => OpCode::BrfalseS,
        OpCode::Brtrue => OpCode::BrtrueS,
        OpCode::Beq => OpCode::BeqS,
        OpCode::Bge => OpCode::BgeS,
        OpCode::Bgt => OpCode::BgtS,
        OpCode::Ble => OpCode::BleS,
        OpCode::Blt => OpCode::BltS,
        OpCode::BneUn => OpCode::BneUnS,
        OpCode::Leave => OpCode::LeaveS,
        _ => return None,
    })
}

fn int_value(operand: &Operand) -> i32 {
    match operand {
        Operand::Immediate(Immediate::Int8(value)) => i32::from(*value),
        Operand::Immediate(Immediate::UInt8(value)) => i32::from(*value),
        Operand::Immediate(Immediate::Int32(value)) => *value,
        _ => 0,
    }
}

/// The explicit form of a macro instruction.
fn expand(opcode: OpCode, operand: &Operand) -> Option<(OpCode, Operand)> {
    let expanded = match opcode {
        OpCode::Ldarg0 => (OpCode::Ldarg, Operand::Argument(0)),
        OpCode::Ldarg1 => (OpCode::Ldarg, Operand::Argument(1)),
        OpCode::Ldarg2 => (OpCode::Ldarg, Operand::Argument(2)),
        OpCode::Ldarg3 => (OpCode::Ldarg, Operand::Argument(3)),
        OpCode::Ldloc0 => (OpCode::Ldloc, Operand::Local(0)),
        OpCode::Ldloc1 => (OpCode::Ldloc, Operand::Local(1)),
        OpCode::Ldloc2 => (OpCode::Ldloc, Operand::Local(2)),
        OpCode::Ldloc3 => (OpCode::Ldloc, Operand::Local(3)),
        OpCode::Stloc0 => (OpCode::Stloc, Operand::Local(0)),
        OpCode::Stloc1 => (OpCode::Stloc, Operand::Local(1)),
        OpCode::Stloc2 => (OpCode::Stloc, Operand::Local(2)),
        OpCode::Stloc3 => (OpCode::Stloc, Operand::Local(3)),
        OpCode::LdargS => (OpCode::Ldarg, operand.clone()),
        OpCode::LdargaS => (OpCode::Ldarga, operand.clone()),
        OpCode::StargS => (OpCode::Starg, operand.clone()),
        OpCode::LdlocS => (OpCode::Ldloc, operand.clone()),
        OpCode::LdlocaS => (OpCode::Ldloca, operand.clone()),
        OpCode::StlocS => (OpCode::Stloc, operand.clone()),
        OpCode::LdcI4M1 => (OpCode::LdcI4, Operand::Immediate(Immediate::Int32(-1))),
        OpCode::LdcI40 => (OpCode::LdcI4, Operand::Immediate(Immediate::Int32(0))),
        OpCode::LdcI41 => (OpCode::LdcI4, Operand::Immediate(Immediate::Int32(1))),
        OpCode::LdcI42 => (OpCode::LdcI4, Operand::Immediate(Immediate::Int32(2))),
        OpCode::LdcI43 => (OpCode::LdcI4, Operand::Immediate(Immediate::Int32(3))),
        OpCode::LdcI44 => (OpCode::LdcI4, Operand::Immediate(Immediate::Int32(4))),
        OpCode::LdcI45 => (OpCode::LdcI4, Operand::Immediate(Immediate::Int32(5))),
        OpCode::LdcI46 => (OpCode::LdcI4, Operand::Immediate(Immediate::Int32(6))),
        OpCode::LdcI47 => (OpCode::LdcI4, Operand::Immediate(Immediate::Int32(7))),
        OpCode::LdcI48 => (OpCode::LdcI4, Operand::Immediate(Immediate::Int32(8))),
        OpCode::LdcI4S => (
            OpCode::LdcI4,
            Operand::Immediate(Immediate::Int32(int_value(operand))),
        ),
        other => (long_branch(other)?, operand.clone()),
    };
    Some(expanded)
}

/// The most compact non-branch form of an explicit instruction.
fn compact(opcode: OpCode, operand: &Operand) -> Option<(OpCode, Operand)> {
    let compacted = match (opcode, operand) {
        (OpCode::Ldarg, Operand::Argument(index)) => match index {
            0 => (OpCode::Ldarg0, Operand::None),
            1 => (OpCode::Ldarg1, Operand::None),
            2 => (OpCode::Ldarg2, Operand::None),
            3 => (OpCode::Ldarg3, Operand::None),
            i if *i <= 255 => (OpCode::LdargS, operand.clone()),
            _ => return None,
        },
        (OpCode::Ldloc, Operand::Local(index)) => match index {
            0 => (OpCode::Ldloc0, Operand::None),
            1 => (OpCode::Ldloc1, Operand::None),
            2 => (OpCode::Ldloc2, Operand::None),
            3 => (OpCode::Ldloc3, Operand::None),
            i if *i <= 255 => (OpCode::LdlocS, operand.clone()),
            _ => return None,
        },
        (OpCode::Stloc, Operand::Local(index)) => match index {
            0 => (OpCode::Stloc0, Operand::None),
            1 => (OpCode::Stloc1, Operand::None),
            2 => (OpCode::Stloc2, Operand::None),
            3 => (OpCode::Stloc3, Operand::None),
            i if *i <= 255 => (OpCode::StlocS, operand.clone()),
            _ => return None,
        },
        (OpCode::Ldarga, Operand::Argument(i)) if *i <= 255 => (OpCode::LdargaS, operand.clone()),
        (OpCode::Starg, Operand::Argument(i)) if *i <= 255 => (OpCode::StargS, operand.clone()),
        (OpCode::Ldloca, Operand::Local(i)) if *i <= 255 => (OpCode::LdlocaS, operand.clone()),
        (OpCode::LdcI4, Operand::Immediate(Immediate::Int32(value))) => match value {
            -1 => (OpCode::LdcI4M1, Operand::None),
            0 => (OpCode::LdcI40, Operand::None),
            1 => (OpCode::LdcI41, Operand::None),
            2 => (OpCode::LdcI42, Operand::None),
            3 => (OpCode::LdcI43, Operand::None),
            4 => (OpCode::LdcI44, Operand::None),
            5 => (OpCode::LdcI45, Operand::None),
            6 => (OpCode::LdcI46, Operand::None),
            7 => (OpCode::LdcI47, Operand::None),
            8 => (OpCode::LdcI48, Operand::None),
            #[allow(clippy::cast_possible_truncation)]
            v if (-128..=127).contains(v) => (
                OpCode::LdcI4S,
                Operand::Immediate(Immediate::Int8(*v as i8)),
            ),
            _ => return None,
        },
        _ => return None,
    };
    Some(compacted)
}

/// Returns `true` if `opcode` is a macro form that [`MethodBody::simplify_macros`] expands.
#[must_use]
pub fn is_macro(opcode: OpCode) -> bool {
    expand(opcode, &Operand::None).is_some()
}

impl MethodBody {
    /// Rewrites every macro instruction into its explicit long form.
    ///
    /// After this call no instruction of the body satisfies [`is_macro`]; offsets and
    /// branch targets are recomputed.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a branch target is not an instruction boundary.
    pub fn simplify_macros(&mut self) -> Result<()> {
        let mut changed = false;
        for instruction in &mut self.instructions {
            if let Some((opcode, operand)) = expand(instruction.opcode, &instruction.operand) {
                instruction.opcode = opcode;
                instruction.operand = operand;
                changed = true;
            }
        }

        if changed {
            self.relayout()?;
        }
        Ok(())
    }

    /// Re-encodes the body with the most compact forms.
    ///
    /// Non-branch instructions are compacted first, then long branches are shrunk
    /// repeatedly while their displacement fits a signed byte.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a branch target is not an instruction boundary.
    pub fn optimize_macros(&mut self) -> Result<()> {
        for instruction in &mut self.instructions {
            if let Some((opcode, operand)) = compact(instruction.opcode, &instruction.operand) {
                instruction.opcode = opcode;
                instruction.operand = operand;
            }
        }
        self.relayout()?;

        for _ in 0..MAX_SHRINK_ROUNDS {
            let mut shrunk = false;
            for instruction in &mut self.instructions {
                let Some(short) = short_branch(instruction.opcode) else {
                    continue;
                };
                let Operand::Target(target) = instruction.operand else {
                    continue;
                };

                // Displacement measured from the end of the 2-byte short form, on the
                // current (still long) layout.
                #[allow(clippy::cast_possible_wrap)]
                let displacement = target as i64 - (instruction.offset as i64 + 2);
                if (-128..=127).contains(&displacement) {
                    instruction.opcode = short;
                    shrunk = true;
                }
            }

            if !shrunk {
                break;
            }
            self.relayout()?;
        }

        Ok(())
    }

    /// Returns `true` if no instruction is in a macro form.
    #[must_use]
    pub fn is_macro_free(&self) -> bool {
        self.instructions.iter().all(|i| !is_macro(i.opcode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::token::{TableId, Token};

    fn sample() -> MethodBody {
        MethodBody::assemble(vec![
            (OpCode::Ldarg0, Operand::None),
            (
                OpCode::Ldfld,
                Operand::Token(Token::from_parts(TableId::Field, 1)),
            ),
            (OpCode::BrfalseS, Operand::Target(4)),
            (OpCode::LdcI4S, Operand::Immediate(Immediate::Int8(-5))),
            (OpCode::Ret, Operand::None),
        ])
        .unwrap()
    }

    #[test]
    fn test_simplify_expands_all_macros() {
        let mut body = sample();
        assert!(!body.is_macro_free());

        body.simplify_macros().unwrap();
        assert!(body.is_macro_free());

        let opcodes: Vec<OpCode> = body.iter().map(|i| i.opcode).collect();
        assert_eq!(
            opcodes,
            vec![
                OpCode::Ldarg,
                OpCode::Ldfld,
                OpCode::Brfalse,
                OpCode::LdcI4,
                OpCode::Ret
            ]
        );
        assert_eq!(body.instructions[0].operand, Operand::Argument(0));
        assert_eq!(
            body.instructions[3].operand,
            Operand::Immediate(Immediate::Int32(-5))
        );
        // ldarg(4) + ldfld(5) + brfalse(5) + ldc.i4(5) = 19
        assert_eq!(body.instructions[4].offset, 19);
        assert_eq!(body.instructions[2].operand, Operand::Target(19));
    }

    #[test]
    fn test_optimize_restores_compact_form() {
        let original = sample();
        let mut body = original.clone();
        body.simplify_macros().unwrap();
        body.optimize_macros().unwrap();
        assert_eq!(body, original);
    }

    #[test]
    fn test_far_branch_stays_long() {
        let mut code = vec![(OpCode::Br, Operand::Target(41))];
        for _ in 0..40 {
            code.push((
                OpCode::Ldsfld,
                Operand::Token(Token::from_parts(TableId::Field, 1)),
            ));
        }
        code.push((OpCode::Ret, Operand::None));

        let mut body = MethodBody::assemble(code).unwrap();
        body.optimize_macros().unwrap();
        assert_eq!(body.instructions[0].opcode, OpCode::Br);
        assert_eq!(body.instructions[0].operand, Operand::Target(205));
    }

    #[test]
    fn test_is_macro() {
        assert!(is_macro(OpCode::Ldarg0));
        assert!(is_macro(OpCode::BrS));
        assert!(!is_macro(OpCode::Ldarg));
        assert!(!is_macro(OpCode::Ldstr));
    }
}
