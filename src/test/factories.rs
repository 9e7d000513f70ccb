//! Synthetic modules used across unit tests.

use crate::{
    assembly::{Immediate, OpCode},
    metadata::{
        builder::{FieldBuilder, IlOperand, MethodBuilder, ModuleBuilder, TypeBuilder},
        module::Module,
    },
};

// Helper function to create a small game-like module
//
// Game.World: fields a (UInt64), b (List<Game.Player>), c (Game.Player[]);
// methods .ctor, d (public static bool), e (private, (_line: string, flag: bool)),
// f (public virtual, 26 byte body), g (returns global Vector3i); nested type a.
// Game.Player: public, no members. Game.c: derives from Game.Player.
pub fn sample_module() -> Module {
    ModuleBuilder::new("Assembly-CSharp")
        .add_type(
            TypeBuilder::new("Game", "World")
                .field(FieldBuilder::new("a", "System.UInt64"))
                .field(FieldBuilder::new(
                    "b",
                    "System.Collections.Generic.List<Game.Player>",
                ))
                .field(FieldBuilder::new("c", "Game.Player[]"))
                .method(
                    MethodBuilder::constructor()
                        .op(OpCode::Ldarg0)
                        .call("System.Object::.ctor")
                        .ret(),
                )
                .method(
                    MethodBuilder::new("d")
                        .public()
                        .static_()
                        .returns("System.Boolean")
                        .op(OpCode::LdcI41)
                        .ret(),
                )
                .method(
                    MethodBuilder::new("e")
                        .param("_line", "System.String")
                        .param("flag", "System.Boolean")
                        .ret(),
                )
                .method(MethodBuilder::new("f").public().virtual_().nops(25).ret())
                .method(MethodBuilder::new("g").public().returns("Vector3i").ret())
                .nested(TypeBuilder::new("", "a")),
        )
        .add_type(TypeBuilder::new("Game", "Player").public())
        .add_type(TypeBuilder::new("Game", "c").extends("Game.Player"))
        .build()
        .unwrap()
}

// Helper function to create a module with one method pushing the given literals
pub fn literal_module(literals: &[&str]) -> Module {
    let mut method = MethodBuilder::new("Names")
        .public()
        .returns("System.String[]")
        .instr(
            OpCode::LdcI4S,
            IlOperand::Immediate(Immediate::Int8(literals.len() as i8)),
        )
        .instr(OpCode::Newarr, IlOperand::Type("System.String".to_string()));
    for (index, literal) in literals.iter().enumerate() {
        method = method
            .op(OpCode::Dup)
            .instr(
                OpCode::LdcI4S,
                IlOperand::Immediate(Immediate::Int8(index as i8)),
            )
            .ldstr(*literal)
            .op(OpCode::StelemRef);
    }

    ModuleBuilder::new("Literals")
        .add_type(TypeBuilder::new("", "a").method(method.ret()))
        .build()
        .unwrap()
}
