//! JSON module snapshots.
//!
//! A snapshot describes a module the way `ModuleBuilder` does: types and members by
//! name, signatures as type-name strings and bodies as one instruction per line:
//!
//! ```json
//! {
//!   "name": "Assembly-CSharp",
//!   "types": [{
//!     "namespace": "", "name": "a", "public": true, "extends": "b",
//!     "fields": [{ "name": "c", "type": "System.UInt64" }],
//!     "methods": [{
//!       "name": "d", "public": true, "virtual": true,
//!       "params": [{ "name": "_line", "type": "string" }],
//!       "returns": "string[]",
//!       "body": ["ldc.i4.1", "newarr System.String", "dup", "ldc.i4.0",
//!                "ldstr listplayers", "stelem.ref", "ret"]
//!     }]
//!   }]
//! }
//! ```
//!
//! Operands follow the mnemonic after one space. Member operands are `Type::member`,
//! `ldstr` takes the rest of the line verbatim, branches take instruction indices and
//! `switch` a comma-separated index list.

use std::{fs, path::Path};

use anyhow::{anyhow, bail, Context};
use dotrename::{
    assembly::{FlowType, Immediate, OpCode, OperandType},
    metadata::{
        builder::{FieldBuilder, IlOperand, MethodBuilder, ModuleBuilder, TypeBuilder},
        module::Module,
    },
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Snapshot {
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TypeEntry {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldEntry>,
    #[serde(default)]
    pub methods: Vec<MethodEntry>,
    #[serde(default)]
    pub nested: Vec<TypeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

#[derive(Debug, Deserialize)]
pub struct MethodEntry {
    pub name: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,
    #[serde(default)]
    pub params: Vec<ParamEntry>,
    #[serde(default)]
    pub returns: Option<String>,
    #[serde(default)]
    pub body: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ParamEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
}

/// Read and link the snapshot at `path`.
pub fn load_module(path: &Path) -> anyhow::Result<Module> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot: {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&text)
        .with_context(|| format!("invalid snapshot: {}", path.display()))?;
    build_module(&snapshot).with_context(|| format!("failed to link snapshot: {}", path.display()))
}

/// Link a parsed snapshot into a module.
pub fn build_module(snapshot: &Snapshot) -> anyhow::Result<Module> {
    let mut builder = ModuleBuilder::new(&snapshot.name);
    for entry in &snapshot.types {
        builder = builder.add_type(type_builder(entry)?);
    }
    Ok(builder.build()?)
}

fn type_builder(entry: &TypeEntry) -> anyhow::Result<TypeBuilder> {
    let mut builder = TypeBuilder::new(&entry.namespace, &entry.name);
    if entry.public {
        builder = builder.public();
    }
    if let Some(base) = &entry.extends {
        builder = builder.extends(base);
    }

    for field in &entry.fields {
        let mut field_builder = FieldBuilder::new(&field.name, &field.field_type);
        if field.public {
            field_builder = field_builder.public();
        }
        if field.is_static {
            field_builder = field_builder.static_();
        }
        builder = builder.field(field_builder);
    }

    for method in &entry.methods {
        builder = builder.method(
            method_builder(method).with_context(|| format!("in {}::{}", entry.name, method.name))?,
        );
    }

    for nested in &entry.nested {
        builder = builder.nested(type_builder(nested)?);
    }
    Ok(builder)
}

fn method_builder(entry: &MethodEntry) -> anyhow::Result<MethodBuilder> {
    let mut builder = if entry.name == ".ctor" {
        MethodBuilder::constructor()
    } else {
        MethodBuilder::new(&entry.name)
    };
    if entry.public {
        builder = builder.public();
    }
    if entry.is_static {
        builder = builder.static_();
    }
    if entry.is_virtual {
        builder = builder.virtual_();
    }
    for param in &entry.params {
        builder = builder.param(&param.name, &param.param_type);
    }
    if let Some(returns) = &entry.returns {
        builder = builder.returns(returns);
    }

    for (index, line) in entry.body.iter().flatten().enumerate() {
        let (opcode, operand) =
            parse_instruction(line).with_context(|| format!("instruction {index}: '{line}'"))?;
        builder = builder.instr(opcode, operand);
    }
    Ok(builder)
}

/// Parses `mnemonic [operand]`.
pub fn parse_instruction(line: &str) -> anyhow::Result<(OpCode, IlOperand)> {
    let line = line.trim_start();
    let (mnemonic, rest) = line.split_once(' ').unwrap_or((line, ""));
    let opcode: OpCode = mnemonic
        .parse()
        .map_err(|_| anyhow!("unknown opcode '{mnemonic}'"))?;

    if opcode == OpCode::Ldstr {
        return Ok((opcode, IlOperand::String(rest.to_string())));
    }

    let rest = rest.trim();
    let operand = match opcode.operand_type() {
        OperandType::None => {
            if !rest.is_empty() {
                bail!("{mnemonic} takes no operand");
            }
            IlOperand::None
        }
        _ if rest.is_empty() => bail!("{mnemonic} requires an operand"),
        OperandType::Switch => IlOperand::Switch(
            rest.split(',')
                .map(|target| target.trim().parse::<usize>())
                .collect::<Result<_, _>>()
                .context("switch targets must be instruction indices")?,
        ),
        _ if is_branch(opcode) => {
            IlOperand::Target(rest.parse().context("branch target must be an instruction index")?)
        }
        OperandType::Int8 => IlOperand::Immediate(Immediate::Int8(rest.parse()?)),
        OperandType::Int32 => IlOperand::Immediate(Immediate::Int32(rest.parse()?)),
        OperandType::Int64 => IlOperand::Immediate(Immediate::Int64(rest.parse()?)),
        OperandType::Float32 => IlOperand::Immediate(Immediate::Float32(rest.parse()?)),
        OperandType::Float64 => IlOperand::Immediate(Immediate::Float64(rest.parse()?)),
        OperandType::UInt8 | OperandType::UInt16 if is_argument(opcode) => {
            IlOperand::Argument(rest.parse()?)
        }
        OperandType::UInt8 | OperandType::UInt16 => IlOperand::Local(rest.parse()?),
        OperandType::Token => token_operand(opcode, rest),
    };
    Ok((opcode, operand))
}

fn is_branch(opcode: OpCode) -> bool {
    matches!(
        opcode.flow_type(),
        FlowType::ConditionalBranch | FlowType::UnconditionalBranch | FlowType::Leave
    )
}

fn is_argument(opcode: OpCode) -> bool {
    matches!(
        opcode,
        OpCode::LdargS
            | OpCode::LdargaS
            | OpCode::StargS
            | OpCode::Ldarg
            | OpCode::Ldarga
            | OpCode::Starg
    )
}

fn token_operand(opcode: OpCode, operand: &str) -> IlOperand {
    match opcode {
        OpCode::Ldfld
        | OpCode::Ldflda
        | OpCode::Stfld
        | OpCode::Ldsfld
        | OpCode::Ldsflda
        | OpCode::Stsfld => IlOperand::Field(operand.to_string()),
        OpCode::Call | OpCode::Callvirt | OpCode::Newobj | OpCode::Ldftn => {
            IlOperand::Method(operand.to_string())
        }
        _ => IlOperand::Type(operand.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operands() {
        assert_eq!(parse_instruction("ret").unwrap(), (OpCode::Ret, IlOperand::None));
        assert_eq!(
            parse_instruction("ldstr list players").unwrap(),
            (OpCode::Ldstr, IlOperand::String("list players".to_string()))
        );
        assert_eq!(
            parse_instruction("ldfld a::b").unwrap(),
            (OpCode::Ldfld, IlOperand::Field("a::b".to_string()))
        );
        assert_eq!(
            parse_instruction("br.s 4").unwrap(),
            (OpCode::BrS, IlOperand::Target(4))
        );
        assert_eq!(
            parse_instruction("ldc.i4.s 12").unwrap(),
            (OpCode::LdcI4S, IlOperand::Immediate(Immediate::Int8(12)))
        );
        assert_eq!(
            parse_instruction("ldloc.s 5").unwrap(),
            (OpCode::LdlocS, IlOperand::Local(5))
        );
        assert!(parse_instruction("frobnicate").is_err());
        assert!(parse_instruction("call").is_err());
    }

    #[test]
    fn test_build_snapshot() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{
                "name": "Test",
                "types": [{
                    "name": "a",
                    "public": true,
                    "fields": [{ "name": "b", "type": "int" }],
                    "methods": [{
                        "name": "c",
                        "public": true,
                        "returns": "int",
                        "body": ["ldarg.0", "ldfld a::b", "ret"]
                    }]
                }]
            }"#,
        )
        .unwrap();

        let module = build_module(&snapshot).unwrap();
        assert_eq!(module.name(), "Test");
        assert_eq!(module.types()[0].name, "a");
        assert_eq!(module.methods()[0].code_size(), 7);
    }
}
