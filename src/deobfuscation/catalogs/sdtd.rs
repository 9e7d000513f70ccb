//! Catalog for the 7 Days to Die dedicated server.
//!
//! The obfuscator of `Assembly-CSharp` keeps the names of many game types but strips
//! most member names and a handful of type names. The steps below recover the members
//! server mods rely on, then walk from the telnet server to the console, from the
//! console to the console command base type and from there to every command class.
//! Command classes are named after the longest literal their `Names()` method returns.

use crate::{
    assembly::OpCode,
    deobfuscation::{
        action::{rename, Bind, MakePublic, OnType, ScanOperands, Sequence, TypeOf},
        catalogs::Catalog,
        diagnostics::DiagnosticCategory,
        predicate::{FieldMatcher, MethodMatcher, TypeMatcher},
        resolver::MatchResult,
        result::Outcome,
        rule::{step, Apply, FanOut, Guarded, Rule, Step, TypeSel},
        scanner,
        scope::Slot,
        session::RenameSession,
    },
    metadata::{method::MethodDef, module::ElementKind, token::Token, typesystem::TypeDef},
};

const CONSOLE: Slot<TypeDef> = Slot::new("ConsoleSdtd");
const CONSOLE_COMMAND: Slot<TypeDef> = Slot::new("ConsoleCommand");
const COMMAND: Slot<TypeDef> = Slot::new("Command");
const INVENTORY_FIELD: Slot<TypeDef> = Slot::new("InventoryField");

/// Rename catalog for `Assembly-CSharp` of the 7 Days to Die dedicated server.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdtdCatalog;

impl Catalog for SdtdCatalog {
    fn id(&self) -> String {
        "sdtd".to_string()
    }

    fn name(&self) -> String {
        "7 Days to Die dedicated server".to_string()
    }

    fn description(&self) -> String {
        "Assembly-CSharp members used by server mods, console and command classes".to_string()
    }

    fn steps(&self) -> Vec<Box<dyn Step>> {
        let mut steps = game_steps();
        steps.extend(console_steps());
        steps.extend(command_steps());
        steps
    }
}

fn method() -> MethodMatcher {
    MethodMatcher::new().not_constructor()
}

fn game_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(
            Rule::types("StaticDirectories")
                .matching(TypeMatcher::new().with_methods(
                    method()
                        .public()
                        .static_()
                        .param_count(0)
                        .returns("System.Boolean")
                        .named("CheckIfStartedAsDedicatedServer"),
                    1,
                ))
                .rename("StaticDirectories"),
        ),
        Box::new(
            Rule::methods("DamageSource")
                .within(TypeSel::from("EntityPlayer").base())
                .matching(method().public().param_count(3).named("DamageEntity"))
                .then(OnType::new(TypeOf::Param(0), rename("DamageSource"))),
        ),
        Box::new(
            Rule::methods("EntityPlayer.base.base.getPosition()")
                .within(TypeSel::from("EntityPlayer").base().base())
                .matching(method().public().param_count(0).named("GetPosition"))
                .then(ScanOperands::new(
                    &[OpCode::Ldfld],
                    ElementKind::Field,
                    rename("position"),
                )),
        ),
        Box::new(
            Rule::methods("Chunk.GetMapColors()")
                .within("Chunk")
                .matching(method().public().param_count(0).named("GetMapColors"))
                .then(ScanOperands::new(
                    &[OpCode::Call],
                    ElementKind::Method,
                    Sequence(vec![Box::new(rename("CalcMapColors")), Box::new(MakePublic)]),
                )),
        ),
        Box::new(
            Rule::methods("ConnectionManager.DisconnectClient()")
                .within("ConnectionManager")
                .matching(
                    method()
                        .public()
                        .param_count(2)
                        .param_type(0, "ClientInfo")
                        .param_type(1, "System.Boolean")
                        .returns("System.Void"),
                )
                .rename("DisconnectClient"),
        ),
        Box::new(
            Apply::to_type("ItemClassBlock.base", TypeSel::from("ItemClassBlock").base())
                .rename("ItemBase"),
        ),
        Box::new(
            Rule::fields("PersistentPlayerList.positionToLPBlockOwner")
                .within("PersistentPlayerList")
                .matching(
                    FieldMatcher::new()
                        .of_type("System.Collections.Generic.Dictionary")
                        .generic_args(["Vector3i", "PersistentPlayerData"]),
                )
                .make_public()
                .rename("positionToLPBlockOwner"),
        ),
        Box::new(
            Rule::fields("PlayerDataFile.inventory")
                .within("PlayerDataFile")
                .matching(FieldMatcher::new().named("inventory").array())
                .then(OnType::new(TypeOf::Field, rename("InventoryField")))
                .then(OnType::new(TypeOf::Field, Bind(INVENTORY_FIELD))),
        ),
        Box::new(
            Rule::fields("InventoryField.count")
                .within(INVENTORY_FIELD)
                .matching(FieldMatcher::new().of_type("System.Int32"))
                .rename("count"),
        ),
        Box::new(
            Rule::fields("InventoryField.itemValue")
                .within(INVENTORY_FIELD)
                .matching(FieldMatcher::new().of_type("ItemValue"))
                .rename("itemValue"),
        ),
        Box::new(
            Rule::fields("World.gameTime")
                .within("World")
                .matching(FieldMatcher::new().of_type("System.UInt64"))
                .make_public()
                .rename("gameTime"),
        ),
        Box::new(
            Rule::methods("World.LandClaimIsActive()")
                .within("World")
                .matching(
                    method()
                        .private()
                        .param_count(1)
                        .param_type(0, "PersistentPlayerData")
                        .returns("System.Boolean"),
                )
                .make_public()
                .rename("LandClaimIsActive"),
        ),
        Box::new(
            Rule::methods("World.LandClaimPower()")
                .within("World")
                .matching(
                    method()
                        .private()
                        .param_count(1)
                        .param_type(0, "PersistentPlayerData")
                        .returns("System.Single"),
                )
                .make_public()
                .rename("LandClaimPower"),
        ),
        Box::new(
            Rule::fields("ConnectionManager.connectedClients")
                .within("ConnectionManager")
                .matching(
                    FieldMatcher::new()
                        .of_type("DictionarySave")
                        .generic_args(["System.Int32", "ClientInfo"]),
                )
                .make_public()
                .rename("connectedClients"),
        ),
    ]
}

fn console_steps() -> Vec<Box<dyn Step>> {
    let console = Guarded::new("Console")
        .requires(CONSOLE)
        .step(Apply::to_slot("ConsoleSdtd", CONSOLE).rename("ConsoleSdtd"))
        .step(
            Rule::fields("NetTelnetServer.console")
                .within("NetTelnetServer")
                .matching(FieldMatcher::new().of_type(CONSOLE))
                .rename("console"),
        )
        .step(
            Rule::fields("ConsoleSdtd.telnetServer")
                .within(CONSOLE)
                .matching(FieldMatcher::new().of_type("NetTelnetServer"))
                .make_public()
                .rename("telnetServer"),
        )
        .step(
            Rule::methods("ConsoleSdtd.ExecuteCmdFromClient()")
                .within(CONSOLE)
                .matching(
                    method()
                        .public()
                        .param_count(4)
                        .param_type(0, "System.Int32")
                        .param_type(1, "System.String")
                        .param_type(2, "System.String")
                        .param_type(3, "System.String")
                        .returns("System.Void"),
                )
                .rename("ExecuteCmdFromClient"),
        )
        .step(
            Rule::methods("ConsoleSdtd.Run()")
                .within(CONSOLE)
                .matching(
                    method()
                        .public()
                        .virtual_()
                        .param_count(0)
                        .returns("System.Void")
                        .min_code_size(20),
                )
                .rename("Run"),
        )
        .step(
            Rule::methods("ConsoleSdtd.SendResult()")
                .within(CONSOLE)
                .matching(
                    method()
                        .public()
                        .param_count(1)
                        .param_type(0, "System.String")
                        .param_named(0, "_line")
                        .returns("System.Void"),
                )
                .rename("SendResult"),
        )
        .step(
            Rule::methods("ConsoleSdtd.ExecuteRemoteCmdInternal()")
                .within(CONSOLE)
                .matching(
                    method()
                        .private()
                        .param_count(2)
                        .param_type(0, "System.String")
                        .param_type(1, "System.Boolean")
                        .returns("System.Void"),
                )
                .make_public()
                .rename("ExecuteRemoteCmdInternal"),
        )
        .step(
            Rule::methods("ConsoleSdtd.getCommand()")
                .within(CONSOLE)
                .matching(
                    method()
                        .public()
                        .param_count(1)
                        .param_type(0, "System.String")
                        .param_named(0, "_command")
                        .returns_global_type(),
                )
                .then(OnType::new(TypeOf::Return, Bind(CONSOLE_COMMAND)))
                .rename("getCommand"),
        )
        .step(
            Rule::methods("ConsoleSdtd.AddCommand()")
                .within(CONSOLE)
                .matching(
                    method()
                        .public()
                        .param_count(1)
                        .param_type(0, CONSOLE_COMMAND)
                        .returns("System.Void"),
                )
                .rename("AddCommand"),
        )
        .step(
            Rule::fields("ConsoleSdtd.commands")
                .within(CONSOLE)
                .matching(
                    FieldMatcher::new()
                        .of_type("System.Collections.Generic.List")
                        .generic_args([CONSOLE_COMMAND]),
                )
                .make_public()
                .rename("commands"),
        );

    vec![
        Box::new(
            Rule::methods("NetTelnetServer.SetConsole()")
                .within("NetTelnetServer")
                .matching(
                    method()
                        .named("SetConsole")
                        .public()
                        .param_count(1)
                        .returns("System.Void"),
                )
                .then(OnType::new(TypeOf::Param(0), Bind(CONSOLE))),
        ),
        Box::new(console),
    ]
}

/// The members every console command declares, matched within `owner`.
fn command_members(prefix: &str, owner: Slot<TypeDef>) -> Vec<Box<dyn Step>> {
    let label = |name: &str| format!("{prefix}{name}()");
    vec![
        Box::new(
            Rule::methods(label("Help"))
                .within(owner)
                .matching(
                    method()
                        .public()
                        .param_count(1)
                        .param_type(0, CONSOLE)
                        .returns("System.Void"),
                )
                .rename("Help"),
        ),
        Box::new(
            Rule::methods(label("RepeatInterval"))
                .within(owner)
                .matching(method().public().param_count(0).returns("System.Int32"))
                .rename("RepeatInterval"),
        ),
        Box::new(
            Rule::methods(label("Names"))
                .within(owner)
                .matching(names_method())
                .rename("Names"),
        ),
        Box::new(
            Rule::methods(label("Run"))
                .within(owner)
                .matching(
                    method()
                        .public()
                        .param_count(1)
                        .param_type(0, "System.String[]")
                        .returns("System.Void"),
                )
                .rename("Run"),
        ),
        Box::new(
            Rule::methods(label("Description"))
                .within(owner)
                .matching(method().public().param_count(0).returns("System.String"))
                .rename("Description"),
        ),
    ]
}

fn names_method() -> MethodMatcher {
    method().public().param_count(0).returns("System.String[]")
}

/// Names the command class bound to [`COMMAND`] after the longest literal of its
/// `Names()` method.
fn name_command(session: &mut RenameSession<'_>, label: &str) -> Outcome {
    let Some(command) = session.slot(COMMAND) else {
        session.note_missing(label, &[COMMAND.name()]);
        return Outcome::Skipped;
    };

    let candidates: Vec<Token> = session.module().methods_of(command).map(|m| m.token).collect();
    let names = match session.find::<MethodDef>(candidates, &names_method()) {
        MatchResult::Unique(names) => names,
        MatchResult::Missing => {
            session.warn(
                DiagnosticCategory::Match,
                label,
                "No Names() method for command found",
            );
            return Outcome::NoMatch;
        }
        MatchResult::Ambiguous(tokens) => {
            session.error(
                DiagnosticCategory::Match,
                label,
                format!("{} Names() candidates for command", tokens.len()),
            );
            return Outcome::Ambiguous(tokens.len());
        }
    };

    let literal = match scanner::longest_string_literal(session, names) {
        Ok(Some(literal)) => literal,
        Ok(None) => {
            session.warn(DiagnosticCategory::Naming, label, "No name for command found");
            return Outcome::NoMatch;
        }
        Err(error) => {
            session.error(DiagnosticCategory::Action, label, error.to_string());
            return Outcome::ActionFailed;
        }
    };

    match session.rename(command, &format!("Command_{literal}")) {
        Ok(()) => Outcome::Applied,
        Err(error) => {
            session.error(DiagnosticCategory::Action, label, error.to_string());
            Outcome::ActionFailed
        }
    }
}

fn command_steps() -> Vec<Box<dyn Step>> {
    let commands = Guarded::new("Commands")
        .requires(CONSOLE_COMMAND)
        .step(Apply::to_slot("ConsoleCommand", CONSOLE_COMMAND).rename("ConsoleCommand"))
        .steps(command_members("ConsoleCommand.", CONSOLE_COMMAND))
        .step(
            FanOut::new("Command", CONSOLE_COMMAND, COMMAND)
                .step(step("Name", name_command))
                .steps(command_members("", COMMAND))
                .report_derived(),
        );

    vec![Box::new(commands)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_unique() {
        let steps = SdtdCatalog.steps();
        let mut labels: Vec<&str> = steps.iter().map(|s| s.label()).collect();
        assert_eq!(labels.first().copied(), Some("StaticDirectories"));
        assert_eq!(labels.last().copied(), Some("Commands"));

        let count = labels.len();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), count);
    }

    #[test]
    fn test_command_members_share_matchers() {
        let prefixed = command_members("ConsoleCommand.", CONSOLE_COMMAND);
        let plain = command_members("", COMMAND);
        assert_eq!(prefixed.len(), plain.len());
        assert_eq!(prefixed[0].label(), "ConsoleCommand.Help()");
        assert_eq!(plain[0].label(), "Help()");
    }
}
