use std::path::Path;

use anyhow::{anyhow, Context};
use dotrename::{
    deobfuscation::{CatalogRegistry, RenameConfig, RenameEngine, RunResult},
    metadata::{module::Module, module::ElementKind},
};
use serde::Serialize;

use crate::{
    app::{GlobalOptions, RenameOptions},
    output::{print_output, Align, TabWriter},
    snapshot::load_module,
};

pub struct ApplyOptions<'a> {
    pub catalog: &'a str,
    pub map: Option<&'a Path>,
    pub failures_only: bool,
    pub config: RenameConfig,
    pub global: &'a GlobalOptions,
}

#[derive(Debug, Serialize)]
struct StepEntry {
    label: String,
    outcome: String,
}

#[derive(Debug, Serialize)]
struct RenameEntry {
    token: String,
    kind: String,
    scope: String,
    original: String,
    assigned: String,
}

#[derive(Debug, Serialize)]
struct PublicEntry {
    token: String,
    kind: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct DiagnosticEntry {
    severity: String,
    category: String,
    label: String,
    message: String,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct RenameMap {
    module: String,
    catalog: String,
    renames: Vec<RenameEntry>,
    publicized: Vec<PublicEntry>,
}

#[derive(Debug, Serialize)]
struct ApplyReport {
    #[serde(flatten)]
    map: RenameMap,
    steps: Vec<StepEntry>,
    diagnostics: Vec<DiagnosticEntry>,
    summary: String,
}

/// Maps the command line switches onto a `RenameConfig`.
pub fn rename_config(options: &RenameOptions) -> RenameConfig {
    let mut config = if options.lenient {
        RenameConfig::lenient()
    } else {
        RenameConfig::default()
    };
    if options.keep_expanded {
        config = config.with_restore_macros(false);
    }
    if options.no_collision_checks {
        config = config.with_collision_checks(false);
    }
    if options.allow_reassign {
        config = config.with_reassign(true);
    }
    if options.no_relationships {
        config = config.with_relationships(false);
    }
    config
}

pub fn run(path: &Path, opts: &ApplyOptions) -> anyhow::Result<()> {
    let registry = CatalogRegistry::new();
    let catalog = registry.get(opts.catalog).ok_or_else(|| {
        anyhow!(
            "unknown catalog '{}' (available: {})",
            opts.catalog,
            registry.ids().join(", ")
        )
    })?;

    let mut module = load_module(path)?;
    let engine = RenameEngine::new(opts.config.clone());
    let result = engine.run(&mut module, &**catalog);

    let map = rename_map(&module, &result);
    if let Some(map_file) = opts.map {
        let json = serde_json::to_string_pretty(&map)?;
        std::fs::write(map_file, json)
            .with_context(|| format!("failed to write rename map: {}", map_file.display()))?;
        if !opts.global.json {
            eprintln!("Rename map written to {}", map_file.display());
        }
    }

    let report = ApplyReport {
        map,
        steps: result
            .report
            .steps
            .iter()
            .filter(|step| !opts.failures_only || !step.outcome.is_success())
            .map(|step| StepEntry {
                label: step.label.clone(),
                outcome: step.outcome.to_string(),
            })
            .collect(),
        diagnostics: result
            .diagnostics
            .iter()
            .map(|d| DiagnosticEntry {
                severity: d.severity.to_string(),
                category: d.category.to_string(),
                label: d.label.clone(),
                message: d.message.clone(),
                token: d.token.map(|t| t.to_string()),
            })
            .collect(),
        summary: result.summary(),
    };

    print_output(&report, opts.global, |report| {
        let mut steps = TabWriter::new(&[("Outcome", Align::Left), ("Step", Align::Left)]);
        for step in &report.steps {
            steps.row(vec![step.outcome.clone(), step.label.clone()]);
        }
        steps.print();

        let mut renames = TabWriter::new(&[
            ("Token", Align::Left),
            ("Kind", Align::Left),
            ("Scope", Align::Left),
            ("Original", Align::Left),
            ("Assigned", Align::Left),
        ])
        .indent("  ");
        for rename in &report.map.renames {
            renames.row(vec![
                rename.token.clone(),
                rename.kind.clone(),
                rename.scope.clone(),
                rename.original.clone(),
                rename.assigned.clone(),
            ]);
        }
        if !renames.is_empty() {
            println!("\nRenames ({}):", renames.len());
            renames.print();
        }

        println!("\n{}", report.summary);
    })
}

fn rename_map(module: &Module, result: &RunResult) -> RenameMap {
    RenameMap {
        module: module.name().to_string(),
        catalog: result.report.catalog.clone(),
        renames: result
            .tracker
            .records()
            .iter()
            .map(|record| RenameEntry {
                token: record.token.to_string(),
                kind: record.kind.to_string(),
                scope: record.scope.clone(),
                original: record.original.clone(),
                assigned: record.assigned.clone(),
            })
            .collect(),
        publicized: result
            .tracker
            .publicized()
            .iter()
            .map(|token| PublicEntry {
                token: token.to_string(),
                kind: ElementKind::from_token(*token)
                    .map(|kind| kind.to_string())
                    .unwrap_or_default(),
                name: module.name_of(*token).unwrap_or_default().to_string(),
            })
            .collect(),
    }
}
