mod app;
mod commands;
mod output;
mod snapshot;

use clap::Parser;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .expect("failed to set Ctrl+C handler");

    let cli = Cli::parse();

    // dotrename info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("dotrename", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    match &cli.command {
        Command::Catalogs => commands::catalogs::run(&cli.global),
        Command::Types {
            path,
            namespace,
            members,
        } => commands::types::run(path, namespace.as_deref(), *members, &cli.global),
        Command::Apply {
            path,
            catalog,
            map,
            failures,
            options,
        } => commands::apply::run(
            path,
            &commands::apply::ApplyOptions {
                catalog,
                map: map.as_deref(),
                failures_only: *failures,
                config: commands::apply::rename_config(options),
                global: &cli.global,
            },
        ),
    }
}
