use dotrename::deobfuscation::{Catalog, CatalogRegistry};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    output::{print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
struct CatalogEntry {
    id: String,
    name: String,
    steps: usize,
    description: String,
}

pub fn run(opts: &GlobalOptions) -> anyhow::Result<()> {
    let registry = CatalogRegistry::new();
    let catalogs: Vec<CatalogEntry> = registry
        .iter()
        .map(|catalog| CatalogEntry {
            id: catalog.id(),
            name: catalog.name(),
            steps: catalog.steps().len(),
            description: catalog.description(),
        })
        .collect();

    print_output(&catalogs, opts, |catalogs| {
        let mut tw = TabWriter::new(&[
            ("Id", Align::Left),
            ("Steps", Align::Right),
            ("Name", Align::Left),
        ]);
        for catalog in catalogs {
            tw.row(vec![
                catalog.id.clone(),
                catalog.steps.to_string(),
                catalog.name.clone(),
            ]);
        }
        tw.print();
    })
}
