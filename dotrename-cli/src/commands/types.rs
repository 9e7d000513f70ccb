use std::path::Path;

use serde::Serialize;

use crate::{
    app::GlobalOptions,
    output::{print_output, Align, TabWriter},
    snapshot::load_module,
};

#[derive(Debug, Serialize)]
struct TypeEntry {
    token: String,
    visibility: &'static str,
    name: String,
    base: Option<String>,
    methods: usize,
    fields: usize,
}

#[derive(Debug, Serialize)]
struct TypesOutput {
    module: String,
    types: Vec<TypeEntry>,
    count: usize,
}

pub fn run(
    path: &Path,
    namespace: Option<&str>,
    members: bool,
    opts: &GlobalOptions,
) -> anyhow::Result<()> {
    let module = load_module(path)?;

    let mut types = Vec::new();
    for type_def in module.types() {
        if namespace.is_some_and(|ns| type_def.is_nested() || type_def.namespace != ns) {
            continue;
        }

        types.push(TypeEntry {
            token: type_def.token.to_string(),
            visibility: if type_def.is_public() { "public" } else { "internal" },
            name: module.type_full_name(type_def.token).unwrap_or_default(),
            base: type_def
                .base
                .as_ref()
                .and_then(|base| module.type_name(base)),
            methods: type_def.methods.len(),
            fields: type_def.fields.len(),
        });
    }

    let output = TypesOutput {
        module: module.name().to_string(),
        count: types.len(),
        types,
    };

    print_output(&output, opts, |out| {
        let mut columns = vec![
            ("Token", Align::Left),
            ("Vis", Align::Left),
            ("Name", Align::Left),
            ("Base", Align::Left),
        ];
        if members {
            columns.push(("Methods", Align::Right));
            columns.push(("Fields", Align::Right));
        }

        let mut tw = TabWriter::new(&columns);
        for entry in &out.types {
            let mut row = vec![
                entry.token.clone(),
                entry.visibility.to_string(),
                entry.name.clone(),
                entry.base.clone().unwrap_or_default(),
            ];
            if members {
                row.push(entry.methods.to_string());
                row.push(entry.fields.to_string());
            }
            tw.row(row);
        }
        tw.print();
        println!("\n{} type(s) listed in {}.", out.count, out.module);
    })
}
