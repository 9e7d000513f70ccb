use comfy_table::{presets, CellAlignment, ContentArrangement, Table};
use serde::Serialize;

use crate::app::GlobalOptions;

/// Print `data` as pretty JSON with `--json`, otherwise hand it to `display_fn`.
pub fn print_output<T: Serialize>(
    data: &T,
    opts: &GlobalOptions,
    display_fn: impl FnOnce(&T),
) -> anyhow::Result<()> {
    if opts.json {
        println!("{}", serde_json::to_string_pretty(data)?);
    } else {
        display_fn(data);
    }
    Ok(())
}

/// Column alignment.
#[derive(Clone, Copy)]
pub enum Align {
    Left,
    Right,
}

/// Borderless, whitespace-aligned table on top of `comfy-table`.
pub struct TabWriter {
    table: Table,
    indent: &'static str,
    rows: usize,
}

impl TabWriter {
    /// A table with `(header, alignment)` columns.
    pub fn new(columns: &[(&str, Align)]) -> Self {
        let mut table = Table::new();
        table
            .load_preset(presets::NOTHING)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(columns.iter().map(|(name, _)| *name));

        // Two spaces between columns, none at the edges.
        let last = columns.len().saturating_sub(1);
        for (index, (_, align)) in columns.iter().enumerate() {
            if let Some(column) = table.column_mut(index) {
                column.set_cell_alignment(match align {
                    Align::Left => CellAlignment::Left,
                    Align::Right => CellAlignment::Right,
                });
                column.set_padding((u16::from(index != 0), u16::from(index != last)));
            }
        }

        Self {
            table,
            indent: "",
            rows: 0,
        }
    }

    /// Prefix every printed line with `prefix`.
    pub fn indent(mut self, prefix: &'static str) -> Self {
        self.indent = prefix;
        self
    }

    /// Add a row, values in column order.
    pub fn row(&mut self, values: Vec<String>) {
        self.table.add_row(values);
        self.rows += 1;
    }

    /// Number of rows added so far.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Returns `true` if no row was added.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Print to stdout, skipping tables without rows.
    pub fn print(&self) {
        if self.is_empty() {
            return;
        }
        for line in self.table.to_string().lines() {
            println!("{}{}", self.indent, line.trim_end());
        }
    }
}
