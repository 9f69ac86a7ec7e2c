use std::path::Path;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use geochem_cli::pipeline::{ConvertOutcome, ExtractOutcome, MaxDownholeOutcome};
use geochem_ingest::LoadStats;

pub fn print_convert_summary(outcome: &ConvertOutcome) {
    let mut table = stats_table(&outcome.stats);
    table.add_row(vec![label_cell("Samples"), Cell::new(outcome.samples)]);
    table.add_row(vec![label_cell("Elements"), Cell::new(outcome.elements)]);
    println!("{table}");
    print_output(&outcome.wide_data);
    if let Some(path) = &outcome.wide_methods {
        print_output(path);
    }
}

pub fn print_extract_summary(outcome: &ExtractOutcome) {
    println!("{}", stats_table(&outcome.stats));
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Element"),
        header_cell("Rows"),
        header_cell("File"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for file in &outcome.files {
        let rows = if file.rows == 0 {
            Cell::new(0).fg(Color::Yellow).add_attribute(Attribute::Bold)
        } else {
            Cell::new(file.rows)
        };
        table.add_row(vec![
            Cell::new(&file.element).fg(Color::Green),
            rows,
            Cell::new(file.path.display()),
        ]);
    }
    println!("{table}");
}

pub fn print_max_summary(outcome: &MaxDownholeOutcome) {
    let mut table = stats_table(&outcome.stats);
    table.add_row(vec![label_cell("Drillholes"), Cell::new(outcome.drillholes)]);
    table.add_row(vec![label_cell("Maxima"), Cell::new(outcome.rows)]);
    let reference = match outcome.reference {
        Some(value) => Cell::new(format!("{value} ppm")),
        None => dim_cell("-"),
    };
    table.add_row(vec![label_cell("Crustal abundance"), reference]);
    println!("{table}");
    print_output(&outcome.path);
}

/// One value per line, for piping.
pub fn print_values(values: &[String]) {
    for value in values {
        println!("{value}");
    }
}

fn stats_table(stats: &LoadStats) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Stage"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![label_cell("Rows read"), Cell::new(stats.rows_read)]);
    table.add_row(vec![label_cell("Rows kept"), Cell::new(stats.rows_kept)]);
    if stats.rows_skipped > 0 {
        table.add_row(vec![
            label_cell("Rows skipped"),
            Cell::new(stats.rows_skipped).fg(Color::Yellow),
        ]);
    }
    table
}

fn print_output(path: &Path) {
    println!("Output: {}", path.display());
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn label_cell(label: &str) -> Cell {
    Cell::new(label).fg(Color::Cyan)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
