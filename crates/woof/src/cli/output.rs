//! Terminal rendering for command output

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, CellAlignment, Color, ContentArrangement, Table};
use woof::discovery::{Presence, ProducerReport, ReportCell, ReportRow};

const TICK: &str = "✓";
const CROSS: &str = "⨯";

/// Build a table with the house style and a cyan header
pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    let header_cells: Vec<Cell> = headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)).collect();
    table.set_header(header_cells);
    table
}

/// Print every producer's classification table.
pub fn print_report(reports: &[ProducerReport]) {
    for report in reports {
        println!(
            "{}: matched {} of {} samples:",
            report.title, report.matched, report.total
        );
        println!("{}", report_table(report));
        println!();
    }
}

pub fn report_table(report: &ProducerReport) -> Table {
    let mut headers = vec!["Sample name", "Set", "Matched"];
    headers.extend(report.columns.iter().map(String::as_str));
    let mut table = new_table(&headers);
    for row in &report.rows {
        table.add_row(row_cells(row));
    }
    table
}

fn row_cells(row: &ReportRow) -> Vec<Cell> {
    let name = if !row.leading {
        Cell::new("")
    } else if row.matched {
        Cell::new(&row.sample_name)
    } else {
        Cell::new(&row.sample_name).fg(Color::Red)
    };
    let matched = match (row.matched, row.leading) {
        (true, true) => symbol(TICK, Color::Green),
        (true, false) => Cell::new(""),
        (false, _) => symbol(CROSS, Color::Red),
    };

    let mut cells = vec![
        name,
        Cell::new(row.set).set_alignment(CellAlignment::Center),
        matched,
    ];
    cells.extend(row.cells.iter().map(|cell| presence_cell(cell, row.matched)));
    cells
}

fn presence_cell(cell: &ReportCell, matched_sample: bool) -> Cell {
    match (cell.present, cell.presence) {
        (false, _) => symbol(CROSS, Color::Red),
        (true, Presence::OneSide) if matched_sample => symbol(TICK, Color::Grey),
        (true, _) => symbol(TICK, Color::Green),
    }
}

fn symbol(text: &str, color: Color) -> Cell {
    Cell::new(text).fg(color).set_alignment(CellAlignment::Center)
}
