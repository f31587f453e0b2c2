//! Terminal rendering of BOMs and optimization results

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};
use partpal_models::{Bom, Field};

use crate::service::{OptimizationReport, PassSummary};

/// One row per component, columns in canonical field order
pub fn bom_table(bom: &Bom) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new("#")];
    header.extend(Field::ALL.iter().map(|field| Cell::new(field.as_str())));
    table.set_header(header);

    for (idx, component) in bom.iter().enumerate() {
        let mut row = vec![Cell::new(idx + 1)];
        for field in Field::ALL {
            let value = component.get(field);
            let cell = match field {
                Field::Cost if !value.is_empty() && component.unit_cost().is_none() => {
                    Cell::new(value).fg(Color::Yellow)
                }
                Field::Cost | Field::Quantity => Cell::new(value).set_alignment(CellAlignment::Right),
                _ => Cell::new(value),
            };
            row.push(cell);
        }
        table.add_row(row);
    }

    table
}

/// Per-distributor outcome of a run
pub fn pass_table(passes: &[PassSummary]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Distributor", "Status", "Lookups", "Found", "Cheaper", "Failed", "Total after"]);

    for pass in passes {
        let status = if pass.skipped {
            Cell::new("skipped").fg(Color::Red)
        } else {
            Cell::new("ok").fg(Color::Green)
        };
        table.add_row(vec![
            Cell::new(&pass.distributor),
            status,
            Cell::new(pass.attempted),
            Cell::new(pass.succeeded),
            Cell::new(pass.improved),
            Cell::new(pass.failures.len()),
            Cell::new(format!("{:.2}", pass.total_after)).set_alignment(CellAlignment::Right),
        ]);
    }

    table
}

pub fn format_total(bom: &Bom) -> String {
    format!(
        "Total cost: {:.2} ({} of {} rows priced)",
        bom.total_cost(),
        bom.priced_rows(),
        bom.len()
    )
}

pub fn print_bom(bom: &Bom) {
    println!("{}", bom_table(bom));
    println!("{}", format_total(bom));
}

pub fn print_report(report: &OptimizationReport, starting_total: f64) {
    println!("{}", bom_table(&report.bom));
    println!("{}", pass_table(&report.passes));
    println!(
        "{} (was {:.2}, {} component(s) repriced)",
        format_total(&report.bom),
        starting_total,
        report.improved()
    );
}
