//! Terminal rendering of summaries and evidence.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use framecheck::{CheckOutcome, ConstraintSet, CustomVerification, EvidenceTable, Summary};

/// Evidence rows shown on screen before truncating.
const EVIDENCE_PREVIEW_ROWS: usize = 20;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn outcome_cell(outcome: Option<CheckOutcome>) -> Cell {
    match outcome {
        Some(CheckOutcome::Breaks(0)) => Cell::new(0).fg(Color::Green),
        Some(CheckOutcome::Breaks(n)) => Cell::new(n).fg(Color::Red).add_attribute(Attribute::Bold),
        Some(CheckOutcome::NotApplicable) => Cell::new("N/A").fg(Color::DarkGrey),
        None => Cell::new(""),
    }
    .set_alignment(CellAlignment::Right)
}

/// Columns-by-checks table of break counts.
pub fn summary_table(summary: &Summary) -> Table {
    let kinds = summary.kinds();
    let mut table = new_table();

    let mut header = vec![header_cell("Column")];
    header.extend(kinds.iter().map(|k| header_cell(k.name())));
    table.set_header(header);

    for (column, outcomes) in summary.columns() {
        let mut row = vec![Cell::new(column).fg(Color::Cyan)];
        row.extend(kinds.iter().map(|k| outcome_cell(outcomes.get(k).copied())));
        table.add_row(row);
    }
    table
}

/// Columns-by-checks table of constraint values.
pub fn constraints_table(constraints: &ConstraintSet) -> Table {
    let kinds = constraints.kinds();
    let mut table = new_table();

    let mut header = vec![header_cell("attribute")];
    header.extend(kinds.iter().map(|k| header_cell(k.name())));
    table.set_header(header);

    for (column, record) in constraints.iter() {
        let mut row = vec![Cell::new(column).fg(Color::Cyan)];
        row.extend(
            kinds
                .iter()
                .map(|k| Cell::new(record.get(*k).map(|c| c.to_cell()).unwrap_or_default())),
        );
        table.add_row(row);
    }
    table
}

/// Rule-by-rule break counts of a custom run.
pub fn custom_summary_table(result: &CustomVerification) -> Table {
    let mut table = new_table();
    table.set_header(vec![header_cell("Rule"), header_cell("Query"), header_cell("Breaks")]);

    for entry in &result.summary {
        let count = if entry.count == 0 {
            Cell::new(0).fg(Color::Green)
        } else {
            Cell::new(entry.count).fg(Color::Red).add_attribute(Attribute::Bold)
        };
        table.add_row(vec![
            Cell::new(&entry.name).fg(Color::Cyan),
            Cell::new(&entry.rule),
            count.set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// The first failing rows, with the check that flagged them.
pub fn evidence_table(evidence: &EvidenceTable) -> Table {
    let mut table = new_table();

    let mut header = vec![header_cell("Check"), header_cell("Row")];
    header.extend(evidence.columns().iter().map(|c| header_cell(c)));
    table.set_header(header);

    for row in evidence.rows().iter().take(EVIDENCE_PREVIEW_ROWS) {
        let mut cells = vec![
            Cell::new(&row.label).fg(Color::Yellow),
            Cell::new(row.row).set_alignment(CellAlignment::Right),
        ];
        cells.extend(row.values.iter().map(Cell::new));
        table.add_row(cells);
    }
    table
}

/// Number of evidence rows left out of [`evidence_table`].
pub fn hidden_evidence_rows(evidence: &EvidenceTable) -> usize {
    evidence.len().saturating_sub(EVIDENCE_PREVIEW_ROWS)
}
