use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use stockout_coefficients::{CheckStatus, CrossMarketBuild};
use stockout_cli::types::{MarketRun, RunOutcome};
use stockout_ingest::MarketProfile;
use stockout_report::FailedMarket;

pub fn print_summary(outcome: &RunOutcome) {
    match &outcome.cross_market_dir {
        Some(_) => println!("Output: {}", outcome.output_dir.display()),
        None => println!("Output: dry run, nothing written"),
    }
    print_market_table(&outcome.markets, &outcome.failed);
    print_coverage_table(&outcome.cross_market);
    print_failures(&outcome.failed);
}

fn print_market_table(runs: &[MarketRun], failed: &[FailedMarket]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Market"),
        header_cell("Drugs"),
        header_cell("Events"),
        header_cell("DiD"),
        header_cell("Pairs"),
        header_cell("Errors"),
        header_cell("Warnings"),
        header_cell("Status"),
        header_cell("Time (ms)"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..=6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 7, CellAlignment::Center);
    align_column(&mut table, 8, CellAlignment::Right);

    let mut total_events = 0usize;
    let mut total_did = 0usize;
    let mut total_pairs = 0usize;
    let mut total_errors = 0usize;
    let mut total_warnings = 0usize;
    for run in runs {
        let s = &run.summary;
        total_events += s.validated_events;
        total_did += s.did_events;
        total_pairs += s.share_pairs;
        total_errors += s.issue_errors;
        total_warnings += s.issue_warnings;
        table.add_row(vec![
            market_cell(&s.market_id.to_string()),
            Cell::new(run.profile.drugs_count),
            Cell::new(s.validated_events),
            Cell::new(s.did_events),
            Cell::new(s.share_pairs),
            count_cell(Some(s.issue_errors), Color::Red),
            count_cell(Some(s.issue_warnings), Color::Yellow),
            status_cell(run),
            dim_cell(s.duration_ms),
        ]);
    }
    for failure in failed {
        table.add_row(vec![
            market_cell(&failure.market_id.to_string()),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            Cell::new("FAILED")
                .fg(Color::Red)
                .add_attribute(Attribute::Bold),
            dim_cell("-"),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(total_events).add_attribute(Attribute::Bold),
        Cell::new(total_did).add_attribute(Attribute::Bold),
        Cell::new(total_pairs).add_attribute(Attribute::Bold),
        count_cell(Some(total_errors), Color::Red).add_attribute(Attribute::Bold),
        count_cell(Some(total_warnings), Color::Yellow).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    println!("{table}");
}

fn print_coverage_table(build: &CrossMarketBuild) {
    let mut metrics = Table::new();
    metrics.set_header(vec![header_cell("Metric"), header_cell("Value")]);
    apply_table_style(&mut metrics);
    align_column(&mut metrics, 1, CellAlignment::Right);
    for row in build.metrics.rows() {
        metrics.add_row(vec![Cell::new(row.metric), Cell::new(row.value)]);
    }
    println!();
    println!("Coverage:");
    println!("{metrics}");

    let mut checks = Table::new();
    checks.set_header(vec![
        header_cell("Status"),
        header_cell("Check"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut checks);
    align_column(&mut checks, 0, CellAlignment::Center);
    for check in &build.checks {
        checks.add_row(vec![
            check_status_cell(check.status),
            Cell::new(&check.name),
            Cell::new(&check.message),
        ]);
    }
    println!("{checks}");
}

fn print_failures(failed: &[FailedMarket]) {
    if failed.is_empty() {
        return;
    }
    eprintln!("Failed markets:");
    for failure in failed {
        eprintln!("- {}: {}", failure.market_id, failure.error);
    }
}

pub fn print_profiles(profiles: &[MarketProfile], failed: &[FailedMarket]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Market"),
        header_cell("File"),
        header_cell("Competitors"),
        header_cell("Start"),
        header_cell("End"),
        header_cell("Weeks"),
        header_cell("Drugs"),
        header_cell("INN"),
        header_cell("Records"),
    ]);
    apply_table_style(&mut table);
    for index in [2, 5, 6, 7, 8] {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let mut total_records = 0usize;
    for p in profiles {
        total_records += p.records_count;
        table.add_row(vec![
            market_cell(&p.market_id.to_string()),
            Cell::new(&p.file_name),
            Cell::new(p.competitors_count),
            Cell::new(p.data_start),
            Cell::new(p.data_end),
            Cell::new(p.weeks_range),
            Cell::new(p.drugs_count),
            Cell::new(p.ingredients_count),
            Cell::new(p.records_count),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} markets", profiles.len()))
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        Cell::new(total_records).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    print_failures(failed);
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(run: &MarketRun) -> Cell {
    if run.validation.has_errors() {
        Cell::new("ERRORS")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    } else if run.failed_groups > 0 || run.validation.warning_count() > 0 {
        Cell::new("WARN").fg(Color::Yellow)
    } else {
        Cell::new("OK")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    }
}

fn check_status_cell(status: CheckStatus) -> Cell {
    let cell = Cell::new(status.label());
    match status {
        CheckStatus::Ok => cell.fg(Color::Green),
        CheckStatus::Warn => cell.fg(Color::Yellow),
        CheckStatus::Fail => cell.fg(Color::Red).add_attribute(Attribute::Bold),
    }
}

fn count_cell(count: Option<usize>, color: Color) -> Cell {
    match count {
        Some(value) if value > 0 => Cell::new(value).fg(color).add_attribute(Attribute::Bold),
        Some(value) => dim_cell(value),
        None => dim_cell("-"),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn market_cell(id: &str) -> Cell {
    Cell::new(id).fg(Color::Blue).add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
