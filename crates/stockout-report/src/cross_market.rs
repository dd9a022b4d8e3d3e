//! Cross-market output files.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use stockout_coefficients::{CoefficientTable, CrossMarketBuild, CrossMarketDrugRow};
use stockout_ingest::DrugCatalogEntry;
use stockout_model::PharmacyId;
use stockout_validate::ValidationReport;

use crate::common::{MetricPair, ensure_output_dir, write_csv};
use crate::rows::{CrossMarketRow, DrugListRow, ResearchedDrugRow};

pub const CROSS_MARKET_DIR: &str = "cross_market";

const RULE: &str = "======================================================================";
const THIN_RULE: &str = "----------------------------------------";

pub fn cross_market_dir(out_dir: &Path) -> Result<PathBuf> {
    ensure_output_dir(out_dir, CROSS_MARKET_DIR)
}

/// Writes `cross_market_{id}.csv` for one market.
pub fn write_market_rows(
    out_dir: &Path,
    market_id: PharmacyId,
    rows: &[CrossMarketDrugRow],
) -> Result<PathBuf> {
    let path = cross_market_dir(out_dir)?.join(format!("cross_market_{market_id}.csv"));
    let rows: Vec<CrossMarketRow> = rows.iter().map(CrossMarketRow::from).collect();
    write_csv(&path, &rows)?;
    Ok(path)
}

/// Writes the drug lists, the coefficient table and coverage analysis.
pub fn write_cross_market_outputs(
    out_dir: &Path,
    build: &CrossMarketBuild,
    catalog: &[DrugCatalogEntry],
) -> Result<PathBuf> {
    let dir = cross_market_dir(out_dir)?;

    let drugs: Vec<DrugListRow> = catalog.iter().map(DrugListRow::from).collect();
    write_csv(&dir.join("all_drugs_list.csv"), &drugs)?;

    let researched: Vec<ResearchedDrugRow> =
        build.researched.iter().map(ResearchedDrugRow::from).collect();
    write_csv(&dir.join("researched_drugs_list.csv"), &researched)?;

    write_coefficient_table(&dir.join("researched_drugs_coefficients.csv"), &build.table)?;

    let metrics: Vec<MetricPair> = build
        .metrics
        .rows()
        .into_iter()
        .map(|row| MetricPair {
            metric: row.metric,
            value: row.value,
        })
        .collect();
    write_csv(&dir.join("coverage_analysis.csv"), &metrics)?;

    Ok(dir)
}

/// Column names of the wide coefficient table.
pub fn coefficient_headers(markets: &[PharmacyId]) -> Vec<String> {
    let mut headers: Vec<String> = [
        "DRUGS_ID",
        "DRUGS_NAME",
        "INN_ID",
        "INN_NAME",
        "NFC1_ID",
        "MARKET_COUNT",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();
    for market_id in markets {
        headers.push(format!("SHARE_INTERNAL_LOC_{market_id}"));
        headers.push(format!("INTERNAL_LIFT_LOC_{market_id}"));
        headers.push(format!("EVENTS_COUNT_LOC_{market_id}"));
    }
    headers
}

fn write_coefficient_table(path: &Path, table: &CoefficientTable) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    writer
        .write_record(coefficient_headers(&table.markets))
        .with_context(|| format!("write header to {}", path.display()))?;
    for row in &table.rows {
        let mut record = vec![
            row.drug_id.to_string(),
            row.drug_name.clone(),
            row.ingredient_id.to_string(),
            row.ingredient_name.clone(),
            row.nfc1.clone(),
            row.market_count.to_string(),
        ];
        for market_id in &table.markets {
            match row.cell(*market_id) {
                Some(cell) => {
                    record.push(
                        cell.share_internal
                            .as_ref()
                            .map(ToString::to_string)
                            .unwrap_or_default(),
                    );
                    record.push(cell.internal_lift.to_string());
                    record.push(cell.events_count.to_string());
                }
                None => record.extend([String::new(), String::new(), String::new()]),
            }
        }
        writer
            .write_record(&record)
            .with_context(|| format!("write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

/// Plain-text report of the coverage checks and per-market invariant issues.
pub fn render_validation_report(
    build: &CrossMarketBuild,
    markets: &[ValidationReport],
    generated: NaiveDateTime,
) -> String {
    let passed = build.passed() && markets.iter().all(|m| !m.has_errors());
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "VALIDATION REPORT - Cross-market coefficients");
    let _ = writeln!(out, "Generated: {}", generated.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "OVERALL STATUS: {}",
        if passed { "PASSED" } else { "FAILED" }
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "{THIN_RULE}");
    let _ = writeln!(out, "VALIDATION CHECKS:");
    let _ = writeln!(out, "{THIN_RULE}");
    for check in &build.checks {
        let _ = writeln!(out, "{check}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{THIN_RULE}");
    let _ = writeln!(out, "MARKET INVARIANTS:");
    let _ = writeln!(out, "{THIN_RULE}");
    for report in markets {
        let label = if report.has_errors() {
            "[FAIL]"
        } else if report.warning_count() > 0 {
            "[WARN]"
        } else {
            "[OK]"
        };
        let _ = writeln!(
            out,
            "{label} market {}: {} errors, {} warnings",
            report.market_id,
            report.error_count(),
            report.warning_count()
        );
        for issue in &report.issues {
            let _ = writeln!(out, "    {issue}");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{RULE}");
    out
}

pub fn write_validation_report(out_dir: &Path, report: &str) -> Result<PathBuf> {
    let path = cross_market_dir(out_dir)?.join("validation_report.txt");
    fs::write(&path, report).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}
