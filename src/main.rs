use anyhow::{bail, Context, Result};
use serde_json::json;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use target_report::aggregate::{self, month_label};
use target_report::{
    export_to_file, load_sheet, parse_rows, status_breakdown, AchievementReport, AppConfig,
    InMemoryStore, TargetRecord, TargetService,
};

const USAGE: &str = "Usage:
  target-report import <sheet.xlsx|sheet.csv>
  target-report report <sheet.xlsx|sheet.csv>
  target-report export <sheet.xlsx|sheet.csv> <out.csv>";

fn main() -> Result<()> {
    // Logs on stderr, JSON report on stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    match args.get(1).map(String::as_str) {
        Some("import") if args.len() == 3 => run_import(&config, Path::new(&args[2])),
        Some("report") if args.len() == 3 => run_report(&config, Path::new(&args[2])),
        Some("export") if args.len() == 4 => {
            run_export(&config, Path::new(&args[2]), Path::new(&args[3]))
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn run_import(config: &AppConfig, sheet: &Path) -> Result<()> {
    println!("📥 Importing {}", sheet.display());

    let rows = load_sheet(sheet).with_context(|| format!("Failed to read sheet: {:?}", sheet))?;
    let mut service = TargetService::new(InMemoryStore::new());
    let summary = service.import_sheet(&rows, config.acting_user.as_deref())?;

    println!("✓ {}", summary.message());
    for issue in &summary.issues {
        println!("  ⚠ row {}: {} '{}' ({})", issue.row, issue.field, issue.raw, issue.message);
    }
    for failure in summary.batch.failure_messages() {
        println!("  ✗ {}", failure);
    }

    let stored = service.list()?;
    print_report(config, &stored)
}

fn run_report(config: &AppConfig, sheet: &Path) -> Result<()> {
    let records = read_records(sheet)?;
    print_report(config, &records)
}

fn run_export(config: &AppConfig, sheet: &Path, out: &Path) -> Result<()> {
    let records = read_records(sheet)?;
    let filtered = config.filter.apply(&records);

    let count = export_to_file(out, filtered)
        .with_context(|| format!("Failed to write export: {:?}", out))?;
    println!("✓ Exported {} of {} records to {}", count, records.len(), out.display());
    Ok(())
}

fn read_records(sheet: &Path) -> Result<Vec<TargetRecord>> {
    let rows = load_sheet(sheet).with_context(|| format!("Failed to read sheet: {:?}", sheet))?;
    let report = parse_rows(&rows);
    if report.records.is_empty() {
        bail!("No records found in {}", sheet.display());
    }
    Ok(report.records)
}

fn print_report(config: &AppConfig, records: &[TargetRecord]) -> Result<()> {
    let filtered = config.filter.apply(records);
    let active = config.filter.active_dimensions();
    if !active.is_empty() {
        tracing::info!("Active filters: {}", active.join(", "));
    }

    let monthly: Vec<_> = aggregate::aggregate_by_month(filtered.iter().copied(), aggregate::reporting_month)
        .iter()
        .map(|b| json!({ "month": month_label(b.key), "bucket": b.presented() }))
        .collect();
    let statuses: Vec<_> = status_breakdown(filtered.iter().copied())
        .iter()
        .map(|b| b.presented())
        .collect();
    let against_targets = AchievementReport::monthly(filtered.iter().copied(), &config.monthly_targets);
    let pipeline = AchievementReport::pipeline(filtered.iter().copied());

    let report = json!({
        "records": records.len(),
        "filtered": filtered.len(),
        "monthly": monthly,
        "statusBreakdown": statuses,
        "achievement": {
            "againstTargets": against_targets,
            "pipeline": pipeline,
        },
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
