// Sheet → store → filter → buckets → export, through the public API only

use target_report::aggregate::{aggregate, reporting_month};
use target_report::importer::text_rows;
use target_report::{
    aggregate_by_month, export_to_file, load_sheet, parse_rows, status_breakdown, AchievementReport,
    AppConfig, CellValue, FilterConfig, InMemoryStore, Metric, MonthRange, MonthlyTargets, Selection,
    Status, TargetRecord, TargetService,
};

fn sheet() -> Vec<Vec<CellValue>> {
    text_rows(&[
        vec![
            "NAMA PERUSAHAAN", "PROVINSI", "KOTA", "ALAMAT", "STATUS", "BULAN EXP DATE",
            "BULAN TTD NOTIF", "HARGA KONTRAK", "HARGA TERUPDATE", "KATEGORI",
        ],
        vec![
            "PT Alfa", "DKI Jakarta", "Kota Jakarta Selatan", "Jl. 1", "WAITING", "3", "",
            "1.000.000", "", "GOLD",
        ],
        vec![
            "PT Beta", "Jawa Barat", "Kab. Bandung", "Jl. 2", "DONE", "5", "15/03/2025",
            "2,000,000", "2.500.000", "SILVER",
        ],
        vec!["", "Jawa Barat", "Bandung", "Jl. 3", "WAITING", "6", "", "", "", ""],
        vec![
            "PT Gamma", "D.K.I. Jakarta", "Jakarta Selatan", "Jl. 4", "LOSS", "Maret", "",
            "3.000.000", "1.000.000", "GOLD",
        ],
        vec![
            "pt alfa ", "Jakarta", "Jakarta Selatan", "Jl. 5", "proses", "4", "", "500000", "",
            "BRONZE",
        ],
    ])
}

fn imported() -> Vec<TargetRecord> {
    let mut service = TargetService::new(InMemoryStore::new());
    let summary = service.import_sheet(&sheet(), Some("crm-01")).unwrap();

    assert_eq!(summary.success_count(), 4);
    assert_eq!(summary.error_count(), 0);
    assert_eq!(summary.skipped_rows, vec![4]);
    assert!(summary.issues.is_empty());

    service.list().unwrap()
}

#[test]
fn test_import_stamps_identity_and_derived_values() {
    let records = imported();

    assert!(records.iter().all(|r| r.id.is_some()));
    assert!(records.iter().all(|r| r.created_by.as_deref() == Some("crm-01")));

    let beta = &records[1];
    assert_eq!(beta.trimming_value, Some(500_000.0));
    assert_eq!(beta.loss_value, Some(0.0));

    let gamma = &records[2];
    assert_eq!(gamma.trimming_value, Some(0.0));
    assert_eq!(gamma.loss_value, Some(2_000_000.0));
}

#[test]
fn test_monthly_buckets_over_all_records() {
    let records = imported();

    let months = aggregate_by_month(&records, reporting_month);

    assert_eq!(months.len(), 12);
    // Alfa + Gamma by expiry month, Beta (DONE) by sign month
    let march = &months[2];
    assert_eq!(march.count, 3);
    assert_eq!(march.metric(Metric::HargaKontrak), 6_000_000.0);
    assert_eq!(march.metric(Metric::HargaTerupdate), 4_500_000.0);
    assert_eq!(march.metric(Metric::LossValue), 2_000_000.0);
    assert_eq!(months[3].count, 1);
    assert!(months[4].is_empty());

    let overall = aggregate(&records, &[()], |_| Some(()));
    assert_eq!(overall[0].count, 4);
    assert_eq!(overall[0].distinct_companies(), 3);
}

#[test]
fn test_status_breakdown_covers_every_status() {
    let records = imported();

    let counts: Vec<(Status, usize)> = status_breakdown(&records)
        .iter()
        .map(|b| (b.key, b.count))
        .collect();

    assert_eq!(
        counts,
        vec![
            (Status::Waiting, 1),
            (Status::Proses, 1),
            (Status::Done, 1),
            (Status::Suspend, 0),
            (Status::Loss, 1),
        ]
    );
}

#[test]
fn test_location_filter_ignores_admin_prefixes() {
    let records = imported();
    let filter = FilterConfig::new().with_provinsi("Jakarta").with_kota("Jakarta Selatan");

    let names: Vec<&str> = filter
        .apply(&records)
        .iter()
        .map(|r| r.nama_perusahaan.as_str())
        .collect();

    assert_eq!(names, vec!["PT Alfa", "PT Gamma", "pt alfa"]);
}

#[test]
fn test_done_records_exempt_from_expiry_range() {
    let records = imported();
    let mut filter = FilterConfig::new().with_bulan_exp(MonthRange::new(Some(1), Some(3)));

    let exempt: Vec<&str> = filter.apply(&records).iter().map(|r| r.nama_perusahaan.as_str()).collect();
    assert_eq!(exempt, vec!["PT Alfa", "PT Beta", "PT Gamma"]);

    filter.exempt_done_from_expiry = false;
    let strict = filter.apply(&records);
    assert_eq!(strict.len(), 2);
    assert!(strict.iter().all(|r| !r.is_done()));
}

#[test]
fn test_achievement_against_config_targets() {
    let records = imported();
    let mut targets = MonthlyTargets::new();
    targets.insert(3, 5_000_000.0);
    let config = AppConfig::default()
        .with_filter(FilterConfig::new().with_exact(
            target_report::ExactDimension::Status,
            "DONE",
        ))
        .with_target(3, 5_000_000.0);
    assert_eq!(config.monthly_targets, targets);
    assert_eq!(config.filter.status, Selection::only("DONE"));

    let done = config.filter.apply(&records);
    let report = AchievementReport::monthly(done.iter().copied(), &config.monthly_targets);

    let march = &report[2];
    assert_eq!(march.target, 5_000_000.0);
    assert_eq!(march.actual, 2_500_000.0);
    assert_eq!(march.percent(), Some(50.0));
    assert_eq!(report[0].ratio, None);
}

#[test]
fn test_filtered_export_reimports() {
    let records = imported();
    let filter = FilterConfig::new().with_provinsi("DKI Jakarta");
    let path = std::env::temp_dir().join(format!("target_report_flow_{}.csv", std::process::id()));

    let written = export_to_file(&path, filter.apply(&records)).unwrap();
    let rows = load_sheet(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(written, 3);
    let report = parse_rows(&rows);
    assert!(report.issues.is_empty());
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.records[1].nama_perusahaan, "PT Gamma");
    assert_eq!(report.records[1].status, Some(Status::Loss));
    assert_eq!(report.records[1].harga_terupdate, Some(1_000_000.0));
    assert_eq!(report.records[1].loss_value, Some(2_000_000.0));
}
