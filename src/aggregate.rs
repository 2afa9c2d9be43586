// 📊 Aggregation / Bucketing Engine
//
// Groups records into buckets (calendar months, or enum values) and sums the
// money fields per bucket. Buckets come out in the caller's order with empty
// ones filled in, so a chart axis is always complete. Sums stay unrounded
// until presented() is called.

use crate::model::{Category, DateField, Kuadran, Status, TargetRecord};
use crate::normalize::month_name;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Month axis 1..=12
pub const MONTHS: [u32; 12] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

// ============================================================================
// TOTALS
// ============================================================================

/// Reducible numeric fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    HargaKontrak,
    /// Updated price, falling back to the contract price when absent
    HargaTerupdate,
    TrimmingValue,
    LossValue,
    Cashback,
    Count,
    DistinctCompanies,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub harga_kontrak: f64,
    pub harga_terupdate: f64,
    pub trimming_value: f64,
    pub loss_value: f64,
    pub cashback: f64,
}

impl Totals {
    fn add(&mut self, record: &TargetRecord) {
        self.harga_kontrak += record.harga_kontrak.unwrap_or(0.0);
        self.harga_terupdate += record
            .harga_terupdate
            .or(record.harga_kontrak)
            .unwrap_or(0.0);
        self.trimming_value += record.trimming_value.unwrap_or(0.0);
        self.loss_value += record.loss_value.unwrap_or(0.0);
        self.cashback += record.cashback.unwrap_or(0.0);
    }

    /// Whole-currency-unit rounding, for display only
    pub fn rounded(&self) -> Totals {
        Totals {
            harga_kontrak: round_currency(self.harga_kontrak),
            harga_terupdate: round_currency(self.harga_terupdate),
            trimming_value: round_currency(self.trimming_value),
            loss_value: round_currency(self.loss_value),
            cashback: round_currency(self.cashback),
        }
    }
}

pub fn round_currency(amount: f64) -> f64 {
    amount.round()
}

// ============================================================================
// BUCKETS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSummary<K> {
    pub key: K,
    pub count: usize,
    pub totals: Totals,
    /// Company names seen in this bucket, trimmed and upper-cased
    #[serde(skip)]
    pub companies: BTreeSet<String>,
}

impl<K> BucketSummary<K> {
    pub fn empty(key: K) -> Self {
        BucketSummary {
            key,
            count: 0,
            totals: Totals::default(),
            companies: BTreeSet::new(),
        }
    }

    fn add(&mut self, record: &TargetRecord) {
        self.count += 1;
        self.totals.add(record);
        self.companies
            .insert(record.nama_perusahaan.trim().to_uppercase());
    }

    pub fn distinct_companies(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::HargaKontrak => self.totals.harga_kontrak,
            Metric::HargaTerupdate => self.totals.harga_terupdate,
            Metric::TrimmingValue => self.totals.trimming_value,
            Metric::LossValue => self.totals.loss_value,
            Metric::Cashback => self.totals.cashback,
            Metric::Count => self.count as f64,
            Metric::DistinctCompanies => self.distinct_companies() as f64,
        }
    }
}

impl<K: Clone> BucketSummary<K> {
    /// Rounded copy for tables and charts
    pub fn presented(&self) -> PresentedBucket<K> {
        PresentedBucket {
            key: self.key.clone(),
            count: self.count,
            distinct_companies: self.distinct_companies(),
            totals: self.totals.rounded(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentedBucket<K> {
    pub key: K,
    pub count: usize,
    pub distinct_companies: usize,
    pub totals: Totals,
}

/// Group records by `key_fn`.
///
/// Output follows `order`, including empty buckets; keys that are not in
/// `order` are appended afterwards in key order. Records whose key is `None`
/// are left out of this aggregation only.
pub fn aggregate<'a, K, I, F>(records: I, order: &[K], key_fn: F) -> Vec<BucketSummary<K>>
where
    K: Ord + Clone,
    I: IntoIterator<Item = &'a TargetRecord>,
    F: Fn(&TargetRecord) -> Option<K>,
{
    let mut buckets: BTreeMap<K, BucketSummary<K>> = BTreeMap::new();
    let mut dropped = 0usize;

    for record in records {
        match key_fn(record) {
            Some(key) => buckets
                .entry(key.clone())
                .or_insert_with(|| BucketSummary::empty(key))
                .add(record),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("{} records had no bucket key and were left out", dropped);
    }

    let mut result: Vec<BucketSummary<K>> = order
        .iter()
        .map(|key| {
            buckets
                .remove(key)
                .unwrap_or_else(|| BucketSummary::empty(key.clone()))
        })
        .collect();
    result.extend(buckets.into_values());
    result
}

/// Twelve month buckets, January first
pub fn aggregate_by_month<'a, I, F>(records: I, key_fn: F) -> Vec<BucketSummary<u32>>
where
    I: IntoIterator<Item = &'a TargetRecord>,
    F: Fn(&TargetRecord) -> Option<u32>,
{
    aggregate(records, &MONTHS, key_fn)
        .into_iter()
        .filter(|b| (1..=12).contains(&b.key))
        .collect()
}

// ============================================================================
// BUCKET-KEY EXTRACTORS
// ============================================================================

/// Month of one of the record's calendar dates
pub fn month_of(field: DateField) -> impl Fn(&TargetRecord) -> Option<u32> {
    move |record| {
        record
            .date(field)
            .map(|d| chrono::Datelike::month(&d))
    }
}

pub fn expiry_month(record: &TargetRecord) -> Option<u32> {
    record.expiry_month()
}

/// Expiry month, except DONE records which report on their sign month
pub fn reporting_month(record: &TargetRecord) -> Option<u32> {
    if record.is_done() {
        record.sign_month()
    } else {
        record.expiry_month()
    }
}

pub fn by_status(record: &TargetRecord) -> Option<Status> {
    record.status
}

pub fn by_category(record: &TargetRecord) -> Option<Category> {
    record.category
}

pub fn by_kuadran(record: &TargetRecord) -> Option<Kuadran> {
    record.kuadran
}

/// Count and value per status, in pipeline order
pub fn status_breakdown<'a, I>(records: I) -> Vec<BucketSummary<Status>>
where
    I: IntoIterator<Item = &'a TargetRecord>,
{
    aggregate(records, &Status::ALL, by_status)
}

// ============================================================================
// ACHIEVEMENT (ratio metrics)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Achievement<K> {
    pub key: K,
    pub target: f64,
    pub actual: f64,
    /// actual / target; None when the target is zero
    pub ratio: Option<f64>,
}

impl<K> Achievement<K> {
    fn new(key: K, target: f64, actual: f64) -> Self {
        let ratio = if target > 0.0 { Some(actual / target) } else { None };
        Achievement {
            key,
            target,
            actual,
            ratio,
        }
    }

    /// Percentage with one decimal, for display
    pub fn percent(&self) -> Option<f64> {
        self.ratio.map(|r| (r * 1000.0).round() / 10.0)
    }
}

/// Ratio of two fully accumulated bucket series on the same axis.
///
/// Keys follow `target`; keys present only in `actual` are appended.
pub fn achievement<K: PartialEq + Clone>(
    target: &[BucketSummary<K>],
    actual: &[BucketSummary<K>],
    metric: Metric,
) -> Vec<Achievement<K>> {
    let mut result: Vec<Achievement<K>> = target
        .iter()
        .map(|t| {
            let a = actual
                .iter()
                .find(|a| a.key == t.key)
                .map_or(0.0, |a| a.metric(metric));
            Achievement::new(t.key.clone(), t.metric(metric), a)
        })
        .collect();

    for a in actual {
        if !target.iter().any(|t| t.key == a.key) {
            result.push(Achievement::new(a.key.clone(), 0.0, a.metric(metric)));
        }
    }
    result
}

/// Monthly revenue targets, month number → amount
pub type MonthlyTargets = BTreeMap<u32, f64>;

pub struct AchievementReport;

impl AchievementReport {
    /// DONE revenue per sign month against fixed monthly targets
    pub fn monthly<'a, I>(records: I, targets: &MonthlyTargets) -> Vec<Achievement<u32>>
    where
        I: IntoIterator<Item = &'a TargetRecord>,
    {
        let done = records.into_iter().filter(|r| r.is_done());
        let actual = aggregate_by_month(done, |r| r.sign_month());

        actual
            .iter()
            .map(|bucket| {
                let target = targets.get(&bucket.key).copied().unwrap_or(0.0);
                Achievement::new(bucket.key, target, bucket.metric(Metric::HargaTerupdate))
            })
            .collect()
    }

    /// Closed revenue against the open pipeline, month by month.
    ///
    /// Target: contract value of every non-LOSS record by expiry month.
    /// Actual: updated value of DONE records by sign month.
    pub fn pipeline<'a, I>(records: I) -> Vec<Achievement<u32>>
    where
        I: IntoIterator<Item = &'a TargetRecord> + Clone,
    {
        let pipeline = aggregate_by_month(
            records
                .clone()
                .into_iter()
                .filter(|r| r.status != Some(Status::Loss)),
            expiry_month,
        );
        let done = aggregate_by_month(
            records.into_iter().filter(|r| r.is_done()),
            |r| r.sign_month(),
        );

        // Ratio needs two different metrics, so build it by hand
        pipeline
            .iter()
            .zip(done.iter())
            .map(|(p, d)| {
                Achievement::new(
                    p.key,
                    p.metric(Metric::HargaKontrak),
                    d.metric(Metric::HargaTerupdate),
                )
            })
            .collect()
    }
}

/// Chart label for a month bucket
pub fn month_label(month: u32) -> &'static str {
    month_name(month)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(name: &str, status: Status, exp: &str, ttd: Option<(i32, u32)>, kontrak: f64) -> TargetRecord {
        let mut r = TargetRecord::new(name, "Jawa Barat", "Bandung", "Jl. 1")
            .with_prices(kontrak, None)
            .with_status(status);
        if !exp.is_empty() {
            r.bulan_exp_date = Some(exp.to_string());
        }
        r.bulan_ttd_notif = ttd.and_then(|(y, m)| NaiveDate::from_ymd_opt(y, m, 10));
        r
    }

    #[test]
    fn test_empty_input_yields_twelve_zero_buckets() {
        let records: Vec<TargetRecord> = Vec::new();
        let buckets = aggregate_by_month(&records, reporting_month);

        assert_eq!(buckets.len(), 12);
        for (i, b) in buckets.iter().enumerate() {
            assert_eq!(b.key, i as u32 + 1);
            assert_eq!(b.count, 0);
            assert_eq!(b.totals, Totals::default());
        }
    }

    #[test]
    fn test_reporting_month_uses_sign_date_for_done() {
        let records = vec![
            record("A", Status::Proses, "3", None, 100.0),
            record("B", Status::Done, "3", Some((2025, 5)), 200.0),
            record("C", Status::Waiting, "Maret", None, 50.0),
        ];

        let buckets = aggregate_by_month(&records, reporting_month);

        assert_eq!(buckets[2].count, 2);
        assert_eq!(buckets[2].totals.harga_kontrak, 150.0);
        assert_eq!(buckets[4].count, 1);
        assert_eq!(buckets[4].totals.harga_kontrak, 200.0);
    }

    #[test]
    fn test_unbucketable_records_are_dropped_silently() {
        let records = vec![
            record("A", Status::Proses, "", None, 100.0),
            record("B", Status::Done, "3", None, 200.0),
            record("C", Status::Proses, "4", None, 300.0),
        ];

        let buckets = aggregate_by_month(&records, reporting_month);
        let total: usize = buckets.iter().map(|b| b.count).sum();

        assert_eq!(buckets.len(), 12);
        assert_eq!(total, 1);
        assert_eq!(buckets[3].totals.harga_kontrak, 300.0);
    }

    #[test]
    fn test_distinct_companies() {
        let records = vec![
            record("PT Satu", Status::Proses, "1", None, 10.0),
            record("pt satu ", Status::Proses, "1", None, 10.0),
            record("PT Dua", Status::Proses, "1", None, 10.0),
        ];

        let buckets = aggregate_by_month(&records, expiry_month);

        assert_eq!(buckets[0].count, 3);
        assert_eq!(buckets[0].distinct_companies(), 2);
        assert_eq!(buckets[0].metric(Metric::DistinctCompanies), 2.0);
    }

    #[test]
    fn test_enum_buckets_follow_caller_order() {
        let mut records = vec![
            record("A", Status::Loss, "1", None, 10.0),
            record("B", Status::Done, "1", None, 20.0),
        ];
        records.push(TargetRecord::new("C", "Bali", "Denpasar", "Jl. 3"));

        let buckets = status_breakdown(&records);
        let keys: Vec<Status> = buckets.iter().map(|b| b.key).collect();

        assert_eq!(keys, Status::ALL.to_vec());
        assert_eq!(buckets[2].count, 1);
        assert_eq!(buckets[4].count, 1);
        assert!(buckets[0].is_empty());
    }

    #[test]
    fn test_keys_outside_order_are_appended() {
        let mut a = record("A", Status::Proses, "1", None, 10.0);
        a.category = Some(Category::Bronze);
        let mut b = record("B", Status::Proses, "1", None, 10.0);
        b.category = Some(Category::Gold);

        let records = vec![a, b];
        let buckets = aggregate(&records, &[Category::Gold], by_category);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key, Category::Gold);
        assert_eq!(buckets[1].key, Category::Bronze);
    }

    #[test]
    fn test_rounding_only_at_presentation() {
        let records = vec![
            record("A", Status::Proses, "2", None, 0.4),
            record("B", Status::Proses, "2", None, 0.4),
            record("C", Status::Proses, "2", None, 0.4),
        ];

        let buckets = aggregate_by_month(&records, expiry_month);

        assert!((buckets[1].totals.harga_kontrak - 1.2).abs() < 1e-9);
        assert_eq!(buckets[1].presented().totals.harga_kontrak, 1.0);
    }

    #[test]
    fn test_achievement_ratio() {
        let records = vec![
            record("A", Status::Proses, "1", None, 1500.0),
            record("B", Status::Done, "1", Some((2025, 1)), 500.0),
            record("C", Status::Loss, "1", None, 9999.0),
        ];

        let report = AchievementReport::pipeline(&records);

        // LOSS is out of the pipeline; DONE counts on both sides
        assert_eq!(report.len(), 12);
        assert_eq!(report[0].target, 2000.0);
        assert_eq!(report[0].actual, 500.0);
        assert_eq!(report[0].ratio, Some(0.25));
        assert_eq!(report[0].percent(), Some(25.0));
        assert_eq!(report[1].ratio, None);
    }

    #[test]
    fn test_monthly_targets() {
        let records = vec![
            record("A", Status::Done, "", Some((2025, 2)), 300.0),
            record("B", Status::Done, "", Some((2025, 2)), 100.0),
            record("C", Status::Proses, "", Some((2025, 2)), 700.0),
        ];
        let targets: MonthlyTargets = [(2, 800.0)].into_iter().collect();

        let report = AchievementReport::monthly(&records, &targets);

        assert_eq!(report[1].actual, 400.0);
        assert_eq!(report[1].ratio, Some(0.5));
        assert_eq!(report[0].ratio, None);
    }

    #[test]
    fn test_generic_achievement_on_same_metric() {
        let records = vec![
            record("A", Status::Proses, "1", None, 100.0),
            record("B", Status::Done, "1", Some((2025, 1)), 100.0),
        ];
        let all = status_breakdown(&records);
        let done: Vec<_> = all.iter().filter(|b| b.key == Status::Done).cloned().collect();

        let result = achievement(&all, &done, Metric::Count);

        assert_eq!(result.len(), 5);
        let done_row = result.iter().find(|a| a.key == Status::Done).unwrap();
        assert_eq!(done_row.ratio, Some(1.0));
    }

    #[test]
    fn test_month_of_extractor() {
        let mut r = record("A", Status::Proses, "", None, 1.0);
        r.tanggal_kunjungan = NaiveDate::from_ymd_opt(2025, 9, 1);
        let records = vec![r];

        let buckets = aggregate_by_month(&records, month_of(DateField::TanggalKunjungan));
        assert_eq!(buckets[8].count, 1);
        assert_eq!(month_label(9), "September");
    }
}
