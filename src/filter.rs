// 🔎 Filter Predicate Engine - one immutable filter value, AND across dimensions
//
// A dimension set to its sentinel ("all", empty text, open month range) is
// inactive and passes everything.

use crate::model::TargetRecord;
use serde::{Deserialize, Serialize};

// ============================================================================
// SELECTION (enum-style dropdowns)
// ============================================================================

/// One dropdown value. `"all"` or blank is the inactive sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn only(value: impl Into<String>) -> Self {
        Selection::from(value.into())
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Selection::Only(_))
    }

    /// Exact comparison against the record's value
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => value == Some(wanted.as_str()),
        }
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Selection::All
        } else {
            Selection::Only(trimmed.to_string())
        }
    }
}

impl From<Selection> for String {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::All => "all".to_string(),
            Selection::Only(v) => v,
        }
    }
}

// ============================================================================
// MONTH RANGE
// ============================================================================

/// Inclusive month window; a `None` bound is open on that side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonthRange {
    #[serde(default)]
    pub from: Option<u32>,
    #[serde(default)]
    pub to: Option<u32>,
}

impl MonthRange {
    pub fn new(from: Option<u32>, to: Option<u32>) -> Self {
        MonthRange { from, to }
    }

    /// Parse dropdown values: `"all"` or `1..=12` on each side
    pub fn parse(from: &str, to: &str) -> Self {
        MonthRange {
            from: parse_bound(from),
            to: parse_bound(to),
        }
    }

    pub fn is_active(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    pub fn contains(&self, month: u32) -> bool {
        self.from.map_or(true, |f| month >= f) && self.to.map_or(true, |t| month <= t)
    }

    /// A record with no month cannot be in an active range
    pub fn admits(&self, month: Option<u32>) -> bool {
        !self.is_active() || month.map_or(false, |m| self.contains(m))
    }
}

fn parse_bound(text: &str) -> Option<u32> {
    text.trim()
        .parse::<u32>()
        .ok()
        .filter(|m| (1..=12).contains(m))
}

// ============================================================================
// LOCATION NORMALIZATION
// ============================================================================

/// Administrative prefixes dropped before comparing place names
const LOCATION_PREFIXES: &[&str] = &[
    "provinsi ",
    "daerah khusus ibukota ",
    "dki ",
    "kota administrasi ",
    "kota adm ",
    "kota ",
    "kabupaten ",
    "kab ",
    "administrasi ",
    "adm ",
];

fn normalize_location(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter(|c| *c != '.')
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut normalized = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    normalized.push(' ');

    while let Some(prefix) = LOCATION_PREFIXES.iter().find(|p| normalized.starts_with(*p)) {
        normalized = normalized[prefix.len()..].to_string();
    }

    normalized.trim_end().to_string()
}

/// "D.K.I. Jakarta", "DKI  Jakarta", "Provinsi DKI Jakarta" → "jakarta"
pub fn normalize_provinsi(name: &str) -> String {
    normalize_location(name)
}

/// "Kota Bandung", "Kab. Bandung", "bandung" → "bandung"
pub fn normalize_kota(name: &str) -> String {
    normalize_location(name)
}

/// A filter value that is only a prefix ("DKI", "Kota") names no place and matches nothing
fn location_matches(record_value: String, wanted: String) -> bool {
    !wanted.is_empty() && record_value == wanted
}

// ============================================================================
// FILTER CONFIG
// ============================================================================

/// Dropdown dimensions compared by exact value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExactDimension {
    Status,
    Category,
    Kuadran,
    DirectOrAssociate,
    StatusSertifikat,
    StatusKunjungan,
    Akreditasi,
    CatAkre,
    Produk,
    TahapAudit,
    PicCrm,
    Sales,
    NamaAssociate,
    Std,
    Tahun,
}

impl ExactDimension {
    pub const ALL: [ExactDimension; 15] = [
        ExactDimension::Status,
        ExactDimension::Category,
        ExactDimension::Kuadran,
        ExactDimension::DirectOrAssociate,
        ExactDimension::StatusSertifikat,
        ExactDimension::StatusKunjungan,
        ExactDimension::Akreditasi,
        ExactDimension::CatAkre,
        ExactDimension::Produk,
        ExactDimension::TahapAudit,
        ExactDimension::PicCrm,
        ExactDimension::Sales,
        ExactDimension::NamaAssociate,
        ExactDimension::Std,
        ExactDimension::Tahun,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ExactDimension::Status => "status",
            ExactDimension::Category => "category",
            ExactDimension::Kuadran => "kuadran",
            ExactDimension::DirectOrAssociate => "directOrAssociate",
            ExactDimension::StatusSertifikat => "statusSertifikat",
            ExactDimension::StatusKunjungan => "statusKunjungan",
            ExactDimension::Akreditasi => "akreditasi",
            ExactDimension::CatAkre => "catAkre",
            ExactDimension::Produk => "produk",
            ExactDimension::TahapAudit => "tahapAudit",
            ExactDimension::PicCrm => "picCrm",
            ExactDimension::Sales => "sales",
            ExactDimension::NamaAssociate => "namaAssociate",
            ExactDimension::Std => "std",
            ExactDimension::Tahun => "tahun",
        }
    }

    fn value<'a>(&self, record: &'a TargetRecord) -> Option<&'a str> {
        match self {
            ExactDimension::Status => record.status.map(|s| s.as_str()),
            ExactDimension::Category => record.category.map(|c| c.as_str()),
            ExactDimension::Kuadran => record.kuadran.map(|k| k.as_str()),
            ExactDimension::DirectOrAssociate => record.direct_or_associate.map(|c| c.as_str()),
            ExactDimension::StatusSertifikat => record.status_sertifikat.map(|s| s.as_str()),
            ExactDimension::StatusKunjungan => record.status_kunjungan.map(|s| s.as_str()),
            ExactDimension::Akreditasi => record.akreditasi.as_deref(),
            ExactDimension::CatAkre => record.cat_akre.as_deref(),
            ExactDimension::Produk => record.produk.as_deref(),
            ExactDimension::TahapAudit => record.tahap_audit.as_deref(),
            ExactDimension::PicCrm => record.pic_crm.as_deref(),
            ExactDimension::Sales => record.sales.as_deref(),
            ExactDimension::NamaAssociate => record.nama_associate.as_deref(),
            ExactDimension::Std => record.std.as_deref(),
            ExactDimension::Tahun => record.tahun.as_deref(),
        }
    }
}

/// Every filter the dashboard exposes, as one value.
///
/// `Default` has every dimension inactive and DONE records exempt from the
/// expiry-month range (they are reported against their sign month).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    pub status: Selection,
    pub category: Selection,
    pub kuadran: Selection,
    pub direct_or_associate: Selection,
    pub status_sertifikat: Selection,
    pub status_kunjungan: Selection,
    pub akreditasi: Selection,
    pub cat_akre: Selection,
    pub produk: Selection,
    pub tahap_audit: Selection,
    pub pic_crm: Selection,
    pub sales: Selection,
    pub nama_associate: Selection,
    pub std: Selection,
    pub tahun: Selection,

    pub provinsi: Selection,
    pub kota: Selection,

    /// Case-insensitive substring of the EA code; empty = inactive
    pub ea_code: String,

    pub bulan_exp: MonthRange,
    pub bulan_ttd: MonthRange,
    pub kunjungan: MonthRange,

    /// Free text over company, sales and PIC; empty = inactive
    pub search: String,

    pub exempt_done_from_expiry: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            status: Selection::All,
            category: Selection::All,
            kuadran: Selection::All,
            direct_or_associate: Selection::All,
            status_sertifikat: Selection::All,
            status_kunjungan: Selection::All,
            akreditasi: Selection::All,
            cat_akre: Selection::All,
            produk: Selection::All,
            tahap_audit: Selection::All,
            pic_crm: Selection::All,
            sales: Selection::All,
            nama_associate: Selection::All,
            std: Selection::All,
            tahun: Selection::All,
            provinsi: Selection::All,
            kota: Selection::All,
            ea_code: String::new(),
            bulan_exp: MonthRange::default(),
            bulan_ttd: MonthRange::default(),
            kunjungan: MonthRange::default(),
            search: String::new(),
            exempt_done_from_expiry: true,
        }
    }
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exact(&self, dimension: ExactDimension) -> &Selection {
        match dimension {
            ExactDimension::Status => &self.status,
            ExactDimension::Category => &self.category,
            ExactDimension::Kuadran => &self.kuadran,
            ExactDimension::DirectOrAssociate => &self.direct_or_associate,
            ExactDimension::StatusSertifikat => &self.status_sertifikat,
            ExactDimension::StatusKunjungan => &self.status_kunjungan,
            ExactDimension::Akreditasi => &self.akreditasi,
            ExactDimension::CatAkre => &self.cat_akre,
            ExactDimension::Produk => &self.produk,
            ExactDimension::TahapAudit => &self.tahap_audit,
            ExactDimension::PicCrm => &self.pic_crm,
            ExactDimension::Sales => &self.sales,
            ExactDimension::NamaAssociate => &self.nama_associate,
            ExactDimension::Std => &self.std,
            ExactDimension::Tahun => &self.tahun,
        }
    }

    fn exact_mut(&mut self, dimension: ExactDimension) -> &mut Selection {
        match dimension {
            ExactDimension::Status => &mut self.status,
            ExactDimension::Category => &mut self.category,
            ExactDimension::Kuadran => &mut self.kuadran,
            ExactDimension::DirectOrAssociate => &mut self.direct_or_associate,
            ExactDimension::StatusSertifikat => &mut self.status_sertifikat,
            ExactDimension::StatusKunjungan => &mut self.status_kunjungan,
            ExactDimension::Akreditasi => &mut self.akreditasi,
            ExactDimension::CatAkre => &mut self.cat_akre,
            ExactDimension::Produk => &mut self.produk,
            ExactDimension::TahapAudit => &mut self.tahap_audit,
            ExactDimension::PicCrm => &mut self.pic_crm,
            ExactDimension::Sales => &mut self.sales,
            ExactDimension::NamaAssociate => &mut self.nama_associate,
            ExactDimension::Std => &mut self.std,
            ExactDimension::Tahun => &mut self.tahun,
        }
    }

    // Builders. Each returns a new value; the config is never mutated in place
    // once handed to the engine.

    pub fn with_exact(mut self, dimension: ExactDimension, value: &str) -> Self {
        *self.exact_mut(dimension) = Selection::only(value);
        self
    }

    pub fn with_provinsi(mut self, value: &str) -> Self {
        self.provinsi = Selection::only(value);
        self
    }

    pub fn with_kota(mut self, value: &str) -> Self {
        self.kota = Selection::only(value);
        self
    }

    pub fn with_ea_code(mut self, value: &str) -> Self {
        self.ea_code = value.to_string();
        self
    }

    pub fn with_bulan_exp(mut self, range: MonthRange) -> Self {
        self.bulan_exp = range;
        self
    }

    pub fn with_bulan_ttd(mut self, range: MonthRange) -> Self {
        self.bulan_ttd = range;
        self
    }

    pub fn with_kunjungan(mut self, range: MonthRange) -> Self {
        self.kunjungan = range;
        self
    }

    pub fn with_search(mut self, query: &str) -> Self {
        self.search = query.to_string();
        self
    }

    /// Names of the dimensions that currently restrict the result
    pub fn active_dimensions(&self) -> Vec<&'static str> {
        let mut active: Vec<&'static str> = ExactDimension::ALL
            .iter()
            .filter(|d| self.exact(**d).is_active())
            .map(|d| d.name())
            .collect();

        let others = [
            ("provinsi", self.provinsi.is_active()),
            ("kota", self.kota.is_active()),
            ("eaCode", !self.ea_code.trim().is_empty()),
            ("bulanExp", self.bulan_exp.is_active()),
            ("bulanTtd", self.bulan_ttd.is_active()),
            ("kunjungan", self.kunjungan.is_active()),
            ("search", !self.search.trim().is_empty()),
        ];
        active.extend(others.iter().filter(|(_, on)| *on).map(|(name, _)| *name));
        active
    }

    /// Inclusion test. Pure: neither the record nor the config is touched.
    pub fn passes(&self, record: &TargetRecord) -> bool {
        let exact_ok = ExactDimension::ALL
            .iter()
            .all(|d| self.exact(*d).matches(d.value(record)));
        if !exact_ok {
            return false;
        }

        if let Selection::Only(wanted) = &self.provinsi {
            if !location_matches(normalize_provinsi(&record.provinsi), normalize_provinsi(wanted)) {
                return false;
            }
        }

        if let Selection::Only(wanted) = &self.kota {
            if !location_matches(normalize_kota(&record.kota), normalize_kota(wanted)) {
                return false;
            }
        }

        let ea_query = self.ea_code.trim().to_lowercase();
        if !ea_query.is_empty() {
            let hit = record
                .ea_code
                .as_deref()
                .map_or(false, |ea| ea.to_lowercase().contains(&ea_query));
            if !hit {
                return false;
            }
        }

        let done_exempt = self.exempt_done_from_expiry && record.is_done();
        if !done_exempt && !self.bulan_exp.admits(record.expiry_month()) {
            return false;
        }

        if !self.bulan_ttd.admits(record.sign_month()) {
            return false;
        }

        if !self.kunjungan.admits(record.visit_month()) {
            return false;
        }

        self.matches_search(record)
    }

    fn matches_search(&self, record: &TargetRecord) -> bool {
        let query = self.search.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        let fields = [
            Some(record.nama_perusahaan.as_str()),
            record.sales.as_deref(),
            record.pic_crm.as_deref(),
        ];
        fields
            .iter()
            .flatten()
            .any(|f| f.to_lowercase().contains(&query))
    }

    /// Records passing every active dimension, in input order
    pub fn apply<'a>(&self, records: &'a [TargetRecord]) -> Vec<&'a TargetRecord> {
        records.iter().filter(|r| self.passes(r)).collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
