// 📋 Target record - one certification/sales opportunity
//
// Every optional attribute is an explicit Option. Canonical dates are
// NaiveDate, so a stored record can never carry an ambiguous date string.

use crate::normalize::month_number;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CLASSIFICATION ENUMS
// ============================================================================

/// Pipeline status of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "WAITING")]
    Waiting,
    #[serde(rename = "PROSES")]
    Proses,
    #[serde(rename = "DONE")]
    Done,
    #[serde(rename = "SUSPEND")]
    Suspend,
    #[serde(rename = "LOSS")]
    Loss,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Waiting,
        Status::Proses,
        Status::Done,
        Status::Suspend,
        Status::Loss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Waiting => "WAITING",
            Status::Proses => "PROSES",
            Status::Done => "DONE",
            Status::Suspend => "SUSPEND",
            Status::Loss => "LOSS",
        }
    }

    /// Case-insensitive parse of the wire text
    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(text.trim()))
    }
}

/// Certificate issuance state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CertificateStatus {
    #[serde(rename = "Terbit")]
    Terbit,
    #[serde(rename = "Belum Terbit")]
    BelumTerbit,
}

impl CertificateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateStatus::Terbit => "Terbit",
            CertificateStatus::BelumTerbit => "Belum Terbit",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        let text = collapse_spaces(text);
        if text.eq_ignore_ascii_case("terbit") {
            Some(CertificateStatus::Terbit)
        } else if text.eq_ignore_ascii_case("belum terbit") {
            Some(CertificateStatus::BelumTerbit)
        } else {
            None
        }
    }
}

/// Whether the company has been visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VisitStatus {
    #[serde(rename = "VISITED")]
    Visited,
    #[serde(rename = "NOT YET")]
    NotYet,
}

impl VisitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitStatus::Visited => "VISITED",
            VisitStatus::NotYet => "NOT YET",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        let text = collapse_spaces(&text.replace('_', " "));
        if text.eq_ignore_ascii_case("visited") {
            Some(VisitStatus::Visited)
        } else if text.eq_ignore_ascii_case("not yet") {
            Some(VisitStatus::NotYet)
        } else {
            None
        }
    }
}

/// Account tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "GOLD")]
    Gold,
    #[serde(rename = "SILVER")]
    Silver,
    #[serde(rename = "BRONZE")]
    Bronze,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Gold, Category::Silver, Category::Bronze];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Gold => "GOLD",
            Category::Silver => "SILVER",
            Category::Bronze => "BRONZE",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(text.trim()))
    }
}

/// Priority quadrant K1..K4
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Kuadran {
    K1,
    K2,
    K3,
    K4,
}

impl Kuadran {
    pub const ALL: [Kuadran; 4] = [Kuadran::K1, Kuadran::K2, Kuadran::K3, Kuadran::K4];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kuadran::K1 => "K1",
            Kuadran::K2 => "K2",
            Kuadran::K3 => "K3",
            Kuadran::K4 => "K4",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(text.trim()))
    }
}

/// Sales channel: sold directly or through an associate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "DIRECT")]
    Direct,
    #[serde(rename = "ASSOCIATE")]
    Associate,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Direct => "DIRECT",
            Channel::Associate => "ASSOCIATE",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_uppercase().as_str() {
            "DIRECT" => Some(Channel::Direct),
            "ASSOCIATE" => Some(Channel::Associate),
            _ => None,
        }
    }
}

fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// TARGET RECORD
// ============================================================================

/// The calendar-date fields of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateField {
    IaDate,
    ExpDate,
    BulanTtdNotif,
    TanggalKunjungan,
}

/// Target record. `id` is `None` until the record store assigns one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    // Temporal
    #[serde(default)]
    pub tahun: Option<String>,
    #[serde(default)]
    pub bulan_exp_date: Option<String>,
    #[serde(default)]
    pub ia_date: Option<NaiveDate>,
    #[serde(default)]
    pub exp_date: Option<NaiveDate>,
    #[serde(default)]
    pub bulan_ttd_notif: Option<NaiveDate>,
    #[serde(default)]
    pub tanggal_kunjungan: Option<NaiveDate>,

    // Classification
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub status_sertifikat: Option<CertificateStatus>,
    #[serde(default)]
    pub status_kunjungan: Option<VisitStatus>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub kuadran: Option<Kuadran>,
    #[serde(default)]
    pub direct_or_associate: Option<Channel>,
    #[serde(default)]
    pub produk: Option<String>,
    #[serde(default)]
    pub tahap_audit: Option<String>,

    // Company & location
    #[serde(default)]
    pub nama_perusahaan: String,
    #[serde(default)]
    pub provinsi: String,
    #[serde(default)]
    pub kota: String,
    #[serde(default)]
    pub alamat: String,

    // People
    #[serde(default)]
    pub pic_crm: Option<String>,
    #[serde(default)]
    pub sales: Option<String>,
    #[serde(default)]
    pub nama_associate: Option<String>,

    // Certification metadata
    #[serde(default)]
    pub akreditasi: Option<String>,
    #[serde(default)]
    pub cat_akre: Option<String>,
    #[serde(default)]
    pub ea_code: Option<String>,
    #[serde(default)]
    pub std: Option<String>,

    // Money
    #[serde(default)]
    pub harga_kontrak: Option<f64>,
    #[serde(default)]
    pub harga_terupdate: Option<f64>,
    #[serde(default)]
    pub trimming_value: Option<f64>,
    #[serde(default)]
    pub loss_value: Option<f64>,
    #[serde(default)]
    pub cashback: Option<f64>,

    // Bookkeeping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "created_by", skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl TargetRecord {
    /// Start a record with the four required fields filled in
    pub fn new(
        nama_perusahaan: impl Into<String>,
        provinsi: impl Into<String>,
        kota: impl Into<String>,
        alamat: impl Into<String>,
    ) -> Self {
        TargetRecord {
            nama_perusahaan: nama_perusahaan.into(),
            provinsi: provinsi.into(),
            kota: kota.into(),
            alamat: alamat.into(),
            ..Default::default()
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn date(&self, field: DateField) -> Option<NaiveDate> {
        match field {
            DateField::IaDate => self.ia_date,
            DateField::ExpDate => self.exp_date,
            DateField::BulanTtdNotif => self.bulan_ttd_notif,
            DateField::TanggalKunjungan => self.tanggal_kunjungan,
        }
    }

    /// Expiry month from `bulanExpDate` ("3", "03", "Maret", "Mar")
    pub fn expiry_month(&self) -> Option<u32> {
        self.bulan_exp_date.as_deref().and_then(month_number)
    }

    /// Month of the sign/notification date
    pub fn sign_month(&self) -> Option<u32> {
        self.bulan_ttd_notif.map(|d| d.month())
    }

    pub fn visit_month(&self) -> Option<u32> {
        self.tanggal_kunjungan.map(|d| d.month())
    }

    pub fn is_done(&self) -> bool {
        self.status == Some(Status::Done)
    }

    /// Recompute trimming/loss from contract and updated price.
    ///
    /// A missing updated price counts as unchanged from the contract; a
    /// missing contract price counts as 0.
    pub fn recompute_contract_values(&mut self) {
        let (trimming, loss) = contract_delta(self.harga_kontrak, self.harga_terupdate);
        self.trimming_value = Some(trimming);
        self.loss_value = Some(loss);
    }

    /// Builder: set contract and updated prices, recomputing derived values
    pub fn with_prices(mut self, kontrak: f64, terupdate: Option<f64>) -> Self {
        self.harga_kontrak = Some(kontrak);
        self.harga_terupdate = terupdate;
        self.recompute_contract_values();
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Stamp `updatedAt` with the current time
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

/// (trimmingValue, lossValue) for a pair of prices. At most one is non-zero.
pub fn contract_delta(kontrak: Option<f64>, terupdate: Option<f64>) -> (f64, f64) {
    let contract = kontrak.unwrap_or(0.0);
    let updated = terupdate.unwrap_or(contract);
    let trimming = (updated - contract).max(0.0);
    let loss = (contract - updated).max(0.0);
    (trimming, loss)
}

// ============================================================================
// TESTS
// ============================================================================
