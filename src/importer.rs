// 📥 Sheet importer - header row + data rows → canonical target records
//
// The sheet arrives as a 2-D array of cells (row 0 = headers). Columns are
// matched by exact header text against an alias table; anything unmatched is
// ignored. Rows with no company name are skipped, not rejected.

use crate::error::{CrmError, Result};
use crate::model::{CertificateStatus, Category, Channel, Kuadran, Status, TargetRecord, VisitStatus};
use crate::normalize::{
    cell_text, month_number, normalize_currency, normalize_date, normalize_to_date,
    parse_canonical_date, CellValue,
};
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

// ============================================================================
// FIELDS & HEADER ALIASES
// ============================================================================

/// Importable columns. Derived values (trimming/loss) are never imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportField {
    Tahun,
    BulanExpDate,
    Produk,
    PicCrm,
    Sales,
    NamaAssociate,
    DirectOrAssociate,
    NamaPerusahaan,
    Provinsi,
    Kota,
    Alamat,
    Akreditasi,
    CatAkre,
    EaCode,
    Std,
    IaDate,
    ExpDate,
    TahapAudit,
    HargaKontrak,
    BulanTtdNotif,
    HargaTerupdate,
    Cashback,
    Status,
    StatusSertifikat,
    Category,
    Kuadran,
    StatusKunjungan,
    TanggalKunjungan,
}

/// Accepted header labels per field: wire name first, then sheet labels
const HEADER_ALIASES: &[(ImportField, &[&str])] = &[
    (ImportField::Tahun, &["tahun", "TAHUN"]),
    (ImportField::BulanExpDate, &["bulanExpDate", "BULAN EXP DATE", "BULAN EXP"]),
    (ImportField::Produk, &["produk", "PRODUK"]),
    (ImportField::PicCrm, &["picCrm", "PIC CRM", "PIC"]),
    (ImportField::Sales, &["sales", "SALES"]),
    (ImportField::NamaAssociate, &["namaAssociate", "NAMA ASSOCIATE"]),
    (ImportField::DirectOrAssociate, &["directOrAssociate", "DIRECT OR ASSOCIATE", "DIRECT/ASSOCIATE"]),
    (ImportField::NamaPerusahaan, &["namaPerusahaan", "NAMA PERUSAHAAN"]),
    (ImportField::Provinsi, &["provinsi", "PROVINSI"]),
    (ImportField::Kota, &["kota", "KOTA"]),
    (ImportField::Alamat, &["alamat", "ALAMAT"]),
    (ImportField::Akreditasi, &["akreditasi", "AKREDITASI"]),
    (ImportField::CatAkre, &["catAkre", "CAT AKRE"]),
    (ImportField::EaCode, &["eaCode", "EA CODE"]),
    (ImportField::Std, &["std", "STD"]),
    (ImportField::IaDate, &["iaDate", "IA DATE"]),
    (ImportField::ExpDate, &["expDate", "EXP DATE"]),
    (ImportField::TahapAudit, &["tahapAudit", "TAHAP AUDIT"]),
    (ImportField::HargaKontrak, &["hargaKontrak", "HARGA KONTRAK"]),
    (ImportField::BulanTtdNotif, &["bulanTtdNotif", "BULAN TTD NOTIF"]),
    (ImportField::HargaTerupdate, &["hargaTerupdate", "HARGA TERUPDATE"]),
    (ImportField::Cashback, &["cashback", "CASHBACK"]),
    (ImportField::Status, &["status", "STATUS"]),
    (ImportField::StatusSertifikat, &["statusSertifikat", "STATUS SERTIFIKAT"]),
    (ImportField::Category, &["category", "KATEGORI", "CATEGORY"]),
    (ImportField::Kuadran, &["kuadran", "KUADRAN"]),
    (ImportField::StatusKunjungan, &["statusKunjungan", "STATUS KUNJUNGAN"]),
    (ImportField::TanggalKunjungan, &["tanggalKunjungan", "TANGGAL KUNJUNGAN"]),
];

impl ImportField {
    /// Field for a header cell, if any alias matches exactly (after trimming)
    pub fn from_header(header: &str) -> Option<Self> {
        let header = header.trim();
        HEADER_ALIASES
            .iter()
            .find(|(_, aliases)| aliases.contains(&header))
            .map(|(field, _)| *field)
    }

    /// Wire (lower-camel) name, used in issues and validation messages
    pub fn wire_name(&self) -> &'static str {
        HEADER_ALIASES
            .iter()
            .find(|(field, _)| field == self)
            .map(|(_, aliases)| aliases[0])
            .unwrap_or("")
    }
}

/// (column index, field) pairs in header order, built once from the header row
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    columns: Vec<(usize, ImportField)>,
}

impl HeaderMap {
    pub fn from_header_row(header: &[CellValue]) -> Self {
        let mut columns: Vec<(usize, ImportField)> = Vec::new();
        for (idx, cell) in header.iter().enumerate() {
            let Some(text) = cell_text(cell) else { continue };
            match ImportField::from_header(&text) {
                // First occurrence wins if a sheet repeats a column
                Some(field) if !columns.iter().any(|(_, f)| *f == field) => {
                    columns.push((idx, field));
                }
                Some(_) => debug!("Duplicate column '{}' ignored", text),
                None => debug!("Unmapped column '{}' ignored", text),
            }
        }
        HeaderMap { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn has(&self, field: ImportField) -> bool {
        self.columns.iter().any(|(_, f)| *f == field)
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

/// A cell that could not be normalized; the field is left empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportIssue {
    /// 1-based sheet row (the header is row 1)
    pub row: usize,
    pub field: String,
    pub raw: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Mapped {
        record: TargetRecord,
        issues: Vec<ImportIssue>,
    },
    /// Blank company name
    Skipped,
}

/// Map one data row. `row_number` is only used to label issues.
pub fn map_row(headers: &HeaderMap, row: &[CellValue], row_number: usize) -> RowOutcome {
    let mut record = TargetRecord::default();
    let mut issues = Vec::new();

    for (idx, field) in &headers.columns {
        let cell = row.get(*idx).unwrap_or(&CellValue::Empty);
        if cell.is_blank() {
            continue;
        }
        apply_cell(&mut record, *field, cell, row_number, &mut issues);
    }

    if record.nama_perusahaan.trim().is_empty() {
        return RowOutcome::Skipped;
    }

    record.recompute_contract_values();
    RowOutcome::Mapped { record, issues }
}

fn apply_cell(
    record: &mut TargetRecord,
    field: ImportField,
    cell: &CellValue,
    row: usize,
    issues: &mut Vec<ImportIssue>,
) {
    let text = cell_text(cell);
    let mut issue = |message: &str| {
        issues.push(ImportIssue {
            row,
            field: field.wire_name().to_string(),
            raw: text.clone().unwrap_or_default(),
            message: message.to_string(),
        });
    };

    match field {
        ImportField::NamaPerusahaan => record.nama_perusahaan = text.clone().unwrap_or_default(),
        ImportField::Provinsi => record.provinsi = text.clone().unwrap_or_default(),
        ImportField::Kota => record.kota = text.clone().unwrap_or_default(),
        ImportField::Alamat => record.alamat = text.clone().unwrap_or_default(),
        ImportField::Produk => record.produk = text.clone(),
        ImportField::PicCrm => record.pic_crm = text.clone(),
        ImportField::Sales => record.sales = text.clone(),
        ImportField::NamaAssociate => record.nama_associate = text.clone(),
        ImportField::Akreditasi => record.akreditasi = text.clone(),
        ImportField::CatAkre => record.cat_akre = text.clone(),
        ImportField::EaCode => record.ea_code = text.clone(),
        ImportField::Std => record.std = text.clone(),
        ImportField::TahapAudit => record.tahap_audit = text.clone(),

        ImportField::Tahun => match text.as_deref() {
            Some(t) if t.len() == 4 && t.chars().all(|c| c.is_ascii_digit()) => {
                record.tahun = Some(t.to_string())
            }
            _ => issue("Expected a 4-digit year"),
        },

        ImportField::BulanExpDate => match bulan_exp_from_cell(cell) {
            Some(bulan) => record.bulan_exp_date = Some(bulan),
            None => issue("Not a month"),
        },

        ImportField::IaDate => record.ia_date = date_or_issue(cell, &mut issue),
        ImportField::ExpDate => record.exp_date = date_or_issue(cell, &mut issue),
        ImportField::BulanTtdNotif => record.bulan_ttd_notif = date_or_issue(cell, &mut issue),
        ImportField::TanggalKunjungan => record.tanggal_kunjungan = date_or_issue(cell, &mut issue),

        ImportField::HargaKontrak => record.harga_kontrak = amount_or_issue(cell, &mut issue),
        ImportField::HargaTerupdate => record.harga_terupdate = amount_or_issue(cell, &mut issue),
        ImportField::Cashback => record.cashback = amount_or_issue(cell, &mut issue),

        ImportField::Status => {
            record.status = enum_or_issue(text.as_deref(), Status::parse, &mut issue)
        }
        ImportField::StatusSertifikat => {
            record.status_sertifikat =
                enum_or_issue(text.as_deref(), CertificateStatus::parse, &mut issue)
        }
        ImportField::StatusKunjungan => {
            record.status_kunjungan = enum_or_issue(text.as_deref(), VisitStatus::parse, &mut issue)
        }
        ImportField::Category => {
            record.category = enum_or_issue(text.as_deref(), Category::parse, &mut issue)
        }
        ImportField::Kuadran => {
            record.kuadran = enum_or_issue(text.as_deref(), Kuadran::parse, &mut issue)
        }
        ImportField::DirectOrAssociate => {
            record.direct_or_associate = enum_or_issue(text.as_deref(), Channel::parse, &mut issue)
        }
    }
}

/// Keeps month text as typed ("3", "Maret"); a full date cell becomes its month number
fn bulan_exp_from_cell(cell: &CellValue) -> Option<String> {
    if let CellValue::Text(s) = cell {
        let s = s.trim();
        if month_number(s).is_some() && parse_canonical_date(s).is_none() {
            return Some(s.to_string());
        }
    }
    if let CellValue::Number(n) = cell {
        if n.fract() == 0.0 && (1.0..=12.0).contains(n) {
            return Some(format!("{}", *n as u32));
        }
    }
    normalize_to_date(cell).map(|d| d.month().to_string())
}

fn date_or_issue(cell: &CellValue, issue: &mut impl FnMut(&str)) -> Option<NaiveDate> {
    let normalized = normalize_date(cell)?;
    let date = parse_canonical_date(&normalized);
    if date.is_none() {
        issue("Unrecognized date format");
    }
    date
}

fn amount_or_issue(cell: &CellValue, issue: &mut impl FnMut(&str)) -> Option<f64> {
    let amount = normalize_currency(cell);
    if amount.is_none() {
        issue("Not a non-negative amount");
    }
    amount
}

fn enum_or_issue<T>(
    text: Option<&str>,
    parse: fn(&str) -> Option<T>,
    issue: &mut impl FnMut(&str),
) -> Option<T> {
    let value = text.and_then(parse);
    if value.is_none() {
        issue("Unknown value");
    }
    value
}

// ============================================================================
// SHEET PARSING
// ============================================================================

/// Result of mapping a whole sheet, before anything touches the store
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub records: Vec<TargetRecord>,
    /// 1-based sheet rows skipped for a blank company name
    pub skipped_rows: Vec<usize>,
    pub issues: Vec<ImportIssue>,
}

impl ImportReport {
    pub fn summary(&self) -> String {
        format!(
            "{} records mapped, {} rows skipped, {} cell issues",
            self.records.len(),
            self.skipped_rows.len(),
            self.issues.len()
        )
    }
}

/// Map every data row of a sheet (row 0 = headers)
pub fn parse_rows(rows: &[Vec<CellValue>]) -> ImportReport {
    let mut report = ImportReport::default();
    let Some((header, data)) = rows.split_first() else {
        return report;
    };

    let headers = HeaderMap::from_header_row(header);
    debug!("Header row mapped {} of {} columns", headers.len(), header.len());

    for (idx, row) in data.iter().enumerate() {
        let row_number = idx + 2;
        match map_row(&headers, row, row_number) {
            RowOutcome::Mapped { record, issues } => {
                for i in &issues {
                    debug!("Row {}: {} '{}' dropped ({})", i.row, i.field, i.raw, i.message);
                }
                report.records.push(record);
                report.issues.extend(issues);
            }
            RowOutcome::Skipped => {
                debug!("Row {} skipped: blank company name", row_number);
                report.skipped_rows.push(row_number);
            }
        }
    }

    info!("Sheet parsed: {}", report.summary());
    report
}

/// Build a text-only sheet from string rows
pub fn text_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Vec<Vec<CellValue>> {
    rows.iter()
        .map(|row| row.iter().map(|c| CellValue::Text(c.as_ref().to_string())).collect())
        .collect()
}

/// Workbook extensions read through calamine; everything else is read as CSV
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Read a sheet file into the 2-D cell shape (no header handling).
///
/// Workbooks keep numeric cells as numbers, so date cells arrive as serials.
pub fn load_sheet(path: &Path) -> Result<Vec<Vec<CellValue>>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let rows = if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        load_workbook(path)?
    } else {
        load_csv(path)?
    };

    info!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn load_csv(path: &Path) -> Result<Vec<Vec<CellValue>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: Vec<CellValue> = record
            .iter()
            .map(|c| CellValue::Text(c.trim_start_matches('\u{feff}').to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// First worksheet of an Excel/ODS workbook
fn load_workbook(path: &Path) -> Result<Vec<Vec<CellValue>>> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| CrmError::Workbook(format!("{}: {}", path.display(), e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let Some(first) = sheet_names.first() else {
        return Err(CrmError::Workbook(format!("{}: no sheets", path.display())));
    };

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| CrmError::Workbook(format!("sheet '{}': {}", first, e)))?;
    debug!("Reading sheet '{}' ({} of {} sheets)", first, 1, sheet_names.len());

    Ok(rows_from_range(&range))
}

/// Cell grid of a worksheet range
pub fn rows_from_range(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect()
}

/// Workbook cell → CellValue. Date cells become their serial number.
pub fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
