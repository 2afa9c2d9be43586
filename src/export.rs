// 📤 Sheet export - records → the spreadsheet layout the importer reads back
//
// Header labels are the sheet labels the importer accepts, so an exported file
// can be re-imported as-is. Money is written in whole currency units.

use crate::aggregate::round_currency;
use crate::error::Result;
use crate::model::TargetRecord;
use chrono::NaiveDate;
use std::path::Path;
use tracing::info;

/// Column order of an exported sheet
pub const EXPORT_HEADERS: [&str; 31] = [
    "NO",
    "TAHUN",
    "BULAN EXP DATE",
    "PRODUK",
    "PIC CRM",
    "SALES",
    "NAMA ASSOCIATE",
    "DIRECT OR ASSOCIATE",
    "NAMA PERUSAHAAN",
    "PROVINSI",
    "KOTA",
    "ALAMAT",
    "AKREDITASI",
    "CAT AKRE",
    "EA CODE",
    "STD",
    "IA DATE",
    "EXP DATE",
    "TAHAP AUDIT",
    "HARGA KONTRAK",
    "BULAN TTD NOTIF",
    "HARGA TERUPDATE",
    "TRIMMING VALUE",
    "LOSS VALUE",
    "CASHBACK",
    "STATUS",
    "STATUS SERTIFIKAT",
    "KATEGORI",
    "KUADRAN",
    "STATUS KUNJUNGAN",
    "TANGGAL KUNJUNGAN",
];

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn date(value: Option<NaiveDate>) -> String {
    value.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

fn money(value: Option<f64>) -> String {
    value.map(|v| format!("{:.0}", round_currency(v))).unwrap_or_default()
}

fn label(value: Option<&'static str>) -> String {
    value.unwrap_or_default().to_string()
}

/// One sheet row; `no` is the 1-based running number
pub fn export_row(no: usize, r: &TargetRecord) -> Vec<String> {
    vec![
        no.to_string(),
        text(&r.tahun),
        text(&r.bulan_exp_date),
        text(&r.produk),
        text(&r.pic_crm),
        text(&r.sales),
        text(&r.nama_associate),
        label(r.direct_or_associate.map(|c| c.as_str())),
        r.nama_perusahaan.clone(),
        r.provinsi.clone(),
        r.kota.clone(),
        r.alamat.clone(),
        text(&r.akreditasi),
        text(&r.cat_akre),
        text(&r.ea_code),
        text(&r.std),
        date(r.ia_date),
        date(r.exp_date),
        text(&r.tahap_audit),
        money(r.harga_kontrak),
        date(r.bulan_ttd_notif),
        money(r.harga_terupdate),
        money(r.trimming_value),
        money(r.loss_value),
        money(r.cashback),
        label(r.status.map(|s| s.as_str())),
        label(r.status_sertifikat.map(|s| s.as_str())),
        label(r.category.map(|c| c.as_str())),
        label(r.kuadran.map(|k| k.as_str())),
        label(r.status_kunjungan.map(|s| s.as_str())),
        date(r.tanggal_kunjungan),
    ]
}

/// Header row followed by one row per record
pub fn export_rows<'a, I>(records: I) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = &'a TargetRecord>,
{
    let mut rows = vec![EXPORT_HEADERS.iter().map(|h| h.to_string()).collect()];
    rows.extend(
        records
            .into_iter()
            .enumerate()
            .map(|(idx, r)| export_row(idx + 1, r)),
    );
    rows
}

/// Write the export to any writer as CSV
pub fn write_csv<'a, W, I>(writer: W, records: I) -> Result<usize>
where
    W: std::io::Write,
    I: IntoIterator<Item = &'a TargetRecord>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    let rows = export_rows(records);
    for row in &rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(rows.len() - 1)
}

pub fn export_to_file<'a, I>(path: &Path, records: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a TargetRecord>,
{
    let file = std::fs::File::create(path)?;
    let count = write_csv(file, records)?;
    info!("Exported {} records to {}", count, path.display());
    Ok(count)
}

// ============================================================================
// TESTS
// ============================================================================
