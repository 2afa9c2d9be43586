// 📐 Shape checks before a record goes to the store
// Runs before any external call so a bad record never causes a partial write.

use crate::model::TargetRecord;
use crate::normalize::month_number;

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate a record destined for create/update
pub fn validate_for_persist(record: &TargetRecord) -> ValidationResult {
    let mut errors = Vec::new();

    let required = [
        ("namaPerusahaan", &record.nama_perusahaan),
        ("provinsi", &record.provinsi),
        ("kota", &record.kota),
        ("alamat", &record.alamat),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "Required field is empty"));
        }
    }

    let amounts = [
        ("hargaKontrak", record.harga_kontrak),
        ("hargaTerupdate", record.harga_terupdate),
        ("trimmingValue", record.trimming_value),
        ("lossValue", record.loss_value),
        ("cashback", record.cashback),
    ];
    for (field, value) in amounts {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                errors.push(ValidationError {
                    field: field.to_string(),
                    message: format!("Must be a non-negative amount, got {}", v),
                });
            }
        }
    }

    if let (Some(t), Some(l)) = (record.trimming_value, record.loss_value) {
        if t > 0.0 && l > 0.0 {
            errors.push(ValidationError::new(
                "trimmingValue",
                "Trimming and loss cannot both be non-zero",
            ));
        }
    }

    if let Some(tahun) = &record.tahun {
        if tahun.len() != 4 || !tahun.chars().all(|c| c.is_ascii_digit()) {
            errors.push(ValidationError {
                field: "tahun".to_string(),
                message: format!("Expected a 4-digit year, got '{}'", tahun),
            });
        }
    }

    if let Some(bulan) = &record.bulan_exp_date {
        if month_number(bulan).is_none() {
            errors.push(ValidationError {
                field: "bulanExpDate".to_string(),
                message: format!("Not a month: '{}'", bulan),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
