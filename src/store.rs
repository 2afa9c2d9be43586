// 🗄️ Record store seam + the operations the dashboard runs against it
//
// The real store is an external hosted database; this crate only sees the
// RecordStore trait. InMemoryStore backs the CLI and the tests.

use crate::batch::{BatchExecutor, BatchResult};
use crate::error::{CrmError, Precondition, Result};
use crate::importer::{parse_rows, ImportIssue};
use crate::model::TargetRecord;
use crate::normalize::CellValue;
use crate::validation::{validate_for_persist, ValidationError};
use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info};

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Collaborator contract. Each call either succeeds or returns an error;
/// callers treat every call as an independent unit of work.
pub trait RecordStore {
    fn list_all(&self) -> Result<Vec<TargetRecord>>;

    /// Persist a new record; the store assigns `id` and timestamps
    fn create(&mut self, record: TargetRecord) -> Result<TargetRecord>;

    /// Replace the record with the same `id`
    fn update(&mut self, record: TargetRecord) -> Result<TargetRecord>;

    fn delete(&mut self, id: &str) -> Result<()>;

    /// All-or-nothing insert of several records
    fn bulk_create(&mut self, records: Vec<TargetRecord>) -> Result<Vec<TargetRecord>>;

    /// Remove everything; returns how many records were deleted
    fn delete_all(&mut self) -> Result<usize>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Vec-backed store, insertion ordered
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Vec<TargetRecord>,
    /// Ids or company names whose calls should fail
    failing: HashSet<String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call touching this id or company name fail
    pub fn fail_on(&mut self, key: impl Into<String>) {
        self.failing.insert(key.into());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TargetRecord> {
        self.records.iter().find(|r| r.id.as_deref() == Some(id))
    }

    fn check(&self, key: &str) -> Result<()> {
        if self.failing.contains(key) {
            Err(CrmError::Store(format!("simulated failure for '{}'", key)))
        } else {
            Ok(())
        }
    }
}

impl RecordStore for InMemoryStore {
    fn list_all(&self) -> Result<Vec<TargetRecord>> {
        Ok(self.records.clone())
    }

    fn create(&mut self, mut record: TargetRecord) -> Result<TargetRecord> {
        self.check(&record.nama_perusahaan)?;

        let now = Utc::now();
        record.id = Some(uuid::Uuid::new_v4().to_string());
        record.created_at = Some(now);
        record.updated_at = Some(now);

        self.records.push(record.clone());
        Ok(record)
    }

    fn update(&mut self, mut record: TargetRecord) -> Result<TargetRecord> {
        let id = record
            .id
            .clone()
            .ok_or_else(|| CrmError::NotFound("record has no id".to_string()))?;
        self.check(&id)?;

        let existing = self
            .records
            .iter_mut()
            .find(|r| r.id.as_deref() == Some(id.as_str()))
            .ok_or_else(|| CrmError::NotFound(id.clone()))?;

        record.created_at = existing.created_at;
        record.created_by = existing.created_by.clone();
        record.updated_at = Some(Utc::now());
        *existing = record.clone();
        Ok(record)
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        self.check(id)?;

        let before = self.records.len();
        self.records.retain(|r| r.id.as_deref() != Some(id));
        if self.records.len() == before {
            return Err(CrmError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn bulk_create(&mut self, records: Vec<TargetRecord>) -> Result<Vec<TargetRecord>> {
        for r in &records {
            self.check(&r.nama_perusahaan)?;
        }
        records.into_iter().map(|r| self.create(r)).collect()
    }

    fn delete_all(&mut self) -> Result<usize> {
        let count = self.records.len();
        self.records.clear();
        Ok(count)
    }
}

// ============================================================================
// TARGET SERVICE
// ============================================================================

/// What an import did, for the end-of-import message
#[derive(Debug)]
pub struct ImportSummary {
    pub skipped_rows: Vec<usize>,
    pub issues: Vec<ImportIssue>,
    pub batch: BatchResult<TargetRecord, TargetRecord>,
}

impl ImportSummary {
    pub fn success_count(&self) -> usize {
        self.batch.success_count()
    }

    pub fn error_count(&self) -> usize {
        self.batch.error_count()
    }

    pub fn message(&self) -> String {
        format!(
            "Import finished: {} saved, {} failed, {} blank rows skipped",
            self.success_count(),
            self.error_count(),
            self.skipped_rows.len()
        )
    }
}

/// Create/update/delete/import against any RecordStore
pub struct TargetService<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> TargetService<S> {
    pub fn new(store: S) -> Self {
        TargetService { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn list(&self) -> Result<Vec<TargetRecord>> {
        self.store.list_all()
    }

    /// Single form entry
    pub fn create(&mut self, record: TargetRecord, user: &str) -> Result<TargetRecord> {
        let record = prepare(record, Some(user));
        validate_for_persist(&record).map_err(CrmError::Validation)?;
        self.store.create(record)
    }

    /// Multi-row form entry: every row is validated before anything is written
    pub fn create_many(&mut self, records: Vec<TargetRecord>, user: &str) -> Result<Vec<TargetRecord>> {
        let records: Vec<TargetRecord> = records.into_iter().map(|r| prepare(r, Some(user))).collect();

        let mut errors = Vec::new();
        for (idx, record) in records.iter().enumerate() {
            if let Err(row_errors) = validate_for_persist(record) {
                errors.extend(row_errors.into_iter().map(|e| ValidationError {
                    field: format!("row {} {}", idx + 1, e.field),
                    message: e.message,
                }));
            }
        }
        if !errors.is_empty() {
            return Err(CrmError::Validation(errors));
        }

        self.store.bulk_create(records)
    }

    /// Inline edit. Derived values are recomputed before saving.
    pub fn update(&mut self, record: TargetRecord) -> Result<TargetRecord> {
        if !record.is_persisted() {
            return Err(CrmError::NotFound("record has no id".to_string()));
        }
        let mut record = prepare(record, None);
        validate_for_persist(&record).map_err(CrmError::Validation)?;
        record.touch();
        self.store.update(record)
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        self.store.delete(id)
    }

    /// Delete the selected ids one by one; failures are tallied, not raised
    pub fn delete_many(&mut self, ids: Vec<String>) -> BatchResult<String, String> {
        let store = &mut self.store;
        BatchExecutor::new("bulk delete").run(ids, |id| {
            store.delete(id)?;
            Ok(id.clone())
        })
    }

    pub fn delete_all(&mut self) -> Result<usize> {
        let count = self.store.delete_all()?;
        info!("Deleted all {} records", count);
        Ok(count)
    }

    /// Import a parsed sheet as `user`.
    ///
    /// Refused outright (no store call) when the sheet is empty, no user is
    /// identified, or every row is blank. Otherwise each row is created on
    /// its own and failures are tallied.
    pub fn import_sheet(&mut self, rows: &[Vec<CellValue>], user: Option<&str>) -> Result<ImportSummary> {
        if rows.is_empty() {
            return Err(Precondition::NoFile.into());
        }
        let user = match user.map(str::trim) {
            Some(u) if !u.is_empty() => u,
            _ => return Err(Precondition::NoUser.into()),
        };

        let report = parse_rows(rows);
        if report.records.is_empty() {
            return Err(Precondition::EmptyImport.into());
        }

        let store = &mut self.store;
        let records: Vec<TargetRecord> = report
            .records
            .into_iter()
            .map(|r| prepare(r, Some(user)))
            .collect();

        let batch = BatchExecutor::new("import").run(records, |record| {
            validate_for_persist(record).map_err(CrmError::Validation)?;
            store.create(record.clone())
        });

        let summary = ImportSummary {
            skipped_rows: report.skipped_rows,
            issues: report.issues,
            batch,
        };
        info!("{}", summary.message());
        Ok(summary)
    }
}

/// Trim required text, recompute derived money, stamp the creator
fn prepare(mut record: TargetRecord, user: Option<&str>) -> TargetRecord {
    for field in [
        &mut record.nama_perusahaan,
        &mut record.provinsi,
        &mut record.kota,
        &mut record.alamat,
    ] {
        let trimmed = field.trim();
        if trimmed.len() != field.len() {
            *field = trimmed.to_string();
        }
    }

    record.recompute_contract_values();

    if let Some(user) = user {
        if record.created_by.is_none() {
            debug!("Stamping created_by={} on '{}'", user, record.nama_perusahaan);
            record.created_by = Some(user.to_string());
        }
    }
    record
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::text_rows;

    fn valid_record(name: &str) -> TargetRecord {
        TargetRecord::new(name, "Jawa Tengah", "Semarang", "Jl. Pandanaran 5").with_prices(1_000.0, None)
    }

    fn seeded_service(n: usize) -> (TargetService<InMemoryStore>, Vec<String>) {
        let mut service = TargetService::new(InMemoryStore::new());
        let ids = (0..n)
            .map(|i| {
                service
                    .create(valid_record(&format!("PT {}", i)), "user-1")
                    .unwrap()
                    .id
                    .unwrap()
            })
            .collect();
        (service, ids)
    }

    #[test]
    fn test_create_assigns_identity_and_creator() {
        let mut service = TargetService::new(InMemoryStore::new());

        let saved = service.create(valid_record("  PT Baru  "), "user-7").unwrap();

        assert!(saved.id.is_some());
        assert!(saved.created_at.is_some());
        assert_eq!(saved.created_by.as_deref(), Some("user-7"));
        assert_eq!(saved.nama_perusahaan, "PT Baru");
        assert_eq!(service.list().unwrap().len(), 1);
    }

    #[test]
    fn test_create_rejects_invalid_record_before_store_call() {
        let mut store = InMemoryStore::new();
        store.fail_on("");
        let mut service = TargetService::new(store);

        let err = service
            .create(TargetRecord::new("", "Bali", "", "Jl. 1"), "user-1")
            .unwrap_err();

        // Validation error, not the injected store failure
        assert!(matches!(err, CrmError::Validation(ref e) if e.len() == 2));
        assert!(service.store().is_empty());
    }

    #[test]
    fn test_create_many_is_all_or_nothing() {
        let mut service = TargetService::new(InMemoryStore::new());
        let rows = vec![valid_record("PT A"), TargetRecord::new("PT B", "", "Solo", "Jl. 2")];

        let err = service.create_many(rows, "user-1").unwrap_err();

        match err {
            CrmError::Validation(errors) => assert_eq!(errors[0].field, "row 2 provinsi"),
            other => panic!("unexpected error: {}", other),
        }
        assert!(service.store().is_empty());

        let saved = service
            .create_many(vec![valid_record("PT A"), valid_record("PT B")], "user-1")
            .unwrap();
        assert_eq!(saved.len(), 2);
    }

    #[test]
    fn test_update_recomputes_derived_values() {
        let (mut service, ids) = seeded_service(1);
        let mut record = service.store().get(&ids[0]).unwrap().clone();
        record.harga_terupdate = Some(600.0);
        record.created_by = None;

        let saved = service.update(record).unwrap();

        assert_eq!(saved.loss_value, Some(400.0));
        assert_eq!(saved.trimming_value, Some(0.0));
        assert_eq!(saved.created_by.as_deref(), Some("user-1"));
    }

    #[test]
    fn test_update_unknown_id() {
        let mut service = TargetService::new(InMemoryStore::new());
        let mut record = valid_record("PT X");
        record.id = Some("missing".to_string());

        assert!(matches!(service.update(record), Err(CrmError::NotFound(_))));
        assert!(matches!(service.update(valid_record("PT Y")), Err(CrmError::NotFound(_))));
    }

    #[test]
    fn test_bulk_delete_tolerates_one_failure() {
        let (service, ids) = seeded_service(5);
        let mut store = service.into_store();
        store.fail_on(ids[2].clone());
        let mut service = TargetService::new(store);

        let result = service.delete_many(ids.clone());

        assert_eq!(result.success_count(), 4);
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.failed[0].item, ids[2]);
        assert_eq!(service.store().len(), 1);
    }

    #[test]
    fn test_delete_all() {
        let (mut service, _) = seeded_service(3);
        assert_eq!(service.delete_all().unwrap(), 3);
        assert!(service.list().unwrap().is_empty());
    }

    #[test]
    fn test_import_preconditions() {
        let mut service = TargetService::new(InMemoryStore::new());
        let rows = text_rows(&[
            vec!["NAMA PERUSAHAAN", "PROVINSI", "KOTA", "ALAMAT"],
            vec!["PT A", "Bali", "Denpasar", "Jl. 1"],
        ]);
        let blank = text_rows(&[vec!["NAMA PERUSAHAAN", "KOTA"], vec!["", "Denpasar"]]);

        let no_file = service.import_sheet(&[], Some("user-1")).unwrap_err();
        let no_user = service.import_sheet(&rows, None).unwrap_err();
        let blank_user = service.import_sheet(&rows, Some("  ")).unwrap_err();
        let empty = service.import_sheet(&blank, Some("user-1")).unwrap_err();

        assert!(matches!(no_file, CrmError::Precondition(Precondition::NoFile)));
        assert!(matches!(no_user, CrmError::Precondition(Precondition::NoUser)));
        assert!(matches!(blank_user, CrmError::Precondition(Precondition::NoUser)));
        assert!(matches!(empty, CrmError::Precondition(Precondition::EmptyImport)));
        assert!(service.store().is_empty());
    }

    #[test]
    fn test_import_tallies_per_row_failures() {
        let mut store = InMemoryStore::new();
        store.fail_on("PT Gagal");
        let mut service = TargetService::new(store);
        let rows = text_rows(&[
            vec!["NAMA PERUSAHAAN", "PROVINSI", "KOTA", "ALAMAT", "HARGA KONTRAK"],
            vec!["PT A", "Bali", "Denpasar", "Jl. 1", "1.000.000"],
            vec!["PT Gagal", "Bali", "Badung", "Jl. 2", "2.000.000"],
            vec!["", "Bali", "Tabanan", "Jl. 3", "3.000.000"],
            vec!["PT Tanpa Alamat", "Bali", "Gianyar", "", "4.000.000"],
            vec!["PT D", "Bali", "Bangli", "Jl. 5", "-"],
        ]);

        let summary = service.import_sheet(&rows, Some("user-9")).unwrap();

        assert_eq!(summary.success_count(), 2);
        assert_eq!(summary.error_count(), 2);
        assert_eq!(summary.skipped_rows, vec![4]);
        assert!(matches!(summary.batch.failed[0].error, CrmError::Store(_)));
        assert!(matches!(summary.batch.failed[1].error, CrmError::Validation(_)));

        let stored = service.list().unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|r| r.created_by.as_deref() == Some("user-9")));
        assert_eq!(stored[1].harga_kontrak, None);
    }
}
