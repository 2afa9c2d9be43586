// Target Report - Core Library
// Record normalization, filtering and monthly aggregation for certification targets

pub mod model;      // Target record + classification enums
pub mod normalize;  // Date / currency / month normalizers
pub mod importer;   // Sheet rows → records
pub mod validation; // Required fields + money invariants
pub mod filter;     // Filter predicate engine
pub mod aggregate;  // Bucketing + achievement ratios
pub mod batch;      // Per-item tolerant batch executor
pub mod store;      // Record store seam + service
pub mod export;     // Records → sheet
pub mod config;     // AppConfig (JSON + env)
pub mod error;

// Re-export commonly used types
pub use model::{
    CertificateStatus, Category, Channel, DateField, Kuadran, Status, TargetRecord, VisitStatus,
    contract_delta,
};
pub use normalize::{
    CellValue, month_name, month_number, normalize_currency, normalize_date, normalize_to_date,
};
pub use importer::{
    ImportField, ImportIssue, ImportReport, HeaderMap, RowOutcome,
    load_sheet, map_row, parse_rows,
};
pub use validation::{ValidationError, ValidationResult, validate_for_persist};
pub use filter::{ExactDimension, FilterConfig, MonthRange, Selection, normalize_kota, normalize_provinsi};
pub use aggregate::{
    Achievement, AchievementReport, BucketSummary, Metric, MonthlyTargets, PresentedBucket, Totals,
    MONTHS, achievement, aggregate, aggregate_by_month, status_breakdown,
};
pub use batch::{BatchExecutor, BatchFailure, BatchResult};
pub use store::{ImportSummary, InMemoryStore, RecordStore, TargetService};
pub use export::{EXPORT_HEADERS, export_rows, export_to_file, write_csv};
pub use config::AppConfig;
pub use error::{CrmError, Precondition, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
