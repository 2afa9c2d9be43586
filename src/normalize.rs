// 🧹 Record Normalizer - raw spreadsheet cells → canonical values
//
// Every function here is pure and total: bad input degrades to None (or to
// the trimmed input for dates), it never errors. Normalizing an already
// canonical value returns it unchanged.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

// ============================================================================
// CELL VALUE
// ============================================================================

/// One cell of an already-parsed sheet. Row 0 of a sheet holds the headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Empty, whitespace-only, or a lone placeholder dash
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(n) => !n.is_finite(),
            CellValue::Text(s) => is_blank_text(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

fn is_blank_text(s: &str) -> bool {
    s.chars().all(|c| c.is_whitespace() || c == '-')
}

/// Cell as trimmed text; None when blank. Integral numbers print without ".0".
pub fn cell_text(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Empty => None,
        CellValue::Number(n) if !n.is_finite() => None,
        CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
        CellValue::Number(n) => Some(n.to_string()),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if is_blank_text(trimmed) {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
    }
}

// ============================================================================
// MONTHS
// ============================================================================

/// Month names accepted by prefix, Indonesian first
const MONTH_NAMES: [(u32, &[&str]); 12] = [
    (1, &["januari", "january"]),
    (2, &["februari", "february", "pebruari"]),
    (3, &["maret", "march"]),
    (4, &["april"]),
    (5, &["mei", "may"]),
    (6, &["juni", "june"]),
    (7, &["juli", "july"]),
    (8, &["agustus", "august"]),
    (9, &["september"]),
    (10, &["oktober", "october"]),
    (11, &["november", "nopember"]),
    (12, &["desember", "december"]),
];

const DISPLAY_NAMES: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus", "September",
    "Oktober", "November", "Desember",
];

/// Month number from "3", "03", "Mar", "Maret", "march", "2025-03-01".
///
/// Names need at least three letters and match by prefix, case-insensitive.
pub fn month_number(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.chars().all(|c| c.is_ascii_digit()) {
        return text.parse::<u32>().ok().filter(|m| (1..=12).contains(m));
    }

    if let Some(date) = parse_canonical_date(text) {
        return Some(chrono::Datelike::month(&date));
    }

    let name = text
        .trim_end_matches(|c: char| !c.is_alphabetic())
        .to_lowercase();
    month_from_name(&name)
}

fn month_from_name(name: &str) -> Option<u32> {
    if name.chars().count() < 3 || !name.chars().all(|c| c.is_alphabetic()) {
        return None;
    }
    MONTH_NAMES
        .iter()
        .find(|(_, names)| names.iter().any(|full| full.starts_with(name)))
        .map(|(m, _)| *m)
}

/// Indonesian display name for a month number (1-12)
pub fn month_name(month: u32) -> &'static str {
    match month {
        1..=12 => DISPLAY_NAMES[(month - 1) as usize],
        _ => "-",
    }
}

// ============================================================================
// DATES
// ============================================================================

/// Strict `YYYY-MM-DD`, calendar-valid
pub fn parse_canonical_date(text: &str) -> Option<NaiveDate> {
    if !is_canonical_shape(text) {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

fn is_canonical_shape(text: &str) -> bool {
    let b = text.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit())
}

/// Spreadsheet serial day → date, counted from 1900-01-01 with the −2
/// offset of the 1900 leap-year bug. Kept as-is so dates already imported
/// through this path keep matching.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > 2_958_465.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1900, 1, 1)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64 - 2))
}

/// Normalize a date cell to `YYYY-MM-DD`.
///
/// First matching rule wins:
/// 1. `YYYY-MM-DD` passes through
/// 2. numeric cell → spreadsheet serial date
/// 3. `D/M/YYYY` or `D-M-YYYY` → day first
/// 4. second group > 12 → read as `M/D/YYYY`
/// 5. `YYYY-M` / `YYYY/M` → first of the month
/// 6. month name + 4-digit year (`Mar-2025`, `Maret 2025`) → first of the month
/// 7. anything else → trimmed input unchanged
///
/// Blank input gives None. `03/04/2025` is genuinely ambiguous and reads as
/// 3 April; only a group above 12 can flip the order.
pub fn normalize_date(cell: &CellValue) -> Option<String> {
    let text = match cell {
        CellValue::Empty => return None,
        CellValue::Number(n) => {
            return match serial_to_date(*n) {
                Some(date) => Some(date.format("%Y-%m-%d").to_string()),
                None => cell_text(cell),
            };
        }
        CellValue::Text(s) => s.trim(),
    };

    if is_blank_text(text) {
        return None;
    }

    if is_canonical_shape(text) {
        return Some(text.to_string());
    }

    if let Some(date) = parse_day_month_year(text) {
        return Some(date.format("%Y-%m-%d").to_string());
    }

    if let Some((year, month)) = parse_year_month(text) {
        return Some(format!("{:04}-{:02}-01", year, month));
    }

    if let Some((year, month)) = parse_month_name_year(text) {
        return Some(format!("{:04}-{:02}-01", year, month));
    }

    Some(text.to_string())
}

/// Convenience for plain strings (form input)
pub fn normalize_date_str(text: &str) -> Option<String> {
    normalize_date(&CellValue::Text(text.to_string()))
}

/// Normalize straight to a date; None for blank or unparseable input
pub fn normalize_to_date(cell: &CellValue) -> Option<NaiveDate> {
    normalize_date(cell).and_then(|s| parse_canonical_date(&s))
}

fn numeric_groups<'a>(text: &'a str, separators: &[char]) -> Option<Vec<&'a str>> {
    let groups: Vec<&str> = text.split(|c| separators.contains(&c)).collect();
    if groups
        .iter()
        .all(|g| !g.is_empty() && g.chars().all(|c| c.is_ascii_digit()))
    {
        Some(groups)
    } else {
        None
    }
}

fn parse_day_month_year(text: &str) -> Option<NaiveDate> {
    let sep = if text.contains('/') { '/' } else { '-' };
    let groups = numeric_groups(text, &[sep])?;
    if groups.len() != 3 || groups[2].len() != 4 || groups[0].len() > 2 || groups[1].len() > 2 {
        return None;
    }

    let first: u32 = groups[0].parse().ok()?;
    let second: u32 = groups[1].parse().ok()?;
    let year: i32 = groups[2].parse().ok()?;

    let (day, month) = if second <= 12 {
        (first, second)
    } else {
        (second, first)
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_year_month(text: &str) -> Option<(i32, u32)> {
    let groups = numeric_groups(text, &['-', '/'])?;
    if groups.len() != 2 || groups[0].len() != 4 || groups[1].len() > 2 {
        return None;
    }
    let year: i32 = groups[0].parse().ok()?;
    let month: u32 = groups[1].parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

fn parse_month_name_year(text: &str) -> Option<(i32, u32)> {
    let name_end = text
        .char_indices()
        .find(|(_, c)| !c.is_alphabetic())
        .map(|(i, _)| i)?;
    let (name, rest) = text.split_at(name_end);

    let year = rest.trim_start_matches(|c: char| c.is_whitespace() || "-/.,".contains(c));
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let month = month_from_name(&name.to_lowercase())?;
    Some((year.parse().ok()?, month))
}

// ============================================================================
// CURRENCY
// ============================================================================

/// Normalize a money cell to a non-negative amount.
///
/// Quotes, whitespace and an `Rp`/`IDR` prefix are dropped, `,` is a
/// thousands separator, and a dotted `1.500.000` grouping is read as
/// thousands too. Anything that still fails to parse, or is negative, is None.
pub fn normalize_currency(cell: &CellValue) -> Option<f64> {
    let raw = match cell {
        CellValue::Empty => return None,
        CellValue::Number(n) => return Some(*n).filter(|n| n.is_finite() && *n >= 0.0),
        CellValue::Text(s) => s,
    };

    let mut text: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '"' && *c != '\'')
        .collect();

    if text.is_empty() || text == "-" {
        return None;
    }

    for prefix in ["rp.", "rp", "idr"] {
        if text.to_lowercase().starts_with(prefix) {
            text = text[prefix.len()..].to_string();
            break;
        }
    }

    let mut text = text.replace(',', "");
    if is_dot_grouped(&text) {
        text = text.replace('.', "");
    }

    text.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 0.0)
}

/// Convenience for plain strings (form input)
pub fn normalize_currency_str(text: &str) -> Option<f64> {
    normalize_currency(&CellValue::Text(text.to_string()))
}

/// "1.500", "12.000.000": dot used as a thousands separator
fn is_dot_grouped(text: &str) -> bool {
    let groups: Vec<&str> = text.split('.').collect();
    groups.len() >= 2
        && (1..=3).contains(&groups[0].len())
        && groups[1..].iter().all(|g| g.len() == 3)
        && groups.iter().all(|g| g.chars().all(|c| c.is_ascii_digit()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_canonical_date_passthrough() {
        for d in ["2025-03-15", "1999-12-31", "2024-02-29"] {
            assert_eq!(normalize_date(&text(d)), Some(d.to_string()));
        }
    }

    #[test]
    fn test_normalize_date_is_idempotent() {
        let inputs = ["15/03/2025", "2025-3", "Mar-2025", "3/25/2025", "Agustus 2024"];
        for input in inputs {
            let once = normalize_date(&text(input)).unwrap();
            let twice = normalize_date(&text(&once)).unwrap();
            assert_eq!(once, twice, "input {}", input);
        }
    }

    #[test]
    fn test_day_first_dates() {
        assert_eq!(normalize_date_str("15/03/2025").as_deref(), Some("2025-03-15"));
        assert_eq!(normalize_date_str("5-1-2024").as_deref(), Some("2024-01-05"));
        // Ambiguous: both groups <= 12 reads day first
        assert_eq!(normalize_date_str("03/04/2025").as_deref(), Some("2025-04-03"));
    }

    #[test]
    fn test_month_first_when_second_group_exceeds_twelve() {
        assert_eq!(normalize_date_str("3/25/2025").as_deref(), Some("2025-03-25"));
        assert_eq!(normalize_date_str("12/31/2024").as_deref(), Some("2024-12-31"));
    }

    #[test]
    fn test_year_month_only() {
        assert_eq!(normalize_date_str("2025-3").as_deref(), Some("2025-03-01"));
        assert_eq!(normalize_date_str("2025/11").as_deref(), Some("2025-11-01"));
    }

    #[test]
    fn test_month_name_and_year() {
        assert_eq!(normalize_date_str("Mar-2025").as_deref(), Some("2025-03-01"));
        assert_eq!(normalize_date_str("Maret 2025").as_deref(), Some("2025-03-01"));
        assert_eq!(normalize_date_str("okt/2024").as_deref(), Some("2024-10-01"));
        assert_eq!(normalize_date_str("DEC 2023").as_deref(), Some("2023-12-01"));
    }

    #[test]
    fn test_serial_dates_keep_leap_year_offset() {
        assert_eq!(normalize_date(&CellValue::Number(45731.0)).as_deref(), Some("2025-03-15"));
        assert_eq!(normalize_date(&CellValue::Number(45658.0)).as_deref(), Some("2025-01-01"));
        // Fractional part is time of day
        assert_eq!(normalize_date(&CellValue::Number(45731.75)).as_deref(), Some("2025-03-15"));
    }

    #[test]
    fn test_blank_dates() {
        assert_eq!(normalize_date(&text("")), None);
        assert_eq!(normalize_date(&text("   ")), None);
        assert_eq!(normalize_date(&text("-")), None);
        assert_eq!(normalize_date(&CellValue::Empty), None);
    }

    #[test]
    fn test_unparseable_date_returned_trimmed() {
        assert_eq!(normalize_date_str("  segera  ").as_deref(), Some("segera"));
        // Calendar-invalid day falls through unchanged
        assert_eq!(normalize_date_str("31/02/2025").as_deref(), Some("31/02/2025"));
        assert_eq!(normalize_to_date(&text("31/02/2025")), None);
    }

    #[test]
    fn test_currency_parsing() {
        assert_eq!(normalize_currency_str("1.500.000"), Some(1_500_000.0));
        assert_eq!(normalize_currency_str("1,500,000"), Some(1_500_000.0));
        assert_eq!(normalize_currency_str("\"2,750,000.50\""), Some(2_750_000.5));
        assert_eq!(normalize_currency_str("Rp 12.000.000"), Some(12_000_000.0));
        assert_eq!(normalize_currency_str("1500000"), Some(1_500_000.0));
        assert_eq!(normalize_currency_str("0.5"), Some(0.5));
    }

    #[test]
    fn test_currency_blank_and_invalid() {
        assert_eq!(normalize_currency_str("-"), None);
        assert_eq!(normalize_currency_str(""), None);
        assert_eq!(normalize_currency_str("abc"), None);
        assert_eq!(normalize_currency_str("-500"), None);
        assert_eq!(normalize_currency(&CellValue::Number(-1.0)), None);
        assert_eq!(normalize_currency(&CellValue::Number(2500.0)), Some(2500.0));
    }

    #[test]
    fn test_month_number() {
        assert_eq!(month_number("3"), Some(3));
        assert_eq!(month_number("03"), Some(3));
        assert_eq!(month_number("13"), None);
        assert_eq!(month_number("Mei"), Some(5));
        assert_eq!(month_number("may"), Some(5));
        assert_eq!(month_number("AGUSTUS"), Some(8));
        assert_eq!(month_number("Sept"), Some(9));
        assert_eq!(month_number("Okt."), Some(10));
        assert_eq!(month_number("2025-07-01"), Some(7));
        assert_eq!(month_number("ju"), None);
        assert_eq!(month_number(""), None);
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&CellValue::Number(2025.0)).as_deref(), Some("2025"));
        assert_eq!(cell_text(&text("  PT Maju ")).as_deref(), Some("PT Maju"));
        assert_eq!(cell_text(&text(" - ")), None);
    }
}
