//! Bulk import pipeline
//!
//! Spreadsheet (xlsx/csv) import for assets and inventory, XML import for
//! vendors. The pipeline is row-isolated: a bad row records an error and the
//! batch moves on. Reported errors are capped while failures keep counting.
//!
//! Header matching is forgiving: headers are normalized (lowercase, trim,
//! collapse whitespace) and looked up in per-entity tables that accept
//! multiple spellings. Unknown columns are ignored.

use calamine::{Data, Reader, Xlsx};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use storekeep_common::db::models::AssetStatus;
use storekeep_common::db::Repository;
use storekeep_common::errors::{AppError, Result};
use uuid::Uuid;

/// Cap on errors carried in the report; failures beyond it still count
const MAX_REPORTED_ERRORS: usize = 50;

/// Outcome of an import batch
#[derive(Debug, Default)]
pub struct ImportReport {
    pub success_count: usize,
    pub failed_count: usize,
    pub errors: Vec<String>,
}

impl ImportReport {
    fn record_success(&mut self) {
        self.success_count += 1;
    }

    fn record_failure(&mut self, row_number: usize, message: impl AsRef<str>) {
        self.failed_count += 1;
        if self.errors.len() < MAX_REPORTED_ERRORS {
            self.errors
                .push(format!("Row {}: {}", row_number, message.as_ref()));
        }
    }
}

/// One data row: canonical field name to raw cell text
type Row = HashMap<&'static str, String>;

/// Canonical field with the header spellings that map to it
type HeaderTable = &'static [(&'static str, &'static [&'static str])];

const ASSET_HEADERS: HeaderTable = &[
    ("name", &["name", "asset name", "asset"]),
    (
        "asset_no",
        &["asset id", "assetid", "asset_id", "asset no", "asset number", "id"],
    ),
    ("status", &["status", "asset status", "state"]),
    ("category", &["category", "type", "asset category"]),
    ("location", &["location", "area", "room"]),
    (
        "serial_number",
        &["serial number", "serial_number", "serial", "serial no", "serial #"],
    ),
];

const INVENTORY_HEADERS: HeaderTable = &[
    ("name", &["name", "item name", "item", "description"]),
    (
        "part_number",
        &["part number", "part_number", "partnumber", "part no", "part #", "sku"],
    ),
    (
        "quantity",
        &["quantity", "qty", "quantity on hand", "on hand", "stock"],
    ),
    (
        "reorder_threshold",
        &[
            "reorder threshold",
            "reorder level",
            "reorder point",
            "min quantity",
            "minimum",
        ],
    ),
];

/// Normalize a header: lowercase, trim, collapse internal whitespace
fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Map a raw header to its canonical field, if the table knows it
fn canonical_field(table: HeaderTable, raw: &str) -> Option<&'static str> {
    let normalized = normalize_header(raw);
    table
        .iter()
        .find(|(_, spellings)| spellings.contains(&normalized.as_str()))
        .map(|(canonical, _)| *canonical)
}

/// Base-10 integer coercion; blank means absent
fn parse_int_field(row: &Row, field: &str) -> std::result::Result<Option<i32>, String> {
    match row.get(field).map(|v| v.trim()) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<i32>()
            .map(Some)
            .map_err(|_| format!("{} must be a whole number, got \"{}\"", field, raw)),
    }
}

fn text_field(row: &Row, field: &str) -> Option<String> {
    row.get(field)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Whole floats render without the trailing .0 so numeric ids survive
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn parse_xlsx(bytes: &[u8], table: HeaderTable) -> Result<Vec<Row>> {
    let mut workbook =
        Xlsx::new(Cursor::new(bytes.to_vec())).map_err(|e| AppError::ImportParse {
            message: format!("Not a readable xlsx file: {}", e),
        })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::ImportParse {
            message: "Workbook has no sheets".to_string(),
        })?
        .map_err(|e| AppError::ImportParse {
            message: format!("Failed to read first sheet: {}", e),
        })?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or_else(|| AppError::ImportParse {
        message: "Sheet is empty".to_string(),
    })?;

    let columns: Vec<Option<&'static str>> = header_row
        .iter()
        .map(|cell| canonical_field(table, &cell_to_string(cell)))
        .collect();

    Ok(rows
        .map(|cells| {
            let mut row = Row::new();
            for (index, cell) in cells.iter().enumerate() {
                if let Some(Some(field)) = columns.get(index) {
                    row.insert(field, cell_to_string(cell));
                }
            }
            row
        })
        .collect())
}

fn parse_csv(bytes: &[u8], table: HeaderTable) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let columns: Vec<Option<&'static str>> = reader
        .headers()
        .map_err(|e| AppError::ImportParse {
            message: format!("Failed to read CSV headers: {}", e),
        })?
        .iter()
        .map(|header| canonical_field(table, header))
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AppError::ImportParse {
            message: format!("Malformed CSV record: {}", e),
        })?;
        let mut row = Row::new();
        for (index, value) in record.iter().enumerate() {
            if let Some(Some(field)) = columns.get(index) {
                row.insert(field, value.to_string());
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Parse by file extension: .csv as CSV, everything else as xlsx
fn parse_rows(file_name: &str, bytes: &[u8], table: HeaderTable) -> Result<Vec<Row>> {
    if file_name.to_lowercase().ends_with(".csv") {
        parse_csv(bytes, table)
    } else {
        parse_xlsx(bytes, table)
    }
}

/// Validated fields from one asset row
#[derive(Debug, PartialEq, Eq)]
struct AssetRow {
    name: String,
    asset_no: Option<i32>,
    status: AssetStatus,
    category: Option<String>,
    location: Option<String>,
    serial_number: Option<String>,
}

fn validate_asset_row(row: &Row) -> std::result::Result<AssetRow, String> {
    let name = text_field(row, "name").ok_or("name is required")?;
    let asset_no = parse_int_field(row, "asset_no")?;

    let status = match text_field(row, "status") {
        None => AssetStatus::Active,
        Some(raw) => {
            AssetStatus::parse(&raw).ok_or_else(|| format!("unknown status \"{}\"", raw))?
        }
    };

    Ok(AssetRow {
        name,
        asset_no,
        status,
        category: text_field(row, "category"),
        location: text_field(row, "location"),
        serial_number: text_field(row, "serial_number"),
    })
}

/// Validated fields from one inventory row
#[derive(Debug, PartialEq, Eq)]
struct InventoryRow {
    name: String,
    part_number: String,
    quantity: i32,
    reorder_threshold: i32,
}

fn validate_inventory_row(row: &Row) -> std::result::Result<InventoryRow, String> {
    let name = text_field(row, "name").ok_or("name is required")?;
    let part_number = text_field(row, "part_number").ok_or("part number is required")?;

    let quantity = parse_int_field(row, "quantity")?.unwrap_or(0);
    if quantity < 0 {
        return Err("quantity cannot be negative".to_string());
    }
    let reorder_threshold = parse_int_field(row, "reorder_threshold")?.unwrap_or(0);

    Ok(InventoryRow {
        name,
        part_number,
        quantity,
        reorder_threshold,
    })
}

/// Pure pass over parsed asset rows: per-row validation plus in-file
/// duplicate screening on the numeric asset id. A bad row records an error
/// and the pass moves on. Survivors keep their row number so insert-time
/// failures stay row-addressed. Data rows are numbered from 2: row 1 is
/// the header.
fn screen_asset_rows(rows: &[Row], report: &mut ImportReport) -> Vec<(usize, AssetRow)> {
    let mut seen_asset_nos: HashSet<i32> = HashSet::new();
    let mut survivors = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 2;

        let parsed = match validate_asset_row(row) {
            Ok(parsed) => parsed,
            Err(message) => {
                report.record_failure(row_number, message);
                continue;
            }
        };

        if let Some(asset_no) = parsed.asset_no {
            if !seen_asset_nos.insert(asset_no) {
                report.record_failure(
                    row_number,
                    format!("duplicate asset id {} earlier in this file", asset_no),
                );
                continue;
            }
        }

        survivors.push((row_number, parsed));
    }

    survivors
}

/// Import assets from a spreadsheet into one store.
///
/// The numeric asset id is the natural key: rows naming one are checked
/// against ids already seen in this file and against persisted assets.
/// Rows without one get the next per-store number at insert time.
pub async fn import_assets(
    repo: &Repository,
    store_id: Uuid,
    file_name: &str,
    bytes: &[u8],
) -> Result<ImportReport> {
    let rows = parse_rows(file_name, bytes, ASSET_HEADERS)?;

    let mut report = ImportReport::default();

    for (row_number, parsed) in screen_asset_rows(&rows, &mut report) {
        let asset_no = match parsed.asset_no {
            Some(asset_no) => match repo.find_asset_by_no(store_id, asset_no).await {
                Ok(Some(_)) => {
                    report.record_failure(
                        row_number,
                        format!("asset id {} already exists in this store", asset_no),
                    );
                    continue;
                }
                Ok(None) => asset_no,
                Err(e) => {
                    report.record_failure(row_number, e.to_string());
                    continue;
                }
            },
            None => match repo.next_asset_no(store_id).await {
                Ok(asset_no) => asset_no,
                Err(e) => {
                    report.record_failure(row_number, e.to_string());
                    continue;
                }
            },
        };

        match repo
            .create_asset(
                store_id,
                asset_no,
                parsed.name,
                parsed.status,
                parsed.category,
                parsed.location,
                parsed.serial_number,
                None,
            )
            .await
        {
            Ok(_) => report.record_success(),
            Err(e) => report.record_failure(row_number, e.to_string()),
        }
    }

    Ok(report)
}

/// Pure pass over parsed inventory rows: validation plus in-file duplicate
/// screening on the part number.
fn screen_inventory_rows(rows: &[Row], report: &mut ImportReport) -> Vec<(usize, InventoryRow)> {
    let mut seen_part_numbers: HashSet<String> = HashSet::new();
    let mut survivors = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 2;

        let parsed = match validate_inventory_row(row) {
            Ok(parsed) => parsed,
            Err(message) => {
                report.record_failure(row_number, message);
                continue;
            }
        };

        if !seen_part_numbers.insert(parsed.part_number.clone()) {
            report.record_failure(
                row_number,
                format!(
                    "duplicate part number {} earlier in this file",
                    parsed.part_number
                ),
            );
            continue;
        }

        survivors.push((row_number, parsed));
    }

    survivors
}

/// Import inventory items from a spreadsheet into one store. Part number is
/// the natural key, checked against this file and persisted items.
pub async fn import_inventory(
    repo: &Repository,
    store_id: Uuid,
    file_name: &str,
    bytes: &[u8],
) -> Result<ImportReport> {
    let rows = parse_rows(file_name, bytes, INVENTORY_HEADERS)?;

    let mut report = ImportReport::default();

    for (row_number, parsed) in screen_inventory_rows(&rows, &mut report) {
        match repo
            .find_inventory_item_by_part_number(store_id, &parsed.part_number)
            .await
        {
            Ok(Some(_)) => {
                report.record_failure(
                    row_number,
                    format!(
                        "part number {} already exists in this store",
                        parsed.part_number
                    ),
                );
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                report.record_failure(row_number, e.to_string());
                continue;
            }
        }

        match repo
            .create_inventory_item(
                store_id,
                parsed.name,
                parsed.part_number,
                parsed.quantity,
                parsed.reorder_threshold,
            )
            .await
        {
            Ok(_) => report.record_success(),
            Err(e) => report.record_failure(row_number, e.to_string()),
        }
    }

    Ok(report)
}

/// Vendor XML document shape: `<vendors><vendor>...</vendor></vendors>`
#[derive(Debug, Deserialize)]
struct VendorFile {
    #[serde(rename = "vendor", default)]
    vendors: Vec<VendorRow>,
}

#[derive(Debug, Deserialize)]
struct VendorRow {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    category: Option<String>,
}

/// Import vendors from an XML document. Email is the natural key when
/// present; vendors without one are accepted as-is.
pub async fn import_vendors(
    repo: &Repository,
    store_id: Option<Uuid>,
    bytes: &[u8],
) -> Result<ImportReport> {
    let text = std::str::from_utf8(bytes).map_err(|_| AppError::ImportParse {
        message: "Vendor file is not valid UTF-8".to_string(),
    })?;
    let parsed: VendorFile = quick_xml::de::from_str(text).map_err(|e| AppError::ImportParse {
        message: format!("Not a readable vendor XML document: {}", e),
    })?;

    let mut report = ImportReport::default();
    let mut seen_emails: HashSet<String> = HashSet::new();

    for (index, vendor) in parsed.vendors.iter().enumerate() {
        let row_number = index + 1;

        let name = match vendor.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                report.record_failure(row_number, "name is required");
                continue;
            }
        };

        let email = vendor
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_lowercase);

        if let Some(ref email) = email {
            if seen_emails.contains(email) {
                report.record_failure(
                    row_number,
                    format!("duplicate email {} earlier in this file", email),
                );
                continue;
            }
            match repo.find_vendor_by_email(email).await {
                Ok(Some(_)) => {
                    report.record_failure(
                        row_number,
                        format!("a vendor with email {} already exists", email),
                    );
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    report.record_failure(row_number, e.to_string());
                    continue;
                }
            }
        }

        match repo
            .create_vendor(
                store_id,
                name,
                email.clone(),
                vendor.phone.clone(),
                vendor.category.clone(),
            )
            .await
        {
            Ok(_) => {
                if let Some(email) = email {
                    seen_emails.insert(email);
                }
                report.record_success();
            }
            Err(e) => report.record_failure(row_number, e.to_string()),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&'static str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(field, value)| (*field, value.to_string()))
            .collect()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Asset   ID "), "asset id");
        assert_eq!(normalize_header("PART\tNUMBER"), "part number");
        assert_eq!(normalize_header("name"), "name");
    }

    #[test]
    fn test_header_spellings_map_to_one_field() {
        for spelling in ["Asset ID", "assetid", "asset_id", "ASSET NO"] {
            assert_eq!(canonical_field(ASSET_HEADERS, spelling), Some("asset_no"));
        }
        for spelling in ["Part Number", "part_number", "SKU", "part #"] {
            assert_eq!(
                canonical_field(INVENTORY_HEADERS, spelling),
                Some("part_number")
            );
        }
        // Unknown columns are ignored, not errors
        assert_eq!(canonical_field(ASSET_HEADERS, "warranty expiry"), None);
    }

    #[test]
    fn test_int_coercion() {
        let r = row(&[("quantity", " 42 ")]);
        assert_eq!(parse_int_field(&r, "quantity"), Ok(Some(42)));

        let r = row(&[("quantity", "")]);
        assert_eq!(parse_int_field(&r, "quantity"), Ok(None));

        let r = row(&[("quantity", "twelve")]);
        assert!(parse_int_field(&r, "quantity").is_err());
    }

    #[test]
    fn test_validate_asset_row() {
        let r = row(&[("name", "Pump 1"), ("asset_no", "7"), ("status", "Down")]);
        let parsed = validate_asset_row(&r).unwrap();
        assert_eq!(parsed.name, "Pump 1");
        assert_eq!(parsed.asset_no, Some(7));
        assert_eq!(parsed.status, AssetStatus::Down);

        // Missing name fails this row only
        let r = row(&[("asset_no", "8")]);
        assert_eq!(validate_asset_row(&r).unwrap_err(), "name is required");

        // Status defaults when absent, rejects junk
        let r = row(&[("name", "Fan"), ("status", "Broken")]);
        assert!(validate_asset_row(&r).unwrap_err().contains("Broken"));
        let r = row(&[("name", "Fan")]);
        assert_eq!(validate_asset_row(&r).unwrap().status, AssetStatus::Active);
    }

    #[test]
    fn test_validate_inventory_row() {
        let r = row(&[("name", "Belt"), ("part_number", "B-100")]);
        let parsed = validate_inventory_row(&r).unwrap();
        assert_eq!(parsed.quantity, 0);
        assert_eq!(parsed.reorder_threshold, 0);

        let r = row(&[("name", "Belt"), ("part_number", "B-100"), ("quantity", "-1")]);
        assert!(validate_inventory_row(&r).is_err());

        let r = row(&[("name", "Belt")]);
        assert_eq!(
            validate_inventory_row(&r).unwrap_err(),
            "part number is required"
        );
    }

    #[test]
    fn test_error_cap_keeps_counting() {
        let mut report = ImportReport::default();
        for i in 0..60 {
            report.record_failure(i + 2, "bad row");
        }
        assert_eq!(report.failed_count, 60);
        assert_eq!(report.errors.len(), MAX_REPORTED_ERRORS);
    }

    #[test]
    fn test_error_messages_are_row_numbered_from_two() {
        let mut report = ImportReport::default();
        report.record_failure(2, "name is required");
        assert_eq!(report.errors[0], "Row 2: name is required");
    }

    #[test]
    fn test_parse_csv_maps_headers() {
        let csv = "Name,Asset ID,Status,Warranty\nPump 1,1,Active,2030\nPump 2,,Down,2031\n";
        let rows = parse_csv(csv.as_bytes(), ASSET_HEADERS).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name").map(String::as_str), Some("Pump 1"));
        assert_eq!(rows[0].get("asset_no").map(String::as_str), Some("1"));
        // The unmapped warranty column is dropped
        assert!(!rows[0].values().any(|v| v == "2030"));
        assert_eq!(rows[1].get("asset_no").map(String::as_str), Some(""));
    }

    #[test]
    fn test_mixed_batch_fails_rows_in_isolation() {
        let csv = concat!(
            "Name,Asset ID,Status\n",
            "Pump 1,1,Active\n",  // row 2: good
            ",2,Active\n",        // row 3: missing name
            "Pump 3,two,Active\n", // row 4: non-numeric id
            "Pump 4,1,Active\n",  // row 5: duplicate of row 2
            "Pump 5,5,Broken\n",  // row 6: unknown status
            "Pump 6,6,Down\n",    // row 7: good
        );
        let rows = parse_csv(csv.as_bytes(), ASSET_HEADERS).unwrap();

        let mut report = ImportReport::default();
        let survivors = screen_asset_rows(&rows, &mut report);

        // Bad rows in the middle never stop the rows after them
        let survivor_rows: Vec<usize> = survivors.iter().map(|(n, _)| *n).collect();
        assert_eq!(survivor_rows, vec![2, 7]);
        assert_eq!(survivors[1].1.asset_no, Some(6));

        assert_eq!(report.failed_count, 4);
        assert_eq!(report.errors[0], "Row 3: name is required");
        assert!(report.errors[1].starts_with("Row 4: asset_no must be a whole number"));
        assert_eq!(
            report.errors[2],
            "Row 5: duplicate asset id 1 earlier in this file"
        );
        assert!(report.errors[3].starts_with("Row 6: unknown status"));
    }

    #[test]
    fn test_batch_keeps_counting_past_error_cap() {
        // 120 data rows alternating good and bad: 60 failures, ten past the cap
        let mut csv = String::from("Name,Part Number,Quantity\n");
        for i in 0..120 {
            if i % 2 == 0 {
                csv.push_str(&format!("Belt {},B-{},5\n", i, i));
            } else {
                csv.push_str(&format!("Belt {},B-{},bad\n", i, i));
            }
        }
        let rows = parse_csv(csv.as_bytes(), INVENTORY_HEADERS).unwrap();

        let mut report = ImportReport::default();
        let survivors = screen_inventory_rows(&rows, &mut report);

        // Every failure counts, only the first 50 are reported, and good
        // rows past the cap still come through
        assert_eq!(report.failed_count, 60);
        assert_eq!(report.errors.len(), MAX_REPORTED_ERRORS);
        assert_eq!(survivors.len(), 60);
        assert_eq!(survivors.last().map(|(n, _)| *n), Some(120));
    }

    #[test]
    fn test_vendor_xml_shape() {
        let xml = r#"
            <vendors>
                <vendor><name>Acme Pumps</name><email>SALES@acme.test</email></vendor>
                <vendor><phone>555-0100</phone></vendor>
            </vendors>
        "#;
        let parsed: VendorFile = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(parsed.vendors.len(), 2);
        assert_eq!(parsed.vendors[0].name.as_deref(), Some("Acme Pumps"));
        assert!(parsed.vendors[1].name.is_none());
    }

    #[test]
    fn test_cell_to_string_trims_float_ids() {
        assert_eq!(cell_to_string(&Data::Float(42.0)), "42");
        assert_eq!(cell_to_string(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::String("x".to_string())), "x");
    }
}
