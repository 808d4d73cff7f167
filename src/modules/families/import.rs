use std::io::Cursor;

use anyhow::{Context, Result, anyhow, bail};
use calamine::{DataType, Reader, Xlsx};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::registry::{FamilyInput, FamilyRegistry, SubsidyType};

const COL_HEAD: &str = "户主姓名";
const COL_ID_NUMBER: &str = "身份证号";
const COL_PHONE: &str = "联系电话";
const COL_REGION: &str = "所属地区";
const COL_ADDRESS: &str = "家庭住址";
const COL_INCOME: &str = "月收入";
const COL_SUBSIDY_TYPE: &str = "救助类型";
const COL_SUBSIDY_AMOUNT: &str = "补贴金额";

const REQUIRED_COLUMNS: &[&str] = &[
    COL_HEAD,
    COL_ID_NUMBER,
    COL_PHONE,
    COL_REGION,
    COL_INCOME,
    COL_SUBSIDY_TYPE,
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImportRowError {
    /// Spreadsheet row number as shown in Excel (header is row 1).
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: Vec<ImportRowError>,
}

struct ColumnMap {
    head: usize,
    id_number: usize,
    phone: usize,
    region: usize,
    address: Option<usize>,
    income: usize,
    subsidy_type: usize,
    subsidy_amount: Option<usize>,
}

/// Creates a pending family for every valid row of the first worksheet.
pub fn import_families(
    registry: &mut FamilyRegistry,
    bytes: &[u8],
    now: DateTime<Utc>,
) -> Result<ImportSummary> {
    let rows = parse_family_rows(bytes)?;
    let mut summary = ImportSummary::default();

    for (row, parsed) in rows {
        let outcome = parsed.and_then(|input| {
            registry
                .create(input, now)
                .map(|_| ())
                .map_err(|err| err.message().to_string())
        });
        match outcome {
            Ok(()) => summary.imported += 1,
            Err(message) => summary.skipped.push(ImportRowError { row, message }),
        }
    }

    Ok(summary)
}

fn parse_family_rows(bytes: &[u8]) -> Result<Vec<(usize, Result<FamilyInput, String>)>> {
    let mut workbook =
        Xlsx::new(Cursor::new(bytes)).context("无法打开 XLSX 文件，请确认文件格式无误")?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Excel 中未找到任何工作表"))??;

    let mut rows = range.rows();
    let header = rows.next().ok_or_else(|| anyhow!("工作表为空，请按模板填写表头。"))?;
    let columns = resolve_columns(header)?;

    let mut parsed = Vec::new();
    for (idx, cells) in rows.enumerate() {
        if cells.iter().all(|cell| cell_to_string(Some(cell)).is_none_or(|v| v.is_empty())) {
            continue;
        }
        // Header occupies row 1, so the first data row is row 2.
        parsed.push((idx + 2, parse_row(cells, &columns)));
    }

    if parsed.is_empty() {
        bail!("工作表中没有可导入的数据行。");
    }

    Ok(parsed)
}

fn resolve_columns(header: &[DataType]) -> Result<ColumnMap> {
    let names: Vec<String> = header
        .iter()
        .map(|cell| cell_to_string(Some(cell)).unwrap_or_default())
        .collect();
    let find = |name: &str| names.iter().position(|value| value == name);

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|name| find(*name).is_none())
        .collect();
    if !missing.is_empty() {
        bail!("缺少必填列：{}", missing.join("、"));
    }

    let required = |name: &str| find(name).ok_or_else(|| anyhow!("缺少必填列：{name}"));

    Ok(ColumnMap {
        head: required(COL_HEAD)?,
        id_number: required(COL_ID_NUMBER)?,
        phone: required(COL_PHONE)?,
        region: required(COL_REGION)?,
        address: find(COL_ADDRESS),
        income: required(COL_INCOME)?,
        subsidy_type: required(COL_SUBSIDY_TYPE)?,
        subsidy_amount: find(COL_SUBSIDY_AMOUNT),
    })
}

fn parse_row(cells: &[DataType], columns: &ColumnMap) -> Result<FamilyInput, String> {
    let text = |col: usize| cell_to_string(cells.get(col)).unwrap_or_default();

    let subsidy_raw = text(columns.subsidy_type);
    let subsidy_type = SubsidyType::parse(&subsidy_raw)
        .ok_or_else(|| format!("无法识别的救助类型：{subsidy_raw}"))?;

    let monthly_income = parse_amount(&text(columns.income), COL_INCOME)?;
    let subsidy_amount = match columns.subsidy_amount.map(text) {
        Some(raw) if !raw.is_empty() => parse_amount(&raw, COL_SUBSIDY_AMOUNT)?,
        _ => 0.0,
    };

    Ok(FamilyInput {
        household_head: text(columns.head),
        id_number: text(columns.id_number),
        phone: text(columns.phone),
        region: text(columns.region),
        address: columns.address.map(text).unwrap_or_default(),
        monthly_income,
        subsidy_type,
        subsidy_amount,
    })
}

fn parse_amount(raw: &str, column: &str) -> Result<f64, String> {
    let cleaned = raw.trim().trim_end_matches('元').replace(',', "");
    if cleaned.is_empty() {
        return Err(format!("请填写{column}。"));
    }
    cleaned
        .parse::<f64>()
        .map_err(|_| format!("{column}不是有效的数字：{raw}"))
}

fn cell_to_string(cell: Option<&DataType>) -> Option<String> {
    let value = cell?;
    let text = match value {
        DataType::String(s) => s.trim().to_string(),
        DataType::Float(f) => {
            let mut s = format!("{f}");
            if s.ends_with(".0") {
                s.truncate(s.len() - 2);
            }
            s
        }
        DataType::Int(i) => i.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::DateTime(dt) => dt.to_string(),
        _ => String::new(),
    };
    Some(text)
}
