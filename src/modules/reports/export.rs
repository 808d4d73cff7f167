use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use super::stats::RegionStats;
use crate::modules::families::{Family, round_cents};

pub const DETAIL_SHEET: &str = "家庭明细";
pub const REGION_SHEET: &str = "地区汇总";

const DETAIL_HEADERS: [&str; 12] = [
    "户主姓名",
    "身份证号",
    "联系电话",
    "所属地区",
    "家庭住址",
    "家庭人口",
    "月收入",
    "人均月收入",
    "救助类型",
    "补贴金额",
    "审核状态",
    "登记时间",
];

const REGION_HEADERS: [&str; 4] = ["所属地区", "家庭数", "已通过", "月补贴总额"];

/// Builds the two-sheet report workbook and returns the XLSX bytes.
pub fn export_workbook(families: &[&Family], regions: &[RegionStats]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let detail = workbook.add_worksheet();
    detail
        .set_name(DETAIL_SHEET)
        .context("设置工作表名称失败")?;
    write_header(detail, &DETAIL_HEADERS)?;
    for (idx, family) in families.iter().enumerate() {
        let row = (idx + 1) as u32;
        detail
            .write_string(row, 0, &family.household_head)
            .context("写入户主姓名失败")?;
        detail
            .write_string(row, 1, &family.id_number)
            .context("写入身份证号失败")?;
        detail
            .write_string(row, 2, &family.phone)
            .context("写入联系电话失败")?;
        detail
            .write_string(row, 3, &family.region)
            .context("写入所属地区失败")?;
        detail
            .write_string(row, 4, &family.address)
            .context("写入家庭住址失败")?;
        detail
            .write_number(row, 5, family.household_size() as f64)
            .context("写入家庭人口失败")?;
        detail
            .write_number(row, 6, family.monthly_income)
            .context("写入月收入失败")?;
        detail
            .write_number(row, 7, round_cents(family.per_capita_income()))
            .context("写入人均月收入失败")?;
        detail
            .write_string(row, 8, family.subsidy_type.label_zh())
            .context("写入救助类型失败")?;
        detail
            .write_number(row, 9, family.subsidy_amount)
            .context("写入补贴金额失败")?;
        detail
            .write_string(row, 10, family.status.label_zh())
            .context("写入审核状态失败")?;
        detail
            .write_string(row, 11, &family.created_at.format("%Y-%m-%d").to_string())
            .context("写入登记时间失败")?;
    }

    let summary = workbook.add_worksheet();
    summary
        .set_name(REGION_SHEET)
        .context("设置工作表名称失败")?;
    write_header(summary, &REGION_HEADERS)?;
    for (idx, stats) in regions.iter().enumerate() {
        let row = (idx + 1) as u32;
        summary
            .write_string(row, 0, &stats.region)
            .context("写入地区名称失败")?;
        summary
            .write_number(row, 1, stats.families as f64)
            .context("写入家庭数失败")?;
        summary
            .write_number(row, 2, stats.approved as f64)
            .context("写入已通过数失败")?;
        summary
            .write_number(row, 3, stats.approved_monthly_subsidy)
            .context("写入补贴总额失败")?;
    }

    workbook.save_to_buffer().context("生成报表工作簿失败")
}

fn write_header(worksheet: &mut Worksheet, headers: &[&str]) -> Result<()> {
    for (col, name) in headers.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *name)
            .context("写入表头失败")?;
    }
    Ok(())
}
