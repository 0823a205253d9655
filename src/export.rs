//! Spreadsheet export of accounts, projects and payments.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;

use crate::db::models::{AccountRecord, PaymentExportRow, ProjectRecord};
use crate::ledger::split_client_tag;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const MAX_COLUMN_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Accounts,
    Projects,
    Payments,
}

impl ExportKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "accounts" => Some(Self::Accounts),
            "projects" => Some(Self::Projects),
            "payments" => Some(Self::Payments),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::Projects => "projects",
            Self::Payments => "payments",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "csv" => Some(Self::Csv),
            "excel" | "xlsx" => Some(Self::Excel),
            _ => None,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "xlsx",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    fn render(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Number(value) => value.to_string(),
        }
    }
}

/// One sheet worth of rows under fixed headers.
#[derive(Debug, Clone)]
pub struct ExportTable {
    pub sheet_name: &'static str,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportedFile {
    pub success: bool,
    pub file_path: String,
    pub display_path: String,
}

pub fn accounts_table(accounts: &[AccountRecord]) -> ExportTable {
    let rows = accounts
        .iter()
        .map(|account| {
            vec![
                Cell::text(&account.id),
                Cell::text(&account.website_name),
                Cell::text(&account.url),
                Cell::text(&account.username),
                Cell::text(&account.account),
                Cell::text(&account.row),
                Cell::text(&account.password),
                Cell::text(&account.tag),
                Cell::text(&account.created_at),
                Cell::text(&account.notes),
            ]
        })
        .collect();

    ExportTable {
        sheet_name: "账号数据",
        headers: vec![
            "编号", "网站类型", "网址", "用户名", "账号", "扩展行", "密码", "项目类型", "创建时间", "备注",
        ],
        rows,
    }
}

pub fn projects_table(projects: &[ProjectRecord]) -> ExportTable {
    let rows = projects
        .iter()
        .map(|project| {
            let (client, description) = split_client_tag(&project.name);
            vec![
                Cell::text(&project.id),
                Cell::text(&project.name),
                Cell::text(client.unwrap_or_default()),
                Cell::text(description),
                Cell::text(project.project_type.clone().unwrap_or_default()),
                Cell::Number(project.quantity as f64),
                Cell::text(project.completion_date.clone().unwrap_or_default()),
                Cell::text(if project.is_paid() { "已结算" } else { "未结算" }),
                Cell::text(&project.notes),
                Cell::text(if project.archived != 0 { "是" } else { "否" }),
                Cell::text(project.task_id.clone().unwrap_or_default()),
            ]
        })
        .collect();

    ExportTable {
        sheet_name: "项目数据",
        headers: vec![
            "编号", "项目名称", "客户名称", "项目描述", "项目类型", "数量", "完成日期", "结算状态", "备注",
            "已归档", "关联任务",
        ],
        rows,
    }
}

pub fn payments_table(payments: &[PaymentExportRow]) -> ExportTable {
    let rows = payments
        .iter()
        .map(|payment| {
            let name = payment.project_name.as_deref().unwrap_or_default();
            let (client, description) = split_client_tag(name);
            vec![
                Cell::text(&payment.id),
                Cell::text(name),
                Cell::text(client.unwrap_or_default()),
                Cell::text(description),
                Cell::text(payment.project_type.clone().unwrap_or_default()),
                payment
                    .quantity
                    .map(|quantity| Cell::Number(quantity as f64))
                    .unwrap_or_else(|| Cell::text("")),
                Cell::Number(payment.amount),
                Cell::text(&payment.date),
                Cell::text(&payment.notes),
            ]
        })
        .collect();

    ExportTable {
        sheet_name: "结算数据",
        headers: vec![
            "编号", "项目名称", "客户名称", "项目描述", "项目类型", "数量", "结算金额", "结算日期", "备注",
        ],
        rows,
    }
}

pub fn export_file_name(kind: ExportKind, format: ExportFormat, now: NaiveDateTime) -> String {
    format!(
        "{}_{}.{}",
        kind.as_str(),
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Writes the table into `data_dir` and reports where it landed.
pub fn write_export(
    table: &ExportTable,
    format: ExportFormat,
    data_dir: &Path,
    file_name: &str,
) -> anyhow::Result<ExportedFile> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create export directory {}", data_dir.display()))?;

    // Written under a `.part` name so a failed export never leaves a truncated file.
    let file_path = data_dir.join(file_name);
    let partial_path = data_dir.join(format!("{file_name}.part"));
    let written = match format {
        ExportFormat::Csv => write_csv(table, &partial_path),
        ExportFormat::Excel => write_xlsx(table, &partial_path),
    }
    .and_then(|()| {
        std::fs::rename(&partial_path, &file_path)
            .with_context(|| format!("failed to move export into {}", file_path.display()))
    });

    if let Err(error) = written {
        let _ = std::fs::remove_file(&partial_path);
        return Err(error);
    }

    Ok(ExportedFile {
        success: true,
        display_path: display_path(data_dir, &file_path),
        file_path: file_path.to_string_lossy().to_string(),
    })
}

fn write_csv(table: &ExportTable, path: &Path) -> anyhow::Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(Cell::render))?;
    }
    writer.flush()?;

    Ok(())
}

fn write_xlsx(table: &ExportTable, path: &Path) -> anyhow::Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(table.sheet_name)?;

    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (index, row) in table.rows.iter().enumerate() {
        let row_number = (index + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(value) => {
                    worksheet.write_string(row_number, col as u16, value)?;
                }
                Cell::Number(value) => {
                    worksheet.write_number(row_number, col as u16, *value)?;
                }
            }
        }
    }

    for (col, width) in column_widths(table).into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width as f64)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Widest value per column plus padding, capped. Non-ASCII characters count double.
pub fn column_widths(table: &ExportTable) -> Vec<usize> {
    table
        .headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let widest = table
                .rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(|cell| display_width(&cell.render()))
                .chain(std::iter::once(display_width(header)))
                .max()
                .unwrap_or(0);
            (widest + 2).min(MAX_COLUMN_WIDTH)
        })
        .collect()
}

fn display_width(value: &str) -> usize {
    value
        .chars()
        .map(|c| if c.is_ascii() { 1 } else { 2 })
        .sum()
}

/// Path relative to the directory holding the export root, else the full path.
fn display_path(data_dir: &Path, file_path: &Path) -> String {
    data_dir
        .parent()
        .and_then(|root| file_path.strip_prefix(root).ok())
        .filter(|relative| relative.components().count() > 1)
        .map(PathBuf::from)
        .unwrap_or_else(|| file_path.to_path_buf())
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn project(name: &str, payment_status: &str) -> ProjectRecord {
        ProjectRecord {
            id: "p1".to_string(),
            name: name.to_string(),
            project_type: Some("设计".to_string()),
            quantity: 2,
            completion_date: Some("2026-10-12".to_string()),
            payment_status: payment_status.to_string(),
            notes: String::new(),
            archived: 1,
            task_id: None,
        }
    }

    #[test]
    fn parses_kinds_and_formats() {
        assert_eq!(ExportKind::parse("payments"), Some(ExportKind::Payments));
        assert_eq!(ExportKind::parse("invoices"), None);
        assert_eq!(ExportFormat::parse("excel"), Some(ExportFormat::Excel));
        assert_eq!(ExportFormat::parse("csv"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse("pdf"), None);
    }

    #[test]
    fn file_name_carries_kind_and_timestamp() {
        let now = NaiveDateTime::parse_from_str("2026-10-16 09:05:03", "%Y-%m-%d %H:%M:%S")
            .expect("valid timestamp");
        assert_eq!(
            export_file_name(ExportKind::Projects, ExportFormat::Excel, now),
            "projects_20261016_090503.xlsx"
        );
    }

    #[test]
    fn project_rows_split_client_tags() {
        let table = projects_table(&[project("[Acme] Design logo", "paid")]);
        let row = &table.rows[0];

        assert_eq!(row[2], Cell::text("Acme"));
        assert_eq!(row[3], Cell::text("Design logo"));
        assert_eq!(row[5], Cell::Number(2.0));
        assert_eq!(row[7], Cell::text("已结算"));
        assert_eq!(row[9], Cell::text("是"));
    }

    #[test]
    fn column_widths_count_wide_characters_and_cap() {
        let mut table = projects_table(&[project("[Acme] Design logo", "unpaid")]);
        table.rows[0][8] = Cell::text("x".repeat(80));

        let widths = column_widths(&table);
        // "客户名称" is four wide characters.
        assert_eq!(widths[2], 10);
        assert_eq!(widths[8], MAX_COLUMN_WIDTH);
    }

    #[test]
    fn csv_export_starts_with_bom() {
        let temp_dir = tempdir().expect("tempdir should be created");
        let data_dir = temp_dir.path().join("data");

        let exported = write_export(
            &projects_table(&[project("Poster", "unpaid")]),
            ExportFormat::Csv,
            &data_dir,
            "projects_20261016_090503.csv",
        )
        .expect("csv export should succeed");

        let bytes = std::fs::read(&exported.file_path).expect("export should exist");
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).expect("utf-8 output");
        assert!(text.starts_with("编号,项目名称,客户名称"));
        assert!(text.contains("Poster"));
        assert_eq!(
            PathBuf::from(&exported.display_path),
            PathBuf::from("data").join("projects_20261016_090503.csv")
        );
        assert!(!data_dir.join("projects_20261016_090503.csv.part").exists());
    }

    #[test]
    fn failed_export_leaves_no_partial_file() {
        let temp_dir = tempdir().expect("tempdir should be created");
        let data_dir = temp_dir.path().join("data");
        let file_name = "projects_20261016_090503.csv";

        // A directory in the way makes the final move fail after the rows are written.
        std::fs::create_dir_all(data_dir.join(file_name).join("occupied"))
            .expect("blocking directory should be created");

        let result = write_export(
            &projects_table(&[project("Poster", "unpaid")]),
            ExportFormat::Csv,
            &data_dir,
            file_name,
        );

        assert!(result.is_err());
        assert!(!data_dir.join(format!("{file_name}.part")).exists());
        assert!(data_dir.join(file_name).is_dir());
    }

    #[test]
    fn excel_export_writes_a_workbook() {
        let temp_dir = tempdir().expect("tempdir should be created");
        let data_dir = temp_dir.path().join("data");

        let exported = write_export(
            &accounts_table(&[]),
            ExportFormat::Excel,
            &data_dir,
            "accounts_20261016_090503.xlsx",
        )
        .expect("xlsx export should succeed");

        let bytes = std::fs::read(&exported.file_path).expect("export should exist");
        assert!(bytes.starts_with(b"PK"));
    }
}
