// ==========================================
// 房产 CRM 线索导入 - 文件解析器实现
// ==========================================
// 阶段 1: 文件读取与解析
// 支持: CSV (.csv) / Excel (.xlsx/.xls)
// 红线: 所有单元格统一转为 TRIM 后的字符串,避免电话号码等被数值化
// ==========================================

use crate::domain::{RawRecord, RawTable};
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::lead_importer_trait::FileParser;
use calamine::{open_workbook_auto_from_rs, Reader};
use csv::ReaderBuilder;
use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

/// 默认建议文件大小上限（仅提示,不强制）
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 10;

// ==========================================
// 文件格式（按扩展名判定）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
}

impl FileFormat {
    /// 根据文件名扩展名判定格式（大小写不敏感）
    pub fn detect(file_name: &str) -> ImporterResult<Self> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" => Ok(FileFormat::Xlsx),
            "xls" => Ok(FileFormat::Xls),
            "" => Err(ImportError::UnsupportedFormat(file_name.to_string())),
            _ => Err(ImportError::UnsupportedFormat(format!(".{}", ext))),
        }
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

/// 解码 CSV 文本: UTF-8 优先,失败时按 Windows-1252（Excel 导出常见编码）
fn decode_csv_text<'a>(file_name: &str, bytes: &'a [u8]) -> Cow<'a, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            warn!(file = file_name, "非 UTF-8 编码,按 Windows-1252 解码");
            WINDOWS_1252.decode_without_bom_handling(bytes).0
        }
    }
}

impl FileParser for CsvParser {
    fn parse_bytes(&self, file_name: &str, bytes: &[u8]) -> ImporterResult<RawTable> {
        let text = decode_csv_text(file_name, bytes);
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(text.as_bytes());

        // 读取表头（去除 BOM）
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        // 读取所有行
        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row_map = RawRecord::new();

            // 超出表头的列丢弃；缺失的列不出现
            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.clone(), value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }

            records.push(row_map);
        }

        debug!(file = file_name, headers = headers.len(), rows = records.len(), "CSV 解析完成");
        Ok(RawTable::new(headers, records))
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_bytes(&self, file_name: &str, bytes: &[u8]) -> ImporterResult<RawTable> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        // 只读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("workbook has no sheets".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        // 第一行为表头；其余行按位置与表头对齐
        let mut rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());

        let header_cells = rows.next().ok_or_else(|| {
            ImportError::ExcelParseError(format!("sheet '{}' has no header row", sheet_name))
        })?;

        let table = zip_rows(header_cells, rows);
        debug!(
            file = file_name,
            sheet = %sheet_name,
            headers = table.headers().len(),
            rows = table.row_count(),
            "Excel 解析完成"
        );
        Ok(table)
    }
}

/// 按位置将数据行与表头对齐（缺失单元格 → 空字符串）
pub(crate) fn zip_rows<I>(header_cells: Vec<String>, rows: I) -> RawTable
where
    I: Iterator<Item = Vec<String>>,
{
    let headers: Vec<String> = header_cells
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for row in rows {
        let mut row_map = RawRecord::new();
        for (col_idx, header) in headers.iter().enumerate() {
            let value = row
                .get(col_idx)
                .map(|cell| cell.trim().to_string())
                .unwrap_or_default();
            row_map.insert(header.clone(), value);
        }

        // 跳过完全空白的行
        if row_map.values().all(|v| v.is_empty()) {
            continue;
        }

        records.push(row_map);
    }

    RawTable::new(headers, records)
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser {
    max_file_size_bytes: u64,
}

impl Default for UniversalFileParser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE_MB)
    }
}

impl UniversalFileParser {
    pub fn new(max_file_size_mb: u64) -> Self {
        Self {
            max_file_size_bytes: max_file_size_mb.saturating_mul(1024 * 1024),
        }
    }

    /// 解析磁盘文件
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImporterResult<RawTable> {
        let path = file_path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();

        // 先判定格式,不支持的扩展名不触碰文件
        FileFormat::detect(&file_name)?;

        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        self.parse_bytes(&file_name, &bytes)
    }

    /// 解析内存中的文件内容
    pub fn parse_bytes(&self, file_name: &str, bytes: &[u8]) -> ImporterResult<RawTable> {
        let format = FileFormat::detect(file_name)?;

        if bytes.len() as u64 > self.max_file_size_bytes {
            warn!(
                file = file_name,
                size_bytes = bytes.len(),
                limit_bytes = self.max_file_size_bytes,
                "文件超过建议大小上限,继续解析"
            );
        }

        let table = match format {
            FileFormat::Csv => CsvParser.parse_bytes(file_name, bytes)?,
            FileFormat::Xlsx | FileFormat::Xls => ExcelParser.parse_bytes(file_name, bytes)?,
        };

        info!(
            file = file_name,
            format = ?format,
            headers = table.headers().len(),
            rows = table.row_count(),
            "文件解析完成"
        );
        Ok(table)
    }
}
