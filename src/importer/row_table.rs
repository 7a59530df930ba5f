// ==========================================
// 项目进度导入核心 - 行表构建器
// ==========================================
// 职责: 三种解析器共用的表头去重 + 按位置组装行
// 红线: 每行 key 集合 == 表头列表（缺失补 Null，多余截断）
// ==========================================

use crate::domain::task::{ParseWarning, ParsedRow, ParsedTable};
use crate::domain::types::{CellValue, FormatKind};
use std::collections::{HashMap, HashSet};
use tracing::warn;

pub struct RowTableBuilder {
    format: FormatKind,
    headers: Vec<String>,
    // 原始列位置 → 是否保留（重复表头的列被丢弃）
    keep_columns: Vec<bool>,
    raw_width: usize,
    rows: Vec<ParsedRow>,
    warnings: Vec<ParseWarning>,
}

impl RowTableBuilder {
    /// 以原始表头创建构建器
    ///
    /// # 规则
    /// - 表头名首尾空白裁剪
    /// - 重复表头保留首次出现，后续列丢弃并记录警告
    pub fn new<I, S>(format: FormatKind, raw_headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut headers = Vec::new();
        let mut keep_columns = Vec::new();
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();

        for (idx, raw) in raw_headers.into_iter().enumerate() {
            let header = raw.as_ref().trim().to_string();
            if seen.insert(header.clone()) {
                headers.push(header);
                keep_columns.push(true);
            } else {
                warn!(header = %header, column = idx + 1, "重复表头，保留首次出现");
                warnings.push(ParseWarning::DuplicateHeader {
                    header,
                    column: idx + 1,
                });
                keep_columns.push(false);
            }
        }

        let raw_width = keep_columns.len();
        Self {
            format,
            headers,
            keep_columns,
            raw_width,
            rows: Vec::new(),
            warnings,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// 原始表头数（含被丢弃的重复列）
    pub fn raw_width(&self) -> usize {
        self.raw_width
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 按位置追加一条记录
    ///
    /// # 规则
    /// - 字段少于表头：尾部补 Null
    /// - 字段多于表头：截断并记录 ExtraFields 警告
    pub fn push_record(&mut self, values: Vec<CellValue>) {
        let row_number = self.rows.len() + 1;

        if values.len() > self.raw_width {
            self.warnings.push(ParseWarning::ExtraFields {
                row: row_number,
                expected: self.raw_width,
                found: values.len(),
            });
        }

        let mut cells = HashMap::with_capacity(self.headers.len());
        let mut values = values.into_iter();
        let mut header_iter = self.headers.iter();

        for keep in &self.keep_columns {
            let value = values.next().unwrap_or(CellValue::Null);
            if !keep {
                continue;
            }
            if let Some(header) = header_iter.next() {
                cells.insert(header.clone(), value);
            }
        }

        self.rows.push(ParsedRow { row_number, cells });
    }

    /// 完成构建
    ///
    /// 表头有效但无数据行时附加 EmptyFile 提示（非致命）
    pub fn finish(mut self) -> ParsedTable {
        if self.rows.is_empty() {
            self.warnings.push(ParseWarning::EmptyFile);
        }

        ParsedTable {
            format: self.format,
            headers: self.headers,
            rows: self.rows,
            warnings: self.warnings,
        }
    }
}
