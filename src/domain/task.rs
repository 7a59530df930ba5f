// ==========================================
// 项目进度导入核心 - 任务领域模型
// ==========================================
// 职责: 解析产物 (ParsedTable/ParsedRow) 与落定产物 (CanonicalTask)
// 生命周期: 解析产物仅在单次导入内存在；CanonicalTask 交给下游持久化
// ==========================================

use crate::domain::types::{CellValue, FieldKind, FormatKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// ==========================================
// ParsedRow - 解析后的原始行
// ==========================================
// 红线: key 集合与所属文件的表头列表完全一致
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRow {
    pub row_number: usize, // 数据行序号（从 1 开始，不含表头）
    pub cells: HashMap<String, CellValue>,
}

impl ParsedRow {
    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells.get(header)
    }
}

// ==========================================
// ParseWarning - 非致命解析提示
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParseWarning {
    /// 重复表头：保留首次出现，后续同名列丢弃
    DuplicateHeader { header: String, column: usize },

    /// 记录字段多于表头：多余字段被截断
    ExtraFields {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// 表头有效但无数据行
    EmptyFile,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::DuplicateHeader { header, column } => {
                write!(f, "重复表头 '{}' (第 {} 列) 已忽略", header, column)
            }
            ParseWarning::ExtraFields {
                row,
                expected,
                found,
            } => write!(
                f,
                "第 {} 行字段数 {} 多于表头数 {}，多余字段已截断",
                row, found, expected
            ),
            ParseWarning::EmptyFile => write!(f, "文件无数据行"),
        }
    }
}

// ==========================================
// ParsedTable - 单个文件的统一解析结果
// ==========================================
// 对外形状: { headers, tasks }
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTable {
    pub format: FormatKind,
    pub headers: Vec<String>,
    #[serde(rename = "tasks")]
    pub rows: Vec<ParsedRow>,
    #[serde(default)]
    pub warnings: Vec<ParseWarning>,
}

impl ParsedTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ==========================================
// CanonicalTask - 标准任务记录
// ==========================================
// 每个标准字段都有条目：未映射/缺失/转换失败均为 Null
// row_number 为保留键，字段表不得使用同名字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTask {
    pub row_number: usize,
    #[serde(flatten)]
    pub fields: BTreeMap<String, CellValue>,
}

impl CanonicalTask {
    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.fields.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(CellValue::as_text)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(CellValue::as_number)
    }

    pub fn date(&self, field: &str) -> Option<chrono::NaiveDate> {
        self.get(field).and_then(CellValue::as_date)
    }
}

// ==========================================
// CoercionWarning - 类型转换警告
// ==========================================
// 非致命：值置空，行保留
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionWarning {
    pub row_number: usize,
    pub header: String,
    pub field: String,
    pub expected: FieldKind,
    pub raw_value: String,
}

impl fmt::Display for CoercionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "第 {} 行 列 '{}' → 字段 '{}': 无法转换为 {} (原值 '{}')",
            self.row_number, self.header, self.field, self.expected, self.raw_value
        )
    }
}

// ==========================================
// ImportReport - 导入结果
// ==========================================
// 用途: 会话确认后的返回值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub import_id: String,
    pub format: FormatKind,
    pub tasks: Vec<CanonicalTask>,
    pub mapping: BTreeMap<String, String>,
    pub parse_warnings: Vec<ParseWarning>,
    pub coercion_warnings: Vec<CoercionWarning>,
    pub elapsed_ms: u64,
}

impl ImportReport {
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn has_warnings(&self) -> bool {
        !self.parse_warnings.is_empty() || !self.coercion_warnings.is_empty()
    }
}
