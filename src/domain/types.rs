// ==========================================
// 项目进度导入核心 - 领域类型定义
// ==========================================
// 职责: 源格式 / 字段类型 / 单元格值
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 源文件格式 (Format Kind)
// ==========================================
// 固定三种,不做插件注册
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormatKind {
    DelimitedText, // 分隔文本 (.csv)
    ProjectBinary, // 项目二进制 (.mpp)
    ExchangeTagged, // 标签交换格式 (.xer)
}

impl FormatKind {
    /// 按扩展名匹配（大小写不敏感，不含点）
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(FormatKind::DelimitedText),
            "mpp" => Some(FormatKind::ProjectBinary),
            "xer" => Some(FormatKind::ExchangeTagged),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FormatKind::DelimitedText => "csv",
            FormatKind::ProjectBinary => "mpp",
            FormatKind::ExchangeTagged => "xer",
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatKind::DelimitedText => write!(f, "DELIMITED_TEXT"),
            FormatKind::ProjectBinary => write!(f, "PROJECT_BINARY"),
            FormatKind::ExchangeTagged => write!(f, "EXCHANGE_TAGGED"),
        }
    }
}

// ==========================================
// 标准字段类型 (Field Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Date,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Number => write!(f, "number"),
            FieldKind::Date => write!(f, "date"),
        }
    }
}

// ==========================================
// 单元格值 (Cell Value)
// ==========================================
// 解析阶段: Text / Number / Null（二进制格式可直接给出 Date）
// 落定阶段: 与 FieldKind 对齐后的值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Null,
}

impl CellValue {
    /// 文本单元格：空白视为 Null
    pub fn from_text(raw: &str, trim: bool) -> Self {
        let value = if trim { raw.trim() } else { raw };
        if value.trim().is_empty() {
            CellValue::Null
        } else {
            CellValue::Text(value.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Null => write!(f, ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_kind_from_extension() {
        assert_eq!(FormatKind::from_extension("CSV"), Some(FormatKind::DelimitedText));
        assert_eq!(FormatKind::from_extension("mpp"), Some(FormatKind::ProjectBinary));
        assert_eq!(FormatKind::from_extension("Xer"), Some(FormatKind::ExchangeTagged));
        assert_eq!(FormatKind::from_extension("xlsx"), None);
    }

    #[test]
    fn test_cell_value_blank_is_null() {
        assert_eq!(CellValue::from_text("   ", true), CellValue::Null);
        assert_eq!(CellValue::from_text("", false), CellValue::Null);
        assert_eq!(
            CellValue::from_text("  Foundation ", true),
            CellValue::Text("Foundation".to_string())
        );
    }

    #[test]
    fn test_cell_value_serde_tagged() {
        let json = serde_json::to_string(&CellValue::Number(2.5)).unwrap();
        assert_eq!(json, r#"{"type":"number","value":2.5}"#);

        let null = serde_json::to_string(&CellValue::Null).unwrap();
        assert_eq!(null, r#"{"type":"null"}"#);
    }
}
