// ==========================================
// 项目进度导入核心 - 值类型转换器
// ==========================================
// 职责: 原始单元格值 → 标准字段类型
// 规则: 转换失败返回 None，由调用方置空并记录警告
// ==========================================

use crate::config::ImportConfig;
use crate::domain::types::{CellValue, FieldKind};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// 数值后缀（百分号 / 工期单位），匹配时忽略大小写
const NUMBER_SUFFIXES: &[&str] = &["%", "days", "day", "d"];

pub struct ValueCoercer {
    date_formats: Vec<String>,
}

impl ValueCoercer {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            date_formats: config.date_formats.clone(),
        }
    }

    /// 转换单元格值
    ///
    /// # 返回
    /// - Some(CellValue::Null): 原值为空
    /// - Some(value): 转换成功，类型与 kind 一致
    /// - None: 无法转换
    pub fn coerce(&self, value: &CellValue, kind: FieldKind) -> Option<CellValue> {
        match (value, kind) {
            (CellValue::Null, _) => Some(CellValue::Null),

            // 文本原样保留
            (CellValue::Text(s), FieldKind::Text) => Some(CellValue::Text(s.clone())),
            (CellValue::Number(n), FieldKind::Text) => Some(CellValue::Text(n.to_string())),
            (CellValue::Date(d), FieldKind::Text) => {
                Some(CellValue::Text(d.format("%Y-%m-%d").to_string()))
            }

            (CellValue::Number(n), FieldKind::Number) => Some(CellValue::Number(*n)),
            (CellValue::Text(s), FieldKind::Number) => self.parse_number(s).map(CellValue::Number),
            (CellValue::Date(_), FieldKind::Number) => None,

            (CellValue::Date(d), FieldKind::Date) => Some(CellValue::Date(*d)),
            (CellValue::Text(s), FieldKind::Date) => self.parse_date(s).map(CellValue::Date),
            (CellValue::Number(_), FieldKind::Date) => None,
        }
    }

    /// 解析数值
    ///
    /// 接受千分位逗号与常见后缀: "1,250.5" / "75%" / "5 days"
    pub fn parse_number(&self, raw: &str) -> Option<f64> {
        let mut value = raw.trim();
        let lower = value.to_ascii_lowercase();
        for suffix in NUMBER_SUFFIXES {
            if lower.ends_with(suffix) && lower.len() > suffix.len() {
                value = value[..value.len() - suffix.len()].trim_end();
                break;
            }
        }

        let cleaned = strip_thousands_separators(value)?;
        if cleaned.is_empty() {
            return None;
        }
        cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
    }

    /// 解析日期
    ///
    /// 依次尝试: 配置格式（日期 / 日期时间）→ RFC 3339
    pub fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }

        for format in &self.date_formats {
            if let Ok(date) = NaiveDate::parse_from_str(value, format) {
                return Some(date);
            }
            if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
                return Some(datetime.date());
            }
        }

        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.date_naive())
            .ok()
    }
}

/// 去掉千分位逗号
///
/// 逗号只允许出现在整数部分且每组恰好三位（"1,250.5"）；
/// "1,5" 或 "1,2,3" 之类返回 None
fn strip_thousands_separators(value: &str) -> Option<String> {
    if !value.contains(',') {
        return Some(value.to_string());
    }

    let (integer, fraction) = match value.find('.') {
        Some(idx) => value.split_at(idx),
        None => (value, ""),
    };
    if fraction.contains(',') {
        return None;
    }

    let unsigned = integer.strip_prefix(['-', '+']).unwrap_or(integer);
    let mut groups = unsigned.split(',');
    let head = groups.next()?;
    if head.is_empty() || head.len() > 3 || !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    Some(value.replace(',', ""))
}
