// ==========================================
// 项目进度导入核心 - 导入参数配置
// ==========================================
// 职责: 分隔符 / 日期格式 / 二进制版本范围等解析参数
// 红线: 显式传入,不做全局静态状态
// ==========================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 默认接受的日期格式（按顺序尝试）
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },

    #[error("标准字段定义错误: {0}")]
    InvalidSchema(String),

    #[error("配置快照解析失败: {0}")]
    Snapshot(String),

    #[error("配置锁获取失败")]
    LockPoisoned,
}

// ==========================================
// ImportConfig - 导入参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// CSV 字段分隔符
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// CSV 引号字符（双写转义）
    #[serde(default = "default_quote")]
    pub quote: char,

    /// 单元格首尾空白是否裁剪
    #[serde(default = "default_true")]
    pub trim_cells: bool,

    /// 日期字段接受的格式列表（chrono strftime 语法）
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,

    /// 项目二进制格式支持的最低版本号（含）
    #[serde(default = "default_mpp_min_version")]
    pub mpp_min_version: u32,

    /// 项目二进制格式支持的最高版本号（含）
    #[serde(default = "default_mpp_max_version")]
    pub mpp_max_version: u32,

    /// 内容嗅探读取的字节数
    #[serde(default = "default_sniff_window")]
    pub sniff_window: usize,

    /// 交换格式中承载任务的表名
    #[serde(default = "default_xer_task_table")]
    pub xer_task_table: String,
}

fn default_delimiter() -> char {
    ','
}

fn default_quote() -> char {
    '"'
}

fn default_true() -> bool {
    true
}

fn default_date_formats() -> Vec<String> {
    DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect()
}

fn default_mpp_min_version() -> u32 {
    9
}

fn default_mpp_max_version() -> u32 {
    14
}

fn default_sniff_window() -> usize {
    512
}

fn default_xer_task_table() -> String {
    "TASK".to_string()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            quote: default_quote(),
            trim_cells: default_true(),
            date_formats: default_date_formats(),
            mpp_min_version: default_mpp_min_version(),
            mpp_max_version: default_mpp_max_version(),
            sniff_window: default_sniff_window(),
            xer_task_table: default_xer_task_table(),
        }
    }
}

impl ImportConfig {
    /// 校验参数组合
    ///
    /// # 规则
    /// - 分隔符与引号必须是单字节 ASCII 且互不相同
    /// - 至少一个日期格式
    /// - 版本范围 min <= max
    /// - 嗅探窗口 > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.delimiter.is_ascii() || self.delimiter == '\n' || self.delimiter == '\r' {
            return Err(invalid(
                "delimiter",
                &self.delimiter.to_string(),
                "必须是单字节 ASCII 且不是换行",
            ));
        }
        if !self.quote.is_ascii() || self.quote == '\n' || self.quote == '\r' {
            return Err(invalid(
                "quote",
                &self.quote.to_string(),
                "必须是单字节 ASCII 且不是换行",
            ));
        }
        if self.delimiter == self.quote {
            return Err(invalid("quote", &self.quote.to_string(), "不能与分隔符相同"));
        }
        if self.date_formats.iter().all(|f| f.trim().is_empty()) {
            return Err(invalid("date_formats", "[]", "至少需要一个日期格式"));
        }
        if self.mpp_min_version > self.mpp_max_version {
            return Err(invalid(
                "mpp_min_version",
                &self.mpp_min_version.to_string(),
                &format!("不能大于 mpp_max_version ({})", self.mpp_max_version),
            ));
        }
        if self.sniff_window == 0 {
            return Err(invalid("sniff_window", "0", "必须大于 0"));
        }
        if self.xer_task_table.trim().is_empty() {
            return Err(invalid("xer_task_table", "", "不能为空"));
        }
        Ok(())
    }

    /// 分隔符字节（validate 保证为 ASCII）
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    pub fn quote_byte(&self) -> u8 {
        self.quote as u8
    }

    pub fn mpp_version_supported(&self, version: u32) -> bool {
        (self.mpp_min_version..=self.mpp_max_version).contains(&version)
    }
}

fn invalid(key: &str, value: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ImportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.delimiter_byte(), b',');
        assert!(config.mpp_version_supported(14));
        assert!(!config.mpp_version_supported(15));
    }

    #[test]
    fn test_delimiter_equal_to_quote_rejected() {
        let config = ImportConfig {
            delimiter: '"',
            ..ImportConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "quote"
        ));
    }

    #[test]
    fn test_newline_quote_rejected() {
        for quote in ['\n', '\r'] {
            let config = ImportConfig {
                quote,
                ..ImportConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidValue { ref key, .. }) if key == "quote"
            ));
        }
    }

    #[test]
    fn test_inverted_version_range_rejected() {
        let config = ImportConfig {
            mpp_min_version: 14,
            mpp_max_version: 9,
            ..ImportConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ImportConfig = serde_json::from_str(r#"{"delimiter":";"}"#).unwrap();
        assert_eq!(config.delimiter, ';');
        assert_eq!(config.quote, '"');
        assert_eq!(config.date_formats.len(), DEFAULT_DATE_FORMATS.len());
    }
}
