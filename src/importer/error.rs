// ==========================================
// 项目进度导入核心 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分级: 解析错误致命；映射缺口与类型转换只做汇总提示
// ==========================================

use crate::config::ConfigError;
use crate::i18n::t_with_args;
use thiserror::Error;

// ==========================================
// ParseError - 文件级致命错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("文件格式不支持: {0}（仅支持 .csv/.mpp/.xer）")]
    UnsupportedFormat(String),

    #[error("记录结构损坏 (行 {line}): {message}")]
    MalformedRecord { line: usize, message: String },

    #[error(
        "项目文件版本不支持: {}（支持范围 {min}-{max}）",
        .found.map_or_else(|| "未知".to_string(), |v| v.to_string())
    )]
    UnsupportedVersion {
        found: Option<u32>,
        min: u32,
        max: u32,
    },

    #[error("文件为空: 未找到有效表头")]
    EmptyFile,

    #[error("文件读取失败: {0}")]
    FileRead(String),
}

impl ParseError {
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        ParseError::MalformedRecord {
            line,
            message: message.into(),
        }
    }

    /// 面向用户的单条提示（本地化）
    pub fn user_message(&self) -> String {
        match self {
            ParseError::UnsupportedFormat(format) => {
                t_with_args("import.unsupported_format", &[("format", format.as_str())])
            }
            ParseError::MalformedRecord { line, message } => t_with_args(
                "import.malformed_record",
                &[("line", line.to_string().as_str()), ("message", message.as_str())],
            ),
            ParseError::UnsupportedVersion { found, min, max } => {
                let found = found.map_or_else(|| "?".to_string(), |v| v.to_string());
                t_with_args(
                    "import.unsupported_version",
                    &[
                        ("found", found.as_str()),
                        ("min", min.to_string().as_str()),
                        ("max", max.to_string().as_str()),
                    ],
                )
            }
            ParseError::EmptyFile => t_with_args("import.empty_file", &[]),
            ParseError::FileRead(message) => {
                t_with_args("import.file_read_failed", &[("message", message.as_str())])
            }
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        ParseError::FileRead(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line() as usize).unwrap_or(0);
        ParseError::MalformedRecord {
            line,
            message: err.to_string(),
        }
    }
}

// ==========================================
// MappingError - 字段映射错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("未知表头: {0}")]
    UnknownHeader(String),

    #[error("未知标准字段 (表头 {header}): {field}")]
    UnknownField { header: String, field: String },

    #[error("必填字段未映射: {}", .0.join(", "))]
    MissingRequiredFields(Vec<String>),
}

// ==========================================
// FinalizeError - 落定阶段错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FinalizeError {
    #[error("映射与解析结果不是同一组表头: 期望 {expected:?}，实际 {found:?}")]
    HeaderMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("必填字段未映射: {}", .0.join(", "))]
    MissingRequiredFields(Vec<String>),
}

// ==========================================
// ImportError - 导入流程统一错误
// ==========================================
#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Finalize(#[from] FinalizeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("导入结果提交失败: {0}")]
    Sink(#[from] anyhow::Error),
}

impl ImportError {
    /// 面向用户的单条提示（本地化）
    pub fn user_message(&self) -> String {
        match self {
            ImportError::Parse(err) => err.user_message(),
            ImportError::Mapping(MappingError::MissingRequiredFields(fields))
            | ImportError::Finalize(FinalizeError::MissingRequiredFields(fields)) => t_with_args(
                "import.missing_required_fields",
                &[("fields", fields.join(", ").as_str())],
            ),
            ImportError::Mapping(MappingError::UnknownHeader(header)) => {
                t_with_args("import.unknown_header", &[("header", header.as_str())])
            }
            ImportError::Mapping(MappingError::UnknownField { header, field }) => t_with_args(
                "import.unknown_field",
                &[("header", header.as_str()), ("field", field.as_str())],
            ),
            ImportError::Finalize(FinalizeError::HeaderMismatch { .. }) => {
                t_with_args("import.header_mismatch", &[])
            }
            ImportError::Config(err) => {
                t_with_args("import.config_invalid", &[("message", err.to_string().as_str())])
            }
            ImportError::Sink(err) => {
                t_with_args("import.sink_failed", &[("message", err.to_string().as_str())])
            }
        }
    }
}

/// Result 类型别名
pub type ParseResult<T> = Result<T, ParseError>;
pub type ImportResult<T> = Result<T, ImportError>;
