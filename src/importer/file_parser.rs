// ==========================================
// 项目进度导入核心 - 文件解析协调器
// ==========================================
// 阶段 0: 格式识别 → 分派到对应解析器
// 支持: 分隔文本 (.csv) / 项目二进制 (.mpp) / 交换格式 (.xer)
// ==========================================

use crate::config::ImportConfig;
use crate::domain::task::ParsedTable;
use crate::domain::types::FormatKind;
use crate::importer::csv_parser::CsvParser;
use crate::importer::error::{ParseError, ParseResult};
use crate::importer::format_detector::FormatDetector;
use crate::importer::import_trait::FileParser;
use crate::importer::mpp_parser::MppParser;
use crate::importer::xer_parser::XerParser;
use crate::perf::PerfGuard;
use std::path::Path;
use tracing::{info, instrument, warn};

// ==========================================
// FormatParser - 格式 → 解析器（封闭集合）
// ==========================================
pub enum FormatParser {
    Csv(CsvParser),
    Mpp(MppParser),
    Xer(XerParser),
}

impl FormatParser {
    pub fn for_kind(kind: FormatKind, config: &ImportConfig) -> Self {
        match kind {
            FormatKind::DelimitedText => FormatParser::Csv(CsvParser::new(config)),
            FormatKind::ProjectBinary => FormatParser::Mpp(MppParser::new(config)),
            FormatKind::ExchangeTagged => FormatParser::Xer(XerParser::new(config)),
        }
    }
}

impl FileParser for FormatParser {
    fn format(&self) -> FormatKind {
        match self {
            FormatParser::Csv(p) => p.format(),
            FormatParser::Mpp(p) => p.format(),
            FormatParser::Xer(p) => p.format(),
        }
    }

    fn parse(&self, content: &[u8]) -> ParseResult<ParsedTable> {
        match self {
            FormatParser::Csv(p) => p.parse(content),
            FormatParser::Mpp(p) => p.parse(content),
            FormatParser::Xer(p) => p.parse(content),
        }
    }
}

// ==========================================
// 通用文件解析器（识别格式后自动选择）
// ==========================================
pub struct UniversalFileParser {
    config: ImportConfig,
}

impl UniversalFileParser {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// 解析内存中的文件内容
    ///
    /// # 参数
    /// - file_name: 原始文件名（用于扩展名识别）
    /// - content: 文件字节
    ///
    /// # 返回
    /// - Ok(ParsedTable): 表头 + 行
    /// - Err(ParseError): 识别或解析失败，不返回部分结果
    pub fn parse_bytes(&self, file_name: &str, content: &[u8]) -> ParseResult<ParsedTable> {
        let mut perf = PerfGuard::new("parse_file");

        let kind = FormatDetector::new(&self.config).detect(file_name, content)?;
        if content.is_empty() {
            return Err(ParseError::EmptyFile);
        }

        let parser = FormatParser::for_kind(kind, &self.config);
        match parser.parse(content) {
            Ok(table) => {
                perf.set_rows(table.rows.len());
                info!(
                    file_name,
                    format = %kind,
                    headers = table.headers.len(),
                    rows = table.rows.len(),
                    warnings = table.warnings.len(),
                    "文件解析完成"
                );
                Ok(table)
            }
            Err(e) => {
                warn!(file_name, format = %kind, error = %e, "文件解析失败");
                Err(e)
            }
        }
    }

    /// 读取并解析磁盘文件
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn parse_file<P: AsRef<Path>>(&self, path: P) -> ParseResult<ParsedTable> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.parse_bytes(&file_name, &content)
    }
}

/// 解析文件（按配置识别格式）
pub async fn parse_file<P: AsRef<Path>>(path: P, config: &ImportConfig) -> ParseResult<ParsedTable> {
    UniversalFileParser::new(config.clone()).parse_file(path).await
}
