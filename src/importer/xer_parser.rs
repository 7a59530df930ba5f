// ==========================================
// 项目进度导入核心 - 交换格式解析器
// ==========================================
// 结构: 制表符分隔的标签行
//   ERMHDR  文件头（必须为首行）
//   %T      开始一张表
//   %F      字段声明
//   %R      记录
//   %E      文件结束
// 只读取配置的任务表，其余表跳过
// ==========================================

use crate::config::ImportConfig;
use crate::domain::task::ParsedTable;
use crate::domain::types::{CellValue, FormatKind};
use crate::importer::error::{ParseError, ParseResult};
use crate::importer::format_detector::{decode_text, XER_HEADER_TAG};
use crate::importer::import_trait::FileParser;
use crate::importer::row_table::RowTableBuilder;
use tracing::debug;

const TABLE_TAG: &str = "%T";
const FIELDS_TAG: &str = "%F";
const RECORD_TAG: &str = "%R";
const END_TAG: &str = "%E";

pub struct XerParser {
    task_table: String,
    trim_cells: bool,
}

impl XerParser {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            task_table: config.xer_task_table.clone(),
            trim_cells: config.trim_cells,
        }
    }

    /// 解析已解码的文本
    pub fn parse_text(&self, text: &str) -> ParseResult<ParsedTable> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim_end_matches('\r')))
            .filter(|(_, line)| !line.trim().is_empty());

        match lines.next() {
            Some((_, first)) if first.split('\t').next() == Some(XER_HEADER_TAG) => {}
            Some(_) => {
                return Err(ParseError::UnsupportedFormat(
                    "xer（首行不是 ERMHDR）".to_string(),
                ))
            }
            None => return Err(ParseError::EmptyFile),
        }

        let mut current_table: Option<String> = None;
        let mut builder: Option<RowTableBuilder> = None;

        for (line_no, line) in lines {
            let mut parts = line.split('\t');
            let tag = parts.next().unwrap_or_default();
            let in_task_table = current_table.as_deref() == Some(self.task_table.as_str());

            match tag {
                TABLE_TAG => {
                    let name = parts.next().unwrap_or_default().trim().to_string();
                    if builder.is_some() && name == self.task_table {
                        return Err(ParseError::malformed(line_no, "任务表重复出现"));
                    }
                    if name != self.task_table {
                        debug!(table = %name, "跳过非任务表");
                    }
                    current_table = Some(name);
                }
                FIELDS_TAG if in_task_table => {
                    if builder.is_some() {
                        return Err(ParseError::malformed(line_no, "任务表字段声明重复"));
                    }
                    builder = Some(RowTableBuilder::new(FormatKind::ExchangeTagged, parts));
                }
                RECORD_TAG if in_task_table => {
                    let table = builder
                        .as_mut()
                        .ok_or_else(|| ParseError::malformed(line_no, "记录出现在字段声明之前"))?;
                    let values = parts
                        .map(|field| CellValue::from_text(field, self.trim_cells))
                        .collect();
                    table.push_record(values);
                }
                END_TAG => break,
                FIELDS_TAG | RECORD_TAG => {}
                other => debug!(line = line_no, tag = other, "跳过未知标签行"),
            }
        }

        let builder = builder.ok_or(ParseError::EmptyFile)?;
        debug!(
            table = %self.task_table,
            headers = builder.headers().len(),
            rows = builder.row_count(),
            "交换格式任务表解析完成"
        );
        Ok(builder.finish())
    }
}

impl FileParser for XerParser {
    fn format(&self) -> FormatKind {
        FormatKind::ExchangeTagged
    }

    fn parse(&self, content: &[u8]) -> ParseResult<ParsedTable> {
        self.parse_text(decode_text(content)?)
    }
}
