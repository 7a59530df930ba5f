// ==========================================
// 项目进度导入核心 - 分隔文本解析器
// ==========================================
// 支持: 可配置分隔符 / 引号内分隔符与换行 / 双写引号转义
// 首行为表头，其余按位置对齐表头
// ==========================================

use crate::config::ImportConfig;
use crate::domain::task::ParsedTable;
use crate::domain::types::{CellValue, FormatKind};
use crate::importer::error::{ParseError, ParseResult};
use crate::importer::format_detector::decode_text;
use crate::importer::import_trait::FileParser;
use crate::importer::row_table::RowTableBuilder;
use csv::ReaderBuilder;
use tracing::debug;

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser {
    delimiter: u8,
    quote: u8,
    trim_cells: bool,
}

impl CsvParser {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            delimiter: config.delimiter_byte(),
            quote: config.quote_byte(),
            trim_cells: config.trim_cells,
        }
    }

    /// 解析已解码的文本
    pub fn parse_text(&self, text: &str) -> ParseResult<ParsedTable> {
        // csv 读取器在 EOF 处会静默闭合引号，需先行检查
        if let Some(line) = find_unterminated_quote(text, self.delimiter, self.quote) {
            return Err(ParseError::malformed(line, "引号未闭合直到文件结尾"));
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(self.delimiter)
            .quote(self.quote)
            .double_quote(true)
            .from_reader(text.as_bytes());

        let mut records = reader.records();

        // 读取表头
        let header_record = match records.next() {
            Some(result) => result?,
            None => return Err(ParseError::EmptyFile),
        };
        let mut builder = RowTableBuilder::new(FormatKind::DelimitedText, header_record.iter());

        // 读取所有行
        for result in records {
            let record = result?;
            let values = record
                .iter()
                .map(|field| CellValue::from_text(field, self.trim_cells))
                .collect();
            builder.push_record(values);
        }

        debug!(
            headers = builder.headers().len(),
            rows = builder.row_count(),
            "CSV 解析完成"
        );
        Ok(builder.finish())
    }
}

impl FileParser for CsvParser {
    fn format(&self) -> FormatKind {
        FormatKind::DelimitedText
    }

    fn parse(&self, content: &[u8]) -> ParseResult<ParsedTable> {
        self.parse_text(decode_text(content)?)
    }
}

/// 查找未闭合的引号字段
///
/// # 返回
/// - Some(line): 未闭合引号所在的起始行号（从 1 开始）
/// - None: 引号全部闭合
///
/// 只有字段起始处的引号才开启引用，与 csv 读取器一致
fn find_unterminated_quote(text: &str, delimiter: u8, quote: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut line = 1;
    let mut open_line = 0;
    let mut in_quotes = false;
    let mut field_start = true;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_quotes {
            if b == quote {
                if bytes.get(i + 1) == Some(&quote) {
                    i += 2;
                    continue;
                }
                in_quotes = false;
            } else if b == b'\n' {
                line += 1;
            }
        } else if b == quote && field_start {
            in_quotes = true;
            open_line = line;
            field_start = false;
        } else if b == delimiter || b == b'\r' {
            field_start = true;
        } else if b == b'\n' {
            line += 1;
            field_start = true;
        } else {
            field_start = false;
        }
        i += 1;
    }

    if in_quotes {
        Some(open_line)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::ParseWarning;

    fn parser() -> CsvParser {
        CsvParser::new(&ImportConfig::default())
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_csv_parser_basic() {
        let table = parser()
            .parse(b"Task Name,Start,Finish\nFoundation,2024-01-01,2024-01-10\nFraming,2024-01-11,2024-02-01\n")
            .unwrap();

        assert_eq!(table.headers, vec!["Task Name", "Start", "Finish"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].get("Task Name"), Some(&text("Foundation")));
        assert_eq!(table.rows[1].get("Finish"), Some(&text("2024-02-01")));
        assert!(table.warnings.is_empty());
    }

    #[test]
    fn test_quoted_field_with_delimiter_and_newline() {
        let table = parser()
            .parse(b"Name,Notes\n\"Pour, cure\",\"line one\nline two\"\n")
            .unwrap();

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].get("Name"), Some(&text("Pour, cure")));
        assert_eq!(table.rows[0].get("Notes"), Some(&text("line one\nline two")));
    }

    #[test]
    fn test_doubled_quote_escape() {
        let table = parser().parse(b"Name\n\"12\"\" pipe\"\n").unwrap();
        assert_eq!(table.rows[0].get("Name"), Some(&text("12\" pipe")));
    }

    #[test]
    fn test_unterminated_quote_is_malformed() {
        let err = parser().parse(b"Name,Notes\nA,ok\nB,\"never closed\n").unwrap_err();
        assert_eq!(err, ParseError::malformed(3, "引号未闭合直到文件结尾"));
    }

    #[test]
    fn test_inner_quote_in_unquoted_field_is_literal() {
        let table = parser().parse(b"Size\n5\" pipe\n").unwrap();
        assert_eq!(table.rows[0].get("Size"), Some(&text("5\" pipe")));
    }

    #[test]
    fn test_header_only_yields_empty_rows() {
        let table = parser().parse(b"Task Name,Start\n").unwrap();
        assert_eq!(table.headers.len(), 2);
        assert!(table.rows.is_empty());
        assert_eq!(table.warnings, vec![ParseWarning::EmptyFile]);
    }

    #[test]
    fn test_no_content_is_empty_file_error() {
        assert_eq!(parser().parse(b"").unwrap_err(), ParseError::EmptyFile);
    }

    #[test]
    fn test_custom_delimiter_and_bom() {
        let config = ImportConfig {
            delimiter: ';',
            ..ImportConfig::default()
        };
        let table = CsvParser::new(&config)
            .parse(b"\xEF\xBB\xBFName;Start\nA;2024-01-01\n")
            .unwrap();
        assert_eq!(table.headers, vec!["Name", "Start"]);
        assert_eq!(table.rows[0].get("Start"), Some(&text("2024-01-01")));
    }

    #[test]
    fn test_blank_cell_is_null() {
        let table = parser().parse(b"Name,Start\nA,  \n").unwrap();
        assert_eq!(table.rows[0].get("Start"), Some(&CellValue::Null));
    }

    #[test]
    fn test_invalid_utf8_is_malformed_not_replaced() {
        let err = parser().parse(b"Name\nCaf\xe9\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn test_multibyte_text_kept_intact() {
        let table = parser().parse("Name\nCafé\n".as_bytes()).unwrap();
        assert_eq!(table.rows[0].get("Name"), Some(&text("Café")));
    }
}
