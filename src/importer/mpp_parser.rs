// ==========================================
// 项目进度导入核心 - 项目二进制解析器
// ==========================================
// 范围: 只解码内嵌任务表所需子集，不实现完整专有格式
// 容器: OLE2 复合文档（签名校验）
// 版本: "MSProject.MPP<n>" 标记，超出支持范围显式失败
// ==========================================
//
// 任务表布局（小端序）:
//   "TBkndTask" 标记
//   u32 记录数
//   每条记录:
//     u32 唯一 ID
//     u16 名称长度（UTF-16 码元数） + 名称 UTF-16LE
//     u32 开始时间（自 1983-12-31 00:00 起的分钟数，u32::MAX 表示无）
//     u32 完成时间（同上）
//     u32 工期（分钟，每工作日 480 分钟）
//     u16 完成百分比
//     u16 前置任务数 + 每个 u32 前置唯一 ID

use crate::config::ImportConfig;
use crate::domain::task::ParsedTable;
use crate::domain::types::{CellValue, FormatKind};
use crate::importer::error::{ParseError, ParseResult};
use crate::importer::format_detector::OLE2_SIGNATURE;
use crate::importer::import_trait::FileParser;
use crate::importer::row_table::RowTableBuilder;
use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

/// 版本标记前缀
pub const MPP_VERSION_TAG: &[u8] = b"MSProject.MPP";

/// 任务表标记
pub const TASK_TABLE_MARKER: &[u8] = b"TBkndTask";

/// 任务表输出表头（顺序即列顺序）
pub const MPP_HEADERS: [&str; 7] = [
    "Unique ID",
    "Name",
    "Start",
    "Finish",
    "Duration",
    "% Complete",
    "Predecessors",
];

/// 无日期哨兵值
pub const NO_DATE: u32 = u32::MAX;

/// 每个工作日的分钟数
pub const MINUTES_PER_DAY: f64 = 480.0;

// ==========================================
// MPP Parser 实现
// ==========================================
pub struct MppParser {
    min_version: u32,
    max_version: u32,
}

impl MppParser {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            min_version: config.mpp_min_version,
            max_version: config.mpp_max_version,
        }
    }

    /// 读取并校验版本号
    fn check_version(&self, content: &[u8]) -> ParseResult<u32> {
        let found = read_version_marker(content);
        match found {
            Some(version) if (self.min_version..=self.max_version).contains(&version) => {
                Ok(version)
            }
            _ => {
                warn!(?found, min = self.min_version, max = self.max_version, "项目文件版本不支持");
                Err(ParseError::UnsupportedVersion {
                    found,
                    min: self.min_version,
                    max: self.max_version,
                })
            }
        }
    }
}

impl FileParser for MppParser {
    fn format(&self) -> FormatKind {
        FormatKind::ProjectBinary
    }

    fn parse(&self, content: &[u8]) -> ParseResult<ParsedTable> {
        // 检查容器签名
        if !content.starts_with(&OLE2_SIGNATURE) {
            return Err(ParseError::UnsupportedFormat(
                "mpp（缺少复合文档签名）".to_string(),
            ));
        }

        // 版本校验先于任何解码
        let version = self.check_version(content)?;

        let table_start = find(content, TASK_TABLE_MARKER)
            .ok_or_else(|| ParseError::malformed(0, "未找到任务表"))?
            + TASK_TABLE_MARKER.len();

        let mut cursor = ByteCursor::new(&content[table_start..]);
        let count = cursor.read_u32(0)?;

        let mut builder = RowTableBuilder::new(FormatKind::ProjectBinary, MPP_HEADERS);
        for record_no in 1..=count as usize {
            let values = read_task_record(&mut cursor, record_no)?;
            builder.push_record(values);
        }

        debug!(version, rows = builder.row_count(), "项目二进制任务表解码完成");
        Ok(builder.finish())
    }
}

/// 解码单条任务记录
fn read_task_record(cursor: &mut ByteCursor<'_>, record_no: usize) -> ParseResult<Vec<CellValue>> {
    let unique_id = cursor.read_u32(record_no)?;

    let name_len = cursor.read_u16(record_no)? as usize;
    let mut units = Vec::with_capacity(name_len);
    for _ in 0..name_len {
        units.push(cursor.read_u16(record_no)?);
    }
    let name = String::from_utf16_lossy(&units);

    let start = cursor.read_u32(record_no)?;
    let finish = cursor.read_u32(record_no)?;
    let duration = cursor.read_u32(record_no)?;
    let percent = cursor.read_u16(record_no)?;

    let pred_count = cursor.read_u16(record_no)?;
    let mut predecessors = Vec::with_capacity(pred_count as usize);
    for _ in 0..pred_count {
        predecessors.push(cursor.read_u32(record_no)?.to_string());
    }

    Ok(vec![
        CellValue::Number(unique_id as f64),
        CellValue::from_text(&name, true),
        minutes_to_date(start),
        minutes_to_date(finish),
        CellValue::Number(duration as f64 / MINUTES_PER_DAY),
        CellValue::Number(percent as f64),
        if predecessors.is_empty() {
            CellValue::Null
        } else {
            CellValue::Text(predecessors.join(","))
        },
    ])
}

/// 分钟偏移 → 日期
fn minutes_to_date(minutes: u32) -> CellValue {
    if minutes == NO_DATE {
        return CellValue::Null;
    }
    NaiveDate::from_ymd_opt(1983, 12, 31)
        .and_then(|epoch| epoch.and_hms_opt(0, 0, 0))
        .and_then(|epoch| epoch.checked_add_signed(Duration::minutes(minutes as i64)))
        .map(|dt| CellValue::Date(dt.date()))
        .unwrap_or(CellValue::Null)
}

/// 查找版本标记并读取其后的十进制数字
fn read_version_marker(content: &[u8]) -> Option<u32> {
    let start = find(content, MPP_VERSION_TAG)? + MPP_VERSION_TAG.len();
    let digits: String = content[start..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .map(|b| *b as char)
        .collect();
    digits.parse().ok()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

// ==========================================
// ByteCursor - 小端序读取
// ==========================================
struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take<const N: usize>(&mut self, record_no: usize) -> ParseResult<[u8; N]> {
        let bytes = self
            .data
            .get(self.pos..self.pos + N)
            .ok_or_else(|| ParseError::malformed(record_no, "任务表记录截断"))?;
        self.pos += N;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn read_u16(&mut self, record_no: usize) -> ParseResult<u16> {
        Ok(u16::from_le_bytes(self.take::<2>(record_no)?))
    }

    fn read_u32(&mut self, record_no: usize) -> ParseResult<u32> {
        Ok(u32::from_le_bytes(self.take::<4>(record_no)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::ParseWarning;

    struct Task<'a> {
        id: u32,
        name: &'a str,
        start: u32,
        finish: u32,
        duration: u32,
        percent: u16,
        preds: &'a [u32],
    }

    fn build(version: &str, tasks: &[Task<'_>]) -> Vec<u8> {
        let mut out = OLE2_SIGNATURE.to_vec();
        out.extend_from_slice(&[0u8; 24]);
        out.extend_from_slice(version.as_bytes());
        out.push(0);
        out.extend_from_slice(TASK_TABLE_MARKER);
        out.extend_from_slice(&(tasks.len() as u32).to_le_bytes());
        for t in tasks {
            out.extend_from_slice(&t.id.to_le_bytes());
            let units: Vec<u16> = t.name.encode_utf16().collect();
            out.extend_from_slice(&(units.len() as u16).to_le_bytes());
            for u in units {
                out.extend_from_slice(&u.to_le_bytes());
            }
            out.extend_from_slice(&t.start.to_le_bytes());
            out.extend_from_slice(&t.finish.to_le_bytes());
            out.extend_from_slice(&t.duration.to_le_bytes());
            out.extend_from_slice(&t.percent.to_le_bytes());
            out.extend_from_slice(&(t.preds.len() as u16).to_le_bytes());
            for p in t.preds {
                out.extend_from_slice(&p.to_le_bytes());
            }
        }
        out
    }

    fn minutes_since_epoch(y: i32, m: u32, d: u32) -> u32 {
        let epoch = NaiveDate::from_ymd_opt(1983, 12, 31).unwrap();
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        ((date - epoch).num_days() * 24 * 60) as u32
    }

    fn parser() -> MppParser {
        MppParser::new(&ImportConfig::default())
    }

    #[test]
    fn test_decode_task_table() {
        let content = build(
            "MSProject.MPP14",
            &[
                Task {
                    id: 1,
                    name: "Foundation",
                    start: minutes_since_epoch(2024, 1, 1),
                    finish: minutes_since_epoch(2024, 1, 10),
                    duration: 7 * 480,
                    percent: 100,
                    preds: &[],
                },
                Task {
                    id: 2,
                    name: "Framing",
                    start: minutes_since_epoch(2024, 1, 11),
                    finish: NO_DATE,
                    duration: 960,
                    percent: 25,
                    preds: &[1],
                },
            ],
        );

        let table = parser().parse(&content).unwrap();
        assert_eq!(table.headers, MPP_HEADERS.to_vec());
        assert_eq!(table.rows.len(), 2);

        let first = &table.rows[0];
        assert_eq!(first.get("Name"), Some(&CellValue::Text("Foundation".to_string())));
        assert_eq!(
            first.get("Start"),
            Some(&CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
        );
        assert_eq!(first.get("Duration"), Some(&CellValue::Number(7.0)));
        assert_eq!(first.get("Predecessors"), Some(&CellValue::Null));

        let second = &table.rows[1];
        assert_eq!(second.get("Finish"), Some(&CellValue::Null));
        assert_eq!(second.get("% Complete"), Some(&CellValue::Number(25.0)));
        assert_eq!(second.get("Predecessors"), Some(&CellValue::Text("1".to_string())));
    }

    #[test]
    fn test_unsupported_version_fails_before_decode() {
        let content = build("MSProject.MPP20", &[]);
        let err = parser().parse(&content).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnsupportedVersion {
                found: Some(20),
                min: 9,
                max: 14
            }
        );
    }

    #[test]
    fn test_missing_version_marker_is_unsupported_version() {
        let mut content = OLE2_SIGNATURE.to_vec();
        content.extend_from_slice(TASK_TABLE_MARKER);
        content.extend_from_slice(&0u32.to_le_bytes());
        let err = parser().parse(&content).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedVersion { found: None, .. }));
    }

    #[test]
    fn test_missing_signature_is_unsupported_format() {
        let err = parser().parse(b"Name,Start\n").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_truncated_record_is_malformed() {
        let mut content = build(
            "MSProject.MPP12",
            &[Task {
                id: 7,
                name: "Roof",
                start: NO_DATE,
                finish: NO_DATE,
                duration: 0,
                percent: 0,
                preds: &[3, 4],
            }],
        );
        content.truncate(content.len() - 3);
        let err = parser().parse(&content).unwrap_err();
        assert!(matches!(err, ParseError::MalformedRecord { line: 1, .. }));
    }

    #[test]
    fn test_empty_task_table() {
        let table = parser().parse(&build("MSProject.MPP9", &[])).unwrap();
        assert!(table.rows.is_empty());
        assert_eq!(table.warnings, vec![ParseWarning::EmptyFile]);
    }
}
