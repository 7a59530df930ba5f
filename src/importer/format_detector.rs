// ==========================================
// 项目进度导入核心 - 格式识别
// ==========================================
// 规则: 扩展名优先；无扩展名时按内容签名嗅探；都不命中则失败
// 红线: 识别失败时任何解析器都不会被调用
// ==========================================

use crate::config::ImportConfig;
use crate::domain::types::FormatKind;
use crate::importer::error::{ParseError, ParseResult};
use std::path::Path;
use tracing::debug;

/// OLE2 复合文档签名（项目二进制文件的容器格式）
pub const OLE2_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// 交换格式首行标签
pub const XER_HEADER_TAG: &str = "ERMHDR";

/// UTF-8 BOM
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub struct FormatDetector {
    sniff_window: usize,
    delimiter: char,
}

impl FormatDetector {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            sniff_window: config.sniff_window,
            delimiter: config.delimiter,
        }
    }

    /// 识别文件格式
    ///
    /// # 参数
    /// - file_name: 文件名（可含路径）
    /// - content: 文件内容（嗅探只看前 sniff_window 字节）
    ///
    /// # 返回
    /// - Ok(FormatKind): 识别结果
    /// - Err(UnsupportedFormat): 扩展名不受支持，或无扩展名且嗅探失败
    pub fn detect(&self, file_name: &str, content: &[u8]) -> ParseResult<FormatKind> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.trim())
            .filter(|e| !e.is_empty());

        if let Some(ext) = ext {
            return FormatKind::from_extension(ext).ok_or_else(|| {
                debug!(file_name, ext, "扩展名不受支持");
                ParseError::UnsupportedFormat(ext.to_lowercase())
            });
        }

        match self.sniff(content) {
            Some(kind) => {
                debug!(file_name, format = %kind, "按内容签名识别格式");
                Ok(kind)
            }
            None => Err(ParseError::UnsupportedFormat(if file_name.is_empty() {
                "unknown".to_string()
            } else {
                file_name.to_string()
            })),
        }
    }

    /// 内容嗅探
    ///
    /// # 顺序
    /// 1. OLE2 签名 → 项目二进制
    /// 2. 首个非空行以 ERMHDR 开头 → 交换格式
    /// 3. 可读文本且首行含分隔符 → 分隔文本
    pub fn sniff(&self, content: &[u8]) -> Option<FormatKind> {
        if content.starts_with(&OLE2_SIGNATURE) {
            return Some(FormatKind::ProjectBinary);
        }

        let window = &content[..content.len().min(self.sniff_window)];
        let window = window.strip_prefix(UTF8_BOM).unwrap_or(window);
        let text = match std::str::from_utf8(window) {
            Ok(text) => text,
            // 窗口截断在多字节字符中间时，取有效前缀
            Err(e) if e.error_len().is_none() => {
                std::str::from_utf8(&window[..e.valid_up_to()]).ok()?
            }
            Err(_) => return None,
        };

        if text.contains('\0') {
            return None;
        }

        let first_line = text.lines().find(|l| !l.trim().is_empty())?;
        if first_line.trim_start().starts_with(XER_HEADER_TAG) {
            return Some(FormatKind::ExchangeTagged);
        }
        if first_line.contains(self.delimiter) {
            return Some(FormatKind::DelimitedText);
        }
        None
    }
}

/// 按 UTF-8 解码文本内容（去掉 BOM）
///
/// 非法字节不做替换，返回所在行号的 MalformedRecord
pub fn decode_text(content: &[u8]) -> ParseResult<&str> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    std::str::from_utf8(content).map_err(|e| {
        let offset = e.valid_up_to();
        let line = content[..offset].iter().filter(|b| **b == b'\n').count() + 1;
        ParseError::malformed(line, format!("非 UTF-8 编码内容（字节偏移 {}）", offset))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> FormatDetector {
        FormatDetector::new(&ImportConfig::default())
    }

    #[test]
    fn test_extension_wins_over_content() {
        let kind = detector().detect("plan.XER", b"Task Name,Start\n").unwrap();
        assert_eq!(kind, FormatKind::ExchangeTagged);
    }

    #[test]
    fn test_unknown_extension_fails_without_sniffing() {
        let err = detector().detect("plan.xlsx", b"Task Name,Start\n").unwrap_err();
        assert_eq!(err, ParseError::UnsupportedFormat("xlsx".to_string()));
    }

    #[test]
    fn test_sniff_binary_signature() {
        let mut content = OLE2_SIGNATURE.to_vec();
        content.extend_from_slice(&[0u8; 32]);
        assert_eq!(detector().detect("upload", &content).unwrap(), FormatKind::ProjectBinary);
    }

    #[test]
    fn test_sniff_exchange_header() {
        let content = b"\xEF\xBB\xBFERMHDR\t19.12\t2024-01-01\n%T\tTASK\n";
        assert_eq!(detector().detect("export", content).unwrap(), FormatKind::ExchangeTagged);
    }

    #[test]
    fn test_sniff_delimited_text() {
        assert_eq!(
            detector().detect("data", b"Task Name,Start\nA,2024-01-01\n").unwrap(),
            FormatKind::DelimitedText
        );
    }

    #[test]
    fn test_sniff_failure_is_unsupported() {
        let err = detector().detect("blob", &[0x00, 0x01, 0x02, 0x03]).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_trailing_dot_treated_as_absent_extension() {
        assert_eq!(
            detector().detect("data.", b"a,b\n1,2\n").unwrap(),
            FormatKind::DelimitedText
        );
    }

    #[test]
    fn test_decode_text_strips_bom_and_reports_bad_bytes() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFName\n").unwrap(), "Name\n");
        assert_eq!(
            decode_text(b"Name\nA\nB\xff\n").unwrap_err(),
            ParseError::malformed(3, "非 UTF-8 编码内容（字节偏移 8）")
        );
    }
}
