// ==========================================
// 项目进度导入核心 - 导入接口 Trait
// ==========================================
// 职责: 定义解析器与下游交接接口（不包含实现）
// ==========================================

use crate::domain::task::{CanonicalTask, ParsedTable};
use crate::domain::types::FormatKind;
use crate::importer::error::ParseResult;
use async_trait::async_trait;
use std::collections::BTreeMap;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 单一格式的解析能力
// 实现者: CsvParser, MppParser, XerParser, FormatParser
pub trait FileParser: Send + Sync {
    /// 本解析器负责的格式
    fn format(&self) -> FormatKind;

    /// 解析文件内容为统一的 { headers, tasks } 结构
    ///
    /// # 参数
    /// - content: 文件原始字节
    ///
    /// # 返回
    /// - Ok(ParsedTable): 表头 + 原始行（每行 key 集合与表头一致）
    /// - Err: UnsupportedFormat / MalformedRecord / UnsupportedVersion / EmptyFile
    fn parse(&self, content: &[u8]) -> ParseResult<ParsedTable>;
}

// ==========================================
// ImportSink Trait
// ==========================================
// 用途: 落定后的任务与确认映射交给下游（持久化协作方）
// 红线: 本核心不直接访问网络或存储
#[async_trait]
pub trait ImportSink: Send + Sync {
    /// 接收标准任务序列与确认后的映射
    ///
    /// # 参数
    /// - tasks: 标准任务（长度 == 解析行数）
    /// - mapping: 表头 → 标准字段名
    async fn on_import(
        &self,
        tasks: &[CanonicalTask],
        mapping: &BTreeMap<String, String>,
    ) -> anyhow::Result<()>;
}
