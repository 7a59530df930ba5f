// ==========================================
// 项目进度导入核心 - 导入层
// ==========================================
// 职责: 外部进度文件 → 标准任务序列
// 支持: 分隔文本 (.csv) / 项目二进制 (.mpp) / 交换格式 (.xer)
// 流程: 格式识别 → 解析 → 映射建议 → 人工确认 → 落定 → 交给下游
// ==========================================

// 模块声明
pub mod csv_parser;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod format_detector;
pub mod import_session;
pub mod import_trait;
pub mod mpp_parser;
pub mod row_table;
pub mod task_finalizer;
pub mod value_coercer;
pub mod xer_parser;

// 重导出核心类型
pub use csv_parser::CsvParser;
pub use error::{FinalizeError, ImportError, ImportResult, MappingError, ParseError, ParseResult};
pub use field_mapper::{propose_mapping, validate, FieldMapper, FieldMapping, UNMAPPED};
pub use file_parser::{parse_file, FormatParser, UniversalFileParser};
pub use format_detector::FormatDetector;
pub use import_session::ImportSession;
pub use mpp_parser::MppParser;
pub use task_finalizer::{finalize, finalize_with, FinalizeOutput, TaskFinalizer};
pub use value_coercer::ValueCoercer;
pub use xer_parser::XerParser;

// 重导出 Trait 接口
pub use import_trait::{FileParser, ImportSink};
