// ==========================================
// 项目进度导入核心 - 核心库
// ==========================================
// 职责: 多格式进度文件解析 + 字段映射确认 + 标准任务落定
// 系统定位: 导入核心 (人工确认映射，不直接持久化)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 解析/映射/落定
pub mod importer;

// 配置层 - 导入参数与标准字段表
pub mod config;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    CanonicalTask, CellValue, CoercionWarning, FieldKind, FormatKind, ImportReport, ParseWarning,
    ParsedRow, ParsedTable,
};

// 配置
pub use config::{CanonicalField, CanonicalSchema, ConfigManager, ImportConfig, ImportConfigReader};

// 导入流程
pub use importer::{
    finalize, finalize_with, parse_file, propose_mapping, validate, FieldMapping, FileParser,
    ImportError, ImportResult, ImportSession, ImportSink, MappingError, ParseError,
};

// ==========================================
// 常量定义
// ==========================================

// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "项目进度导入核心";
