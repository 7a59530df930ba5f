// ==========================================
// 项目进度导入核心 - 配置层
// ==========================================
// 职责: 解析参数、标准字段表、配置读取
// 存储: 内存 key-value，宿主可替换 ImportConfigReader 实现
// ==========================================

pub mod canonical_schema;
pub mod config_manager;
pub mod import_config;
pub mod import_config_trait;

// 重导出核心配置类型
pub use canonical_schema::{normalize_name, CanonicalField, CanonicalSchema};
pub use config_manager::{config_keys, ConfigManager};
pub use import_config::{ConfigError, ImportConfig, DEFAULT_DATE_FORMATS};
pub use import_config_trait::ImportConfigReader;
