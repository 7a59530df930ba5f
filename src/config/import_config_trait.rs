// ==========================================
// 项目进度导入核心 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入流程所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::canonical_schema::CanonicalSchema;
use crate::config::import_config::{ConfigError, ImportConfig};
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 宿主应用可用自有存储实现
// 实现者: ConfigManager（内存 key-value）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 读取解析参数
    ///
    /// # 返回
    /// - Ok(ImportConfig): 已通过 validate 的参数
    /// - Err: 配置值格式错误
    async fn load_import_config(&self) -> Result<ImportConfig, ConfigError>;

    /// 读取标准字段表
    ///
    /// # 默认值
    /// - CanonicalSchema::default()
    async fn load_schema(&self) -> Result<CanonicalSchema, ConfigError>;
}
