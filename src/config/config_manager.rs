// ==========================================
// 项目进度导入核心 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、快照/恢复
// 存储: 内存 key-value（结构化值为 JSON 字符串）
// ==========================================

use crate::config::canonical_schema::CanonicalSchema;
use crate::config::import_config::{ConfigError, ImportConfig};
use crate::config::import_config_trait::ImportConfigReader;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::RwLock;

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    // 分隔文本
    pub const DELIMITER: &str = "import.delimiter";
    pub const QUOTE: &str = "import.quote";
    pub const TRIM_CELLS: &str = "import.trim_cells";

    // 日期格式 (JSON 数组)
    pub const DATE_FORMATS: &str = "import.date_formats";

    // 项目二进制
    pub const MPP_MIN_VERSION: &str = "import.mpp.min_version";
    pub const MPP_MAX_VERSION: &str = "import.mpp.max_version";

    // 格式嗅探
    pub const SNIFF_WINDOW: &str = "import.sniff_window";

    // 交换格式
    pub const XER_TASK_TABLE: &str = "import.xer.task_table";

    // 标准字段表 (JSON)
    pub const SCHEMA: &str = "import.schema";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Default)]
pub struct ConfigManager {
    values: RwLock<HashMap<String, String>>,
}

impl ConfigManager {
    /// 创建空配置（全部走默认值）
    pub fn new() -> Self {
        Self::default()
    }

    /// 从键值对创建
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }

    /// 读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let values = self.values.read().map_err(|_| ConfigError::LockPoisoned)?;
        Ok(values.get(key).cloned())
    }

    /// 写入配置值（覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut values = self.values.write().map_err(|_| ConfigError::LockPoisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// 获取所有配置的快照（JSON 格式，键有序）
    pub fn get_config_snapshot(&self) -> Result<String, ConfigError> {
        let values = self.values.read().map_err(|_| ConfigError::LockPoisoned)?;
        let ordered: BTreeMap<&String, &String> = values.iter().collect();
        serde_json::to_string(&ordered).map_err(|e| ConfigError::Snapshot(e.to_string()))
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 覆盖同名配置，`__meta_` 前缀的键不回写
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, ConfigError> {
        let snapshot: HashMap<String, String> = serde_json::from_str(snapshot_json)
            .map_err(|e| ConfigError::Snapshot(e.to_string()))?;

        let mut values = self.values.write().map_err(|_| ConfigError::LockPoisoned)?;
        let mut count = 0;
        for (key, value) in snapshot {
            if key.starts_with("__meta_") {
                continue;
            }
            values.insert(key, value);
            count += 1;
        }
        Ok(count)
    }

    /// 组装解析参数（缺失键取默认值）
    pub fn import_config(&self) -> Result<ImportConfig, ConfigError> {
        let defaults = ImportConfig::default();

        let config = ImportConfig {
            delimiter: self.get_char(config_keys::DELIMITER, defaults.delimiter)?,
            quote: self.get_char(config_keys::QUOTE, defaults.quote)?,
            trim_cells: self.get_bool(config_keys::TRIM_CELLS, defaults.trim_cells)?,
            date_formats: self.get_json(config_keys::DATE_FORMATS, defaults.date_formats)?,
            mpp_min_version: self.get_parsed(config_keys::MPP_MIN_VERSION, defaults.mpp_min_version)?,
            mpp_max_version: self.get_parsed(config_keys::MPP_MAX_VERSION, defaults.mpp_max_version)?,
            sniff_window: self.get_parsed(config_keys::SNIFF_WINDOW, defaults.sniff_window)?,
            xer_task_table: self
                .get_global_config_value(config_keys::XER_TASK_TABLE)?
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.xer_task_table),
        };

        config.validate()?;
        Ok(config)
    }

    /// 读取标准字段表（缺失时取默认字段表）
    pub fn canonical_schema(&self) -> Result<CanonicalSchema, ConfigError> {
        self.get_json(config_keys::SCHEMA, CanonicalSchema::default())
    }

    // ===== 类型化读取 =====

    fn get_char(&self, key: &str, default: char) -> Result<char, ConfigError> {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => {
                // "\t" 作为制表符的转义写法
                let value = if raw == "\\t" { "\t".to_string() } else { raw.clone() };
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: raw,
                        message: "必须是单个字符".to_string(),
                    }),
                }
            }
        }
    }

    fn get_bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "y" | "on" => Ok(true),
                "0" | "false" | "no" | "n" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: raw,
                    message: "必须是布尔值".to_string(),
                }),
            },
        }
    }

    fn get_parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.clone(),
                message: e.to_string(),
            }),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => serde_json::from_str(&raw).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.clone(),
                message: e.to_string(),
            }),
        }
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn load_import_config(&self) -> Result<ImportConfig, ConfigError> {
        self.import_config()
    }

    async fn load_schema(&self) -> Result<CanonicalSchema, ConfigError> {
        self.canonical_schema()
    }
}
