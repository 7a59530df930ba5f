// ==========================================
// 项目进度导入核心 - 标准任务字段表
// ==========================================
// 职责: 定义导入目标字段（名称/类型/必填/别名）
// 红线: 作为显式参数传入,测试可替换
// ==========================================

use crate::config::import_config::ConfigError;
use crate::domain::types::FieldKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 名称规范化：小写，去除空白与下划线
///
/// "Task Name" / "task_name" / "TASKNAME" → "taskname"
/// 任务输出中行号占用的键
pub const RESERVED_ROW_NUMBER: &str = "row_number";

pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

// ==========================================
// CanonicalField - 标准字段
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalField {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    /// 常见源列名（规范化后精确比较，不做模糊匹配）
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl CanonicalField {
    pub fn new(name: &str, kind: FieldKind, required: bool) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required,
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    /// 规范化后的表头是否命中本字段（名称或别名）
    pub fn matches(&self, normalized_header: &str) -> bool {
        self.matches_name(normalized_header) || self.matches_alias(normalized_header)
    }

    /// 规范化后的表头是否与字段名相同
    pub fn matches_name(&self, normalized_header: &str) -> bool {
        normalize_name(&self.name) == normalized_header
    }

    pub fn matches_alias(&self, normalized_header: &str) -> bool {
        self.aliases
            .iter()
            .any(|alias| normalize_name(alias) == normalized_header)
    }
}

// ==========================================
// CanonicalSchema - 标准字段表
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CanonicalField>", into = "Vec<CanonicalField>")]
pub struct CanonicalSchema {
    fields: Vec<CanonicalField>,
}

impl CanonicalSchema {
    /// 创建字段表
    ///
    /// # 校验
    /// - 至少一个字段
    /// - 字段名非空且规范化后唯一
    /// - 不得使用保留名 `row_number`（任务输出中已占用）
    pub fn new(fields: Vec<CanonicalField>) -> Result<Self, ConfigError> {
        if fields.is_empty() {
            return Err(ConfigError::InvalidSchema("字段表为空".to_string()));
        }

        let mut seen = HashSet::new();
        for field in &fields {
            let normalized = normalize_name(&field.name);
            if normalized.is_empty() {
                return Err(ConfigError::InvalidSchema("字段名不能为空".to_string()));
            }
            if normalized == normalize_name(RESERVED_ROW_NUMBER) {
                return Err(ConfigError::InvalidSchema(format!(
                    "字段名为保留名: {}",
                    field.name
                )));
            }
            if !seen.insert(normalized) {
                return Err(ConfigError::InvalidSchema(format!(
                    "字段名重复: {}",
                    field.name
                )));
            }
        }

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[CanonicalField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&CanonicalField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &CanonicalField> {
        self.fields.iter().filter(|f| f.required)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

impl Default for CanonicalSchema {
    /// 默认任务字段表
    fn default() -> Self {
        Self {
            fields: vec![
                CanonicalField::new("id", FieldKind::Text, false)
                    .with_aliases(&["Task ID", "Unique ID", "UID", "task_code", "Activity ID"]),
                CanonicalField::new("name", FieldKind::Text, true)
                    .with_aliases(&["Task Name", "Activity Name", "Title", "task_name"]),
                CanonicalField::new("start", FieldKind::Date, false).with_aliases(&[
                    "Start Date",
                    "Start Time",
                    "start_date",
                    "target_start_date",
                ]),
                CanonicalField::new("finish", FieldKind::Date, false).with_aliases(&[
                    "Finish Date",
                    "End",
                    "End Date",
                    "finish_date",
                    "target_end_date",
                ]),
                CanonicalField::new("duration", FieldKind::Number, false)
                    .with_aliases(&["Duration (days)", "Days"]),
                CanonicalField::new("percent_complete", FieldKind::Number, false).with_aliases(&[
                    "% Complete",
                    "Percent Complete",
                    "Progress",
                    "phys_complete_pct",
                ]),
                CanonicalField::new("predecessors", FieldKind::Text, false)
                    .with_aliases(&["Predecessor", "Dependencies", "Depends On"]),
                CanonicalField::new("notes", FieldKind::Text, false)
                    .with_aliases(&["Note", "Comments", "Description"]),
            ],
        }
    }
}

impl TryFrom<Vec<CanonicalField>> for CanonicalSchema {
    type Error = ConfigError;

    fn try_from(fields: Vec<CanonicalField>) -> Result<Self, Self::Error> {
        Self::new(fields)
    }
}

impl From<CanonicalSchema> for Vec<CanonicalField> {
    fn from(schema: CanonicalSchema) -> Self {
        schema.fields
    }
}
