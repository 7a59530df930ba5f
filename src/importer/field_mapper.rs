// ==========================================
// 项目进度导入核心 - 字段映射器实现
// ==========================================
// 职责: 源表头 → 标准字段的自动建议、人工编辑与校验
// 规则: 规范化后精确匹配（名称或别名），不做模糊猜测
// ==========================================

use crate::config::{normalize_name, CanonicalSchema};
use crate::importer::error::MappingError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// 边界记录中表示"未映射"的目标值
pub const UNMAPPED: &str = "unmapped";

// ==========================================
// FieldMapping - 表头 → 标准字段
// ==========================================
// 红线: 每个表头至多一个目标；只对同一组表头的解析结果生效
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    headers: Vec<String>,
    targets: HashMap<String, String>,
}

impl FieldMapping {
    /// 全部未映射
    pub fn unmapped(headers: &[String]) -> Self {
        Self {
            headers: headers.to_vec(),
            targets: HashMap::new(),
        }
    }

    /// 映射所属的表头列表（顺序即显示顺序）
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn target(&self, header: &str) -> Option<&str> {
        self.targets.get(header).map(String::as_str)
    }

    /// 人工指定映射
    ///
    /// # 错误
    /// - UnknownHeader: 表头不属于本映射
    /// - UnknownField: 字段不在标准字段表中
    pub fn assign(
        &mut self,
        header: &str,
        field: &str,
        schema: &CanonicalSchema,
    ) -> Result<(), MappingError> {
        if !self.headers.iter().any(|h| h == header) {
            return Err(MappingError::UnknownHeader(header.to_string()));
        }
        if !schema.contains(field) {
            return Err(MappingError::UnknownField {
                header: header.to_string(),
                field: field.to_string(),
            });
        }
        self.targets.insert(header.to_string(), field.to_string());
        Ok(())
    }

    /// 取消映射，返回原目标
    pub fn unassign(&mut self, header: &str) -> Option<String> {
        self.targets.remove(header)
    }

    /// 已映射表头（按表头顺序）
    pub fn mapped_headers(&self) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|h| self.targets.contains_key(h.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn unmapped_headers(&self) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|h| !self.targets.contains_key(h.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// 映射到某字段的全部表头（按表头顺序）
    pub fn headers_for(&self, field: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|h| self.target(h) == Some(field))
            .map(String::as_str)
            .collect()
    }

    /// 与给定表头列表是否为同一组
    pub fn matches_headers(&self, headers: &[String]) -> bool {
        self.headers == headers
    }

    /// 转为边界记录（仅已映射表头）
    pub fn to_record(&self) -> BTreeMap<String, String> {
        self.targets
            .iter()
            .map(|(h, f)| (h.clone(), f.clone()))
            .collect()
    }

    /// 从边界记录构建
    ///
    /// 目标为 "unmapped" 或空串视为未映射；记录中未出现的表头同样未映射
    pub fn from_record(
        headers: &[String],
        record: &BTreeMap<String, String>,
        schema: &CanonicalSchema,
    ) -> Result<Self, MappingError> {
        let mut mapping = Self::unmapped(headers);
        for (header, field) in record {
            let field = field.trim();
            if field.is_empty() || field == UNMAPPED {
                if !mapping.headers.iter().any(|h| h == header) {
                    return Err(MappingError::UnknownHeader(header.clone()));
                }
                continue;
            }
            mapping.assign(header, field, schema)?;
        }
        Ok(mapping)
    }
}

// ==========================================
// FieldMapper - 映射建议与校验
// ==========================================
pub struct FieldMapper;

impl FieldMapper {
    /// 自动建议映射
    ///
    /// # 规则
    /// - 表头与字段名/别名规范化后精确相等才建议
    /// - 字段名命中优先于别名命中
    /// - 每个字段至多建议给一个表头（同级命中取第一个）
    /// - 纯函数：相同输入得到相同结果
    pub fn propose_mapping(&self, headers: &[String], schema: &CanonicalSchema) -> FieldMapping {
        let mut mapping = FieldMapping::unmapped(headers);
        let mut claimed: HashSet<&str> = HashSet::new();
        let normalized: Vec<String> = headers.iter().map(|h| normalize_name(h)).collect();

        // 第一轮: 字段名；第二轮: 别名（只看剩余表头与字段）
        for by_alias in [false, true] {
            for (header, key) in headers.iter().zip(&normalized) {
                if key.is_empty() || mapping.targets.contains_key(header) {
                    continue;
                }
                let hit = schema.fields().iter().find(|f| {
                    !claimed.contains(f.name.as_str())
                        && if by_alias {
                            f.matches_alias(key)
                        } else {
                            f.matches_name(key)
                        }
                });
                if let Some(field) = hit {
                    claimed.insert(field.name.as_str());
                    mapping
                        .targets
                        .insert(header.clone(), field.name.clone());
                }
            }
        }

        debug!(
            headers = headers.len(),
            mapped = mapping.targets.len(),
            "映射建议生成完成"
        );
        mapping
    }

    /// 校验必填字段
    ///
    /// # 返回
    /// - Ok(()): 所有必填字段至少有一个表头
    /// - Err(MissingRequiredFields): 全部缺口（按字段表顺序）
    pub fn validate(
        &self,
        mapping: &FieldMapping,
        schema: &CanonicalSchema,
    ) -> Result<(), MappingError> {
        let mapped: HashSet<&str> = mapping.targets.values().map(String::as_str).collect();
        let missing: Vec<String> = schema
            .required_fields()
            .filter(|f| !mapped.contains(f.name.as_str()))
            .map(|f| f.name.clone())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MappingError::MissingRequiredFields(missing))
        }
    }
}

/// 自动建议映射
pub fn propose_mapping(headers: &[String], schema: &CanonicalSchema) -> FieldMapping {
    FieldMapper.propose_mapping(headers, schema)
}

/// 校验必填字段
pub fn validate(mapping: &FieldMapping, schema: &CanonicalSchema) -> Result<(), MappingError> {
    FieldMapper.validate(mapping, schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanonicalField;
    use crate::domain::types::FieldKind;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_propose_normalized_and_alias_match() {
        let schema = CanonicalSchema::default();
        let mapping = propose_mapping(
            &headers(&["Task Name", "START", "finish_date", "Cost"]),
            &schema,
        );

        assert_eq!(mapping.target("Task Name"), Some("name"));
        assert_eq!(mapping.target("START"), Some("start"));
        assert_eq!(mapping.target("finish_date"), Some("finish"));
        assert_eq!(mapping.target("Cost"), None);
        assert_eq!(mapping.unmapped_headers(), vec!["Cost"]);
    }

    #[test]
    fn test_no_fuzzy_guessing() {
        let schema = CanonicalSchema::default();
        let mapping = propose_mapping(&headers(&["Nme", "Start Dt"]), &schema);
        assert!(mapping.mapped_headers().is_empty());
    }

    #[test]
    fn test_each_field_proposed_once() {
        let schema = CanonicalSchema::default();
        let mapping = propose_mapping(&headers(&["Name", "Task Name"]), &schema);
        assert_eq!(mapping.target("Name"), Some("name"));
        assert_eq!(mapping.target("Task Name"), None);
    }

    #[test]
    fn test_exact_name_preferred_over_earlier_alias() {
        let schema = CanonicalSchema::default();
        let mapping = propose_mapping(
            &headers(&["Task Name", "Name", "Start Date", "Start", "Finish Date"]),
            &schema,
        );

        assert_eq!(mapping.target("Name"), Some("name"));
        assert_eq!(mapping.target("Start"), Some("start"));
        assert_eq!(mapping.target("Task Name"), None);
        assert_eq!(mapping.target("Start Date"), None);
        // 没有同名表头时别名照常命中
        assert_eq!(mapping.target("Finish Date"), Some("finish"));
    }

    #[test]
    fn test_propose_is_idempotent() {
        let schema = CanonicalSchema::default();
        let h = headers(&["Unique ID", "Name", "% Complete", "Notes"]);
        assert_eq!(propose_mapping(&h, &schema), propose_mapping(&h, &schema));
    }

    #[test]
    fn test_validate_reports_all_gaps() {
        let schema = CanonicalSchema::new(vec![
            CanonicalField::new("name", FieldKind::Text, true),
            CanonicalField::new("start", FieldKind::Date, true),
            CanonicalField::new("notes", FieldKind::Text, false),
        ])
        .unwrap();
        let mapping = propose_mapping(&headers(&["Notes"]), &schema);

        assert_eq!(
            validate(&mapping, &schema),
            Err(MappingError::MissingRequiredFields(vec![
                "name".to_string(),
                "start".to_string()
            ]))
        );
    }

    #[test]
    fn test_assign_and_unassign() {
        let schema = CanonicalSchema::default();
        let mut mapping = FieldMapping::unmapped(&headers(&["Col A", "Col B"]));

        mapping.assign("Col A", "name", &schema).unwrap();
        mapping.assign("Col B", "name", &schema).unwrap();
        assert_eq!(mapping.headers_for("name"), vec!["Col A", "Col B"]);
        assert!(validate(&mapping, &schema).is_ok());

        assert_eq!(mapping.unassign("Col A"), Some("name".to_string()));
        assert_eq!(mapping.headers_for("name"), vec!["Col B"]);

        assert_eq!(
            mapping.assign("Col C", "name", &schema),
            Err(MappingError::UnknownHeader("Col C".to_string()))
        );
        assert!(matches!(
            mapping.assign("Col A", "budget", &schema),
            Err(MappingError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_record_round_trip_skips_unmapped() {
        let schema = CanonicalSchema::default();
        let h = headers(&["Task Name", "Start", "Extra"]);
        let mut record = BTreeMap::new();
        record.insert("Task Name".to_string(), "name".to_string());
        record.insert("Start".to_string(), "start".to_string());
        record.insert("Extra".to_string(), UNMAPPED.to_string());

        let mapping = FieldMapping::from_record(&h, &record, &schema).unwrap();
        assert_eq!(mapping.target("Extra"), None);

        let back = mapping.to_record();
        assert_eq!(back.len(), 2);
        assert_eq!(back.get("Start"), Some(&"start".to_string()));
    }
}
