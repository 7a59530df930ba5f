// ==========================================
// 项目进度导入核心 - 导入落定
// ==========================================
// 职责: 按确认后的映射把解析行转为标准任务
// 红线: 输出行数 == 输入行数；转换失败只置空 + 警告，不丢行
// ==========================================

use crate::config::{CanonicalField, CanonicalSchema, ImportConfig};
use crate::domain::task::{CanonicalTask, CoercionWarning, ParsedRow, ParsedTable};
use crate::domain::types::CellValue;
use crate::importer::error::{FinalizeError, MappingError};
use crate::importer::field_mapper::{FieldMapper, FieldMapping};
use crate::importer::value_coercer::ValueCoercer;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// 落定结果
#[derive(Debug, Clone)]
pub struct FinalizeOutput {
    pub tasks: Vec<CanonicalTask>,
    pub warnings: Vec<CoercionWarning>,
}

pub struct TaskFinalizer {
    coercer: ValueCoercer,
}

impl TaskFinalizer {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            coercer: ValueCoercer::new(config),
        }
    }

    /// 应用映射
    ///
    /// # 前置条件
    /// - 映射与解析结果来自同一组表头（否则 HeaderMismatch）
    /// - 必填字段均已映射（否则 MissingRequiredFields）
    ///
    /// # 规则
    /// - 每个标准字段都有条目，缺省为 Null
    /// - 同一字段映射多个表头时取表头顺序中第一个转换成功的非空值
    pub fn finalize(
        &self,
        table: &ParsedTable,
        mapping: &FieldMapping,
        schema: &CanonicalSchema,
    ) -> Result<FinalizeOutput, FinalizeError> {
        if !mapping.matches_headers(&table.headers) {
            return Err(FinalizeError::HeaderMismatch {
                expected: mapping.headers().to_vec(),
                found: table.headers.clone(),
            });
        }

        if let Err(MappingError::MissingRequiredFields(fields)) =
            FieldMapper.validate(mapping, schema)
        {
            return Err(FinalizeError::MissingRequiredFields(fields));
        }

        // 字段 → 按表头顺序排列的来源列
        let sources: Vec<(&CanonicalField, Vec<&str>)> = schema
            .fields()
            .iter()
            .map(|f| (f, mapping.headers_for(&f.name)))
            .collect();

        let mut tasks = Vec::with_capacity(table.rows.len());
        let mut warnings = Vec::new();

        for row in &table.rows {
            tasks.push(self.finalize_row(row, &sources, &mut warnings));
        }

        if warnings.is_empty() {
            debug!(rows = tasks.len(), "导入落定完成");
        } else {
            warn!(
                rows = tasks.len(),
                coercion_warnings = warnings.len(),
                "导入落定完成，存在类型转换警告"
            );
        }

        Ok(FinalizeOutput { tasks, warnings })
    }

    fn finalize_row(
        &self,
        row: &ParsedRow,
        sources: &[(&CanonicalField, Vec<&str>)],
        warnings: &mut Vec<CoercionWarning>,
    ) -> CanonicalTask {
        let mut fields = BTreeMap::new();

        for (field, headers) in sources {
            let mut resolved = CellValue::Null;
            for header in headers {
                let raw = row.get(header).unwrap_or(&CellValue::Null);
                match self.coercer.coerce(raw, field.kind) {
                    Some(CellValue::Null) => {}
                    Some(value) => {
                        if resolved.is_null() {
                            resolved = value;
                        }
                    }
                    None => warnings.push(CoercionWarning {
                        row_number: row.row_number,
                        header: header.to_string(),
                        field: field.name.clone(),
                        expected: field.kind,
                        raw_value: raw.to_string(),
                    }),
                }
            }

            fields.insert(field.name.clone(), resolved);
        }

        CanonicalTask {
            row_number: row.row_number,
            fields,
        }
    }
}

/// 应用映射
///
/// 只使用默认导入参数（日期格式等）；自定义参数用 [`finalize_with`]
pub fn finalize(
    table: &ParsedTable,
    mapping: &FieldMapping,
    schema: &CanonicalSchema,
) -> Result<FinalizeOutput, FinalizeError> {
    finalize_with(table, mapping, schema, &ImportConfig::default())
}

/// 按给定导入参数应用映射
pub fn finalize_with(
    table: &ParsedTable,
    mapping: &FieldMapping,
    schema: &CanonicalSchema,
    config: &ImportConfig,
) -> Result<FinalizeOutput, FinalizeError> {
    TaskFinalizer::new(config).finalize(table, mapping, schema)
}
