// ==========================================
// 项目进度导入核心 - 导入会话
// ==========================================
// 流程: 解析 → 建议映射 → 人工编辑 → 校验 → 落定 → 交给下游
// 生命周期: 单次导入独占；确认或取消后会话被消费，解析结果随之释放
// 红线: 取消时不产生任何标准任务输出
// ==========================================

use crate::config::{CanonicalSchema, ImportConfig, ImportConfigReader};
use crate::domain::task::{ImportReport, ParseWarning, ParsedTable};
use crate::domain::types::FormatKind;
use crate::importer::error::{ImportResult, MappingError};
use crate::importer::field_mapper::{FieldMapper, FieldMapping};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::import_trait::ImportSink;
use crate::importer::task_finalizer::TaskFinalizer;
use crate::perf::PerfGuard;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ImportSession - 单次导入
// ==========================================
pub struct ImportSession {
    import_id: String,
    config: ImportConfig,
    schema: CanonicalSchema,
    table: ParsedTable,
    mapping: FieldMapping,
    started_at: Instant,
}

impl ImportSession {
    /// 打开文件并生成映射建议
    ///
    /// # 参数
    /// - path: 文件路径（扩展名用于格式识别）
    /// - config: 导入参数
    /// - schema: 标准字段表
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open<P: AsRef<Path>>(
        path: P,
        config: &ImportConfig,
        schema: CanonicalSchema,
    ) -> ImportResult<Self> {
        let started_at = Instant::now();
        config.validate()?;
        let table = UniversalFileParser::new(config.clone())
            .parse_file(path)
            .await
            .map_err(|e| {
                error!(error = %e, "导入文件解析失败");
                e
            })?;
        Ok(Self::build(table, config, schema, started_at))
    }

    /// 从配置读取器加载参数与字段表后打开文件
    pub async fn open_with<P, C>(path: P, reader: &C) -> ImportResult<Self>
    where
        P: AsRef<Path>,
        C: ImportConfigReader + ?Sized,
    {
        let config = reader.load_import_config().await?;
        let schema = reader.load_schema().await?;
        Self::open(path, &config, schema).await
    }

    /// 从内存内容创建会话
    pub fn from_bytes(
        file_name: &str,
        content: &[u8],
        config: &ImportConfig,
        schema: CanonicalSchema,
    ) -> ImportResult<Self> {
        let started_at = Instant::now();
        config.validate()?;
        let table = UniversalFileParser::new(config.clone()).parse_bytes(file_name, content)?;
        Ok(Self::build(table, config, schema, started_at))
    }

    /// 从已解析结果创建会话
    pub fn from_table(table: ParsedTable, config: &ImportConfig, schema: CanonicalSchema) -> Self {
        Self::build(table, config, schema, Instant::now())
    }

    fn build(
        table: ParsedTable,
        config: &ImportConfig,
        schema: CanonicalSchema,
        started_at: Instant,
    ) -> Self {
        let import_id = Uuid::new_v4().to_string();
        let mapping = FieldMapper.propose_mapping(&table.headers, &schema);

        info!(
            import_id = %import_id,
            format = %table.format,
            headers = table.headers.len(),
            rows = table.rows.len(),
            proposed = mapping.mapped_headers().len(),
            "导入会话已创建"
        );

        Self {
            import_id,
            config: config.clone(),
            schema,
            table,
            mapping,
            started_at,
        }
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn import_id(&self) -> &str {
        &self.import_id
    }

    pub fn format(&self) -> FormatKind {
        self.table.format
    }

    pub fn headers(&self) -> &[String] {
        &self.table.headers
    }

    pub fn row_count(&self) -> usize {
        self.table.rows.len()
    }

    pub fn parse_warnings(&self) -> &[ParseWarning] {
        &self.table.warnings
    }

    /// 解析结果（供预览）
    pub fn table(&self) -> &ParsedTable {
        &self.table
    }

    pub fn schema(&self) -> &CanonicalSchema {
        &self.schema
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    // ==========================================
    // 映射编辑
    // ==========================================

    pub fn assign(&mut self, header: &str, field: &str) -> Result<(), MappingError> {
        self.mapping.assign(header, field, &self.schema)
    }

    pub fn unassign(&mut self, header: &str) -> Option<String> {
        self.mapping.unassign(header)
    }

    /// 用边界记录整体替换映射（失败时保持原映射）
    pub fn apply_mapping_record(
        &mut self,
        record: &BTreeMap<String, String>,
    ) -> Result<(), MappingError> {
        self.mapping = FieldMapping::from_record(&self.table.headers, record, &self.schema)?;
        Ok(())
    }

    pub fn mapping_record(&self) -> BTreeMap<String, String> {
        self.mapping.to_record()
    }

    /// 校验必填字段（一次报告全部缺口）
    pub fn validate(&self) -> Result<(), MappingError> {
        FieldMapper.validate(&self.mapping, &self.schema)
    }

    // ==========================================
    // 完成
    // ==========================================

    /// 校验并落定
    ///
    /// 校验失败时不进入落定阶段
    pub fn finalize(self) -> ImportResult<ImportReport> {
        let _perf = PerfGuard::new("finalize_import").with_rows(self.table.rows.len());

        if let Err(e) = self.validate() {
            warn!(import_id = %self.import_id, error = %e, "映射校验未通过");
            return Err(e.into());
        }

        let output =
            TaskFinalizer::new(&self.config).finalize(&self.table, &self.mapping, &self.schema)?;

        let report = ImportReport {
            import_id: self.import_id,
            format: self.table.format,
            tasks: output.tasks,
            mapping: self.mapping.to_record(),
            parse_warnings: self.table.warnings,
            coercion_warnings: output.warnings,
            elapsed_ms: self.started_at.elapsed().as_millis() as u64,
        };

        info!(
            import_id = %report.import_id,
            tasks = report.tasks.len(),
            parse_warnings = report.parse_warnings.len(),
            coercion_warnings = report.coercion_warnings.len(),
            elapsed_ms = report.elapsed_ms,
            "导入落定完成"
        );
        Ok(report)
    }

    /// 确认导入：落定后把任务与映射交给下游
    pub async fn confirm<S>(self, sink: &S) -> ImportResult<ImportReport>
    where
        S: ImportSink + ?Sized,
    {
        let report = self.finalize()?;

        if let Err(e) = sink.on_import(&report.tasks, &report.mapping).await {
            error!(import_id = %report.import_id, error = %e, "导入结果提交失败");
            return Err(e.into());
        }

        info!(import_id = %report.import_id, tasks = report.tasks.len(), "导入结果已提交");
        Ok(report)
    }

    /// 取消导入：丢弃解析结果与映射
    pub fn cancel(self) {
        info!(
            import_id = %self.import_id,
            rows = self.table.rows.len(),
            "导入已取消"
        );
    }
}
