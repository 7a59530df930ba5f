// ==========================================
// 导入会话端到端测试
// ==========================================
// 测试目标: 打开文件 → 编辑映射 → 确认/取消 → 下游接收
// ==========================================


use async_trait::async_trait;
use schedule_import::config::config_keys;
use schedule_import::importer::{ImportError, MappingError, ParseError};
use schedule_import::{
    logging, CanonicalSchema, CanonicalTask, ConfigManager, FormatKind, ImportConfig,
    ImportSession, ImportSink,
};
use std::collections::BTreeMap;
use std::sync::Mutex;
use test_helpers::{build_mpp, sample_xer, write_temp_file, MppTask};

/// 记录下游收到的数据
#[derive(Default)]
struct MemorySink {
    imports: Mutex<Vec<(Vec<CanonicalTask>, BTreeMap<String, String>)>>,
}

#[async_trait]
impl ImportSink for MemorySink {
    async fn on_import(
        &self,
        tasks: &[CanonicalTask],
        mapping: &BTreeMap<String, String>,
    ) -> anyhow::Result<()> {
        self.imports
            .lock()
            .unwrap()
            .push((tasks.to_vec(), mapping.clone()));
        Ok(())
    }
}

#[tokio::test]
async fn test_csv_import_end_to_end() {
    logging::init_test();

    let file = write_temp_file(
        "csv",
        b"Task Name,Start,Finish,% Complete,Cost\nFoundation,2024-01-01,2024-01-10,100%,1200\nFraming,2024-01-11,,25,800\n",
    )
    .unwrap();

    let mut session =
        ImportSession::open(file.path(), &ImportConfig::default(), CanonicalSchema::default())
            .await
            .unwrap();
    assert_eq!(session.format(), FormatKind::DelimitedText);
    assert_eq!(session.row_count(), 2);
    assert_eq!(session.mapping().unmapped_headers(), vec!["Cost"]);

    // 人工把 Cost 归入备注
    session.assign("Cost", "notes").unwrap();

    let sink = MemorySink::default();
    let report = session.confirm(&sink).await.unwrap();
    assert_eq!(report.task_count(), 2);
    assert!(report.coercion_warnings.is_empty());

    let imports = sink.imports.lock().unwrap();
    assert_eq!(imports.len(), 1);
    let (tasks, mapping) = &imports[0];
    assert_eq!(tasks[0].number("percent_complete"), Some(100.0));
    assert_eq!(tasks[0].text("notes"), Some("1200"));
    assert!(tasks[1].get("finish").map_or(false, |v| v.is_null()));
    assert_eq!(mapping.get("Cost"), Some(&"notes".to_string()));
    assert_eq!(mapping.len(), 5);
}

#[tokio::test]
async fn test_open_with_config_manager() {
    let manager = ConfigManager::from_pairs([
        (config_keys::DELIMITER, ";"),
        (config_keys::DATE_FORMATS, r#"["%d/%m/%Y"]"#),
    ]);
    let file = write_temp_file("csv", b"Name;Start\nDig;31/01/2024\n").unwrap();

    let session = ImportSession::open_with(file.path(), &manager).await.unwrap();
    let report = session.finalize().unwrap();

    assert_eq!(
        report.tasks[0].date("start"),
        chrono::NaiveDate::from_ymd_opt(2024, 1, 31)
    );
}

#[tokio::test]
async fn test_xer_and_mpp_sessions() {
    let xer = write_temp_file("xer", sample_xer().as_bytes()).unwrap();
    let session =
        ImportSession::open(xer.path(), &ImportConfig::default(), CanonicalSchema::default())
            .await
            .unwrap();
    let report = session.finalize().unwrap();
    assert_eq!(report.format, FormatKind::ExchangeTagged);
    assert_eq!(report.tasks.len(), 3);
    assert_eq!(report.tasks[1].number("percent_complete"), Some(40.0));

    let mpp = write_temp_file(
        "mpp",
        &build_mpp(11, &[MppTask::new(1, "Survey"), MppTask::new(2, "Dig")]),
    )
    .unwrap();
    let session =
        ImportSession::open(mpp.path(), &ImportConfig::default(), CanonicalSchema::default())
            .await
            .unwrap();
    let report = session.finalize().unwrap();
    assert_eq!(report.tasks.len(), 2);
    assert_eq!(report.tasks[1].text("name"), Some("Dig"));
}

#[tokio::test]
async fn test_unsupported_version_aborts_before_mapping() {
    let file = write_temp_file("mpp", &build_mpp(3, &[MppTask::new(1, "Survey")])).unwrap();

    let result =
        ImportSession::open(file.path(), &ImportConfig::default(), CanonicalSchema::default())
            .await;
    assert!(matches!(
        result,
        Err(ImportError::Parse(ParseError::UnsupportedVersion { found: Some(3), .. }))
    ));
}

#[tokio::test]
async fn test_missing_required_field_reported_and_recoverable() {
    let file = write_temp_file("csv", b"Activity,Begin\nDig,2024-01-01\n").unwrap();
    let mut session =
        ImportSession::open(file.path(), &ImportConfig::default(), CanonicalSchema::default())
            .await
            .unwrap();

    assert_eq!(
        session.validate(),
        Err(MappingError::MissingRequiredFields(vec!["name".to_string()]))
    );

    // 用户重新映射后可继续
    let mut record = BTreeMap::new();
    record.insert("Activity".to_string(), "name".to_string());
    record.insert("Begin".to_string(), "start".to_string());
    session.apply_mapping_record(&record).unwrap();

    let sink = MemorySink::default();
    let report = session.confirm(&sink).await.unwrap();
    assert_eq!(report.tasks[0].text("name"), Some("Dig"));
}

#[tokio::test]
async fn test_cancel_emits_nothing() {
    let file = write_temp_file("csv", b"Name\nDig\n").unwrap();
    let session =
        ImportSession::open(file.path(), &ImportConfig::default(), CanonicalSchema::default())
            .await
            .unwrap();

    let sink = MemorySink::default();
    session.cancel();
    assert!(sink.imports.lock().unwrap().is_empty());
}

#[test]
fn test_user_message_is_localized() {
    let err: ImportError = ParseError::UnsupportedFormat("xlsx".to_string()).into();
    let message = err.user_message();
    assert!(message.contains("xlsx"));
}
