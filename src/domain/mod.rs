// ==========================================
// 项目进度导入核心 - 领域模型层
// ==========================================
// 职责: 定义单元格值、解析结果、标准任务等实体
// 红线: 不含解析逻辑,不含持久化逻辑
// ==========================================

pub mod task;
pub mod types;

// 重导出核心类型
pub use task::{
    CanonicalTask, CoercionWarning, ImportReport, ParseWarning, ParsedRow, ParsedTable,
};
pub use types::{CellValue, FieldKind, FormatKind};
