// ==========================================
// TecDoc 导入 - 导入层
// ==========================================
// 职责: 定长文件 → SQL 脚本
// 流程: 文件定位 → 定长读取 → 列格式化 → 批量 INSERT IGNORE → 已处理标记
// ==========================================

// 模块声明
pub mod column_formatter;
pub mod error;
pub mod fixed_width;
pub mod import_manager;
pub mod report;
pub mod sql_emitter;

// 重导出核心类型
pub use column_formatter::{format_column, format_date, Formatted};
pub use error::{ImportError, ImportResult};
pub use fixed_width::{FixedWidthReader, RawField, RawRow};
pub use import_manager::{processed_path, ImportManager, PROCESSED_SUFFIX};
pub use report::{EntityImportReport, FileOutcome};
pub use sql_emitter::{
    integer_literal, is_first_in_batch, is_last_in_batch, BatchState, SqlBatchEmitter, SqlDialect,
};
