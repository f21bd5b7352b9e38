// ==========================================
// TecDoc 导入 - 核心库
// ==========================================
// 职责: 将 TecDoc 定长数据文件批量转换为 INSERT IGNORE SQL 脚本
// 技术栈: Rust + SQLite（回放校验）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 表结构元数据
pub mod schema;

// 导入层 - 定长文件 → SQL
pub mod importer;

// 配置层
pub mod config;

// 目标连接批量装载调优
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

pub use config::{DecodeMode, ImportConfig};
pub use db::{BulkLoadSession, BulkLoadSettings};
pub use importer::{
    EntityImportReport, FileOutcome, ImportError, ImportManager, ImportResult, SqlDialect,
};
pub use schema::{all_tables, find_table, ColumnDefinition, ColumnType, TableDefinition};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "TecDoc 定长数据导入";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
