// ==========================================
// TecDoc 导入 - 配置层
// ==========================================
// 职责: 导入配置加载（JSON 文件 + 环境变量覆写）
// ==========================================

pub mod import_config;

pub use import_config::{env_keys, DecodeMode, ImportConfig, DEFAULT_BATCH_SIZE, RESERVED_SUPPLIER};
