// ==========================================
// TecDoc 导入 - 导入配置
// ==========================================
// 职责: 目录约定、批大小、解码模式、字符集、SQL 方言、单文件覆写
// 来源: JSON 配置文件 + 环境变量（环境变量优先）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::sql_emitter::SqlDialect;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 环境变量键
pub mod env_keys {
    pub const DIR_REFERENCE: &str = "TECDOC_DIR_REFERENCE";
    pub const DIR_SUPPLIER: &str = "TECDOC_DIR_SUPPLIER";
    pub const SQL_DIR: &str = "TECDOC_SQL_DIR";
    pub const BATCH_SIZE: &str = "TECDOC_BATCH_SIZE";
    pub const DECODE_MODE: &str = "TECDOC_DECODE_MODE";
    pub const ENCODING: &str = "TECDOC_ENCODING";
    pub const DIALECT: &str = "TECDOC_DIALECT";
    /// 单文件覆写（调试/定向重导）
    pub const FILE_OVERRIDE: &str = "FILE";
}

/// 默认批大小（每条 INSERT 语句的行数）
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// 保留的供应商号（测试数据，不导入）
pub const RESERVED_SUPPLIER: &str = "9999";

// ==========================================
// DecodeMode - 脏数据处理模式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    /// 尽力而为: 短行截断、无法识别的日期置 NULL
    #[default]
    Lenient,
    /// 严格: 短行 / 非法日期直接报错，中止当前文件
    Strict,
}

impl DecodeMode {
    pub fn is_strict(self) -> bool {
        matches!(self, DecodeMode::Strict)
    }
}

impl std::str::FromStr for DecodeMode {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lenient" => Ok(DecodeMode::Lenient),
            "strict" => Ok(DecodeMode::Strict),
            other => Err(ImportError::Config {
                key: env_keys::DECODE_MODE.to_string(),
                message: format!("未知的解码模式: {}", other),
            }),
        }
    }
}

// ==========================================
// ImportConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// 参考文件根目录
    pub reference_dir: PathBuf,
    /// 供应商文件根目录（每个子目录名即供应商号）
    pub supplier_dir: PathBuf,
    /// SQL 脚本输出目录
    pub output_dir: PathBuf,
    pub batch_size: usize,
    /// 设置后跳过全部目录扫描，只导入该文件
    pub file_override: Option<PathBuf>,
    pub decode_mode: DecodeMode,
    /// 源文件字符集（encoding_rs 标签）
    pub encoding: String,
    pub dialect: SqlDialect,
    /// 跳过的供应商号
    pub skip_suppliers: Vec<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            reference_dir: PathBuf::from("reference"),
            supplier_dir: PathBuf::from("supplier"),
            output_dir: PathBuf::from("sql"),
            batch_size: DEFAULT_BATCH_SIZE,
            file_override: None,
            decode_mode: DecodeMode::default(),
            encoding: "utf-8".to_string(),
            dialect: SqlDialect::default(),
            skip_suppliers: vec![RESERVED_SUPPLIER.to_string()],
        }
    }
}

impl ImportConfig {
    /// 以目录约定创建配置，其余取默认值
    pub fn new(reference_dir: impl Into<PathBuf>, supplier_dir: impl Into<PathBuf>) -> Self {
        Self {
            reference_dir: reference_dir.into(),
            supplier_dir: supplier_dir.into(),
            ..Self::default()
        }
    }

    /// 从环境变量读取配置（未设置的项取默认值）
    pub fn from_env() -> ImportResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// 从 JSON 文件读取配置，再叠加环境变量
    pub fn from_json_file(path: &Path) -> ImportResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ImportError::from_open(path, e))?;
        let mut config: ImportConfig = serde_json::from_str(&raw)?;
        config.apply_env()?;
        Ok(config)
    }

    /// 用环境变量覆盖已有配置
    pub fn apply_env(&mut self) -> ImportResult<()> {
        if let Some(v) = env_value(env_keys::DIR_REFERENCE) {
            self.reference_dir = PathBuf::from(v);
        }
        if let Some(v) = env_value(env_keys::DIR_SUPPLIER) {
            self.supplier_dir = PathBuf::from(v);
        }
        if let Some(v) = env_value(env_keys::SQL_DIR) {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = env_value(env_keys::BATCH_SIZE) {
            self.batch_size = v.trim().parse().map_err(|_| ImportError::Config {
                key: env_keys::BATCH_SIZE.to_string(),
                message: format!("无法解析为整数: {}", v),
            })?;
        }
        if let Some(v) = env_value(env_keys::DECODE_MODE) {
            self.decode_mode = v.parse()?;
        }
        if let Some(v) = env_value(env_keys::ENCODING) {
            self.encoding = v.trim().to_string();
        }
        if let Some(v) = env_value(env_keys::DIALECT) {
            self.dialect = v.parse()?;
        }
        if let Some(v) = env_value(env_keys::FILE_OVERRIDE) {
            self.file_override = Some(PathBuf::from(v));
        }
        Ok(())
    }

    /// 校验配置值
    pub fn validate(&self) -> ImportResult<()> {
        if self.batch_size == 0 {
            return Err(ImportError::Config {
                key: "batch_size".to_string(),
                message: "批大小必须大于 0".to_string(),
            });
        }
        if encoding_rs::Encoding::for_label(self.encoding.as_bytes()).is_none() {
            return Err(ImportError::UnsupportedEncoding(self.encoding.clone()));
        }
        Ok(())
    }
}

/// 读取环境变量（空值视为未设置）
fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // 环境变量为进程级共享状态，涉及的测试串行执行
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults() {
        let config = ImportConfig::default();
        assert_eq!(config.batch_size, 5000);
        assert_eq!(config.output_dir, PathBuf::from("sql"));
        assert_eq!(config.decode_mode, DecodeMode::Lenient);
        assert_eq!(config.dialect, SqlDialect::MySql);
        assert_eq!(config.skip_suppliers, vec!["9999".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_decode_mode_parse() {
        assert_eq!("STRICT".parse::<DecodeMode>().unwrap(), DecodeMode::Strict);
        assert_eq!(" lenient ".parse::<DecodeMode>().unwrap(), DecodeMode::Lenient);
        assert!("loose".parse::<DecodeMode>().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let config = ImportConfig {
            batch_size: 0,
            ..ImportConfig::default()
        };
        assert!(matches!(config.validate(), Err(ImportError::Config { .. })));
    }

    #[test]
    fn test_validate_rejects_unknown_encoding() {
        let config = ImportConfig {
            encoding: "klingon".to_string(),
            ..ImportConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ImportError::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let raw = r#"{ "reference_dir": "/data/ref", "decode_mode": "strict", "dialect": "sqlite" }"#;
        let config: ImportConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.reference_dir, PathBuf::from("/data/ref"));
        assert_eq!(config.supplier_dir, PathBuf::from("supplier"));
        assert_eq!(config.decode_mode, DecodeMode::Strict);
        assert_eq!(config.dialect, SqlDialect::Sqlite);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_from_json_file_missing() {
        let result = ImportConfig::from_json_file(Path::new("/nonexistent/tecdoc.json"));
        assert!(matches!(result, Err(ImportError::FileNotFound { .. })));
    }

    #[test]
    fn test_from_json_file_invalid() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{{ not json").unwrap();
        let result = ImportConfig::from_json_file(temp_file.path());
        assert!(matches!(result, Err(ImportError::Config { .. })));
    }

    #[test]
    fn test_file_override_from_env() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        std::env::set_var(env_keys::FILE_OVERRIDE, "/data/supplier/0101/200.0101");
        let config = ImportConfig::from_env().unwrap();
        assert_eq!(
            config.file_override,
            Some(PathBuf::from("/data/supplier/0101/200.0101"))
        );

        // 空值视为未设置
        std::env::set_var(env_keys::FILE_OVERRIDE, "   ");
        assert_eq!(ImportConfig::from_env().unwrap().file_override, None);

        std::env::remove_var(env_keys::FILE_OVERRIDE);
        assert_eq!(ImportConfig::from_env().unwrap().file_override, None);
    }

    #[test]
    fn test_env_overrides_existing_value() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let mut config = ImportConfig {
            file_override: Some(PathBuf::from("/from/json/010.dat")),
            ..ImportConfig::default()
        };
        std::env::set_var(env_keys::FILE_OVERRIDE, "/from/env/010.dat");
        let result = config.apply_env();
        std::env::remove_var(env_keys::FILE_OVERRIDE);

        result.unwrap();
        assert_eq!(config.file_override, Some(PathBuf::from("/from/env/010.dat")));
    }
}
