// ==========================================
// TecDoc 导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use std::path::PathBuf;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 配置相关错误 =====
    #[error("未找到供应商目录: {}", path.display())]
    NoSupplierDirectories { path: PathBuf },

    #[error("配置错误 (key: {key}): {message}")]
    Config { key: String, message: String },

    #[error("未知的表定义: {0}")]
    UnknownTable(String),

    #[error("不支持的字符集: {0}")]
    UnsupportedEncoding(String),

    // ===== 文件相关错误 =====
    #[error("文件不存在: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("文件无法读取: {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("文件读取失败: {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("供应商目录读取失败: {}: {source}", path.display())]
    SupplierDirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SQL 脚本写入失败: {}: {source}", path.display())]
    SinkWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("已处理标记失败: {}: {source}", path.display())]
    ProcessedMarker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ===== 数据格式错误（仅严格模式） =====
    #[error("行长度不足 ({}:{line}, 列 {column}): 期望至少 {expected} 字节，实际 {actual}", path.display())]
    ShortLine {
        path: PathBuf,
        line: usize,
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("日期格式错误 ({}:{line}, 列 {column}): 期望 YYYYMM[DD]，实际 {value:?}", path.display())]
    MalformedDate {
        path: PathBuf,
        line: usize,
        column: String,
        value: String,
    },

    // ===== 数据库错误 =====
    #[error("数据库操作失败: {0}")]
    Database(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 打开源文件失败时的错误归类（NotFound 单独区分，其余为无法读取）
    pub fn from_open(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            ImportError::FileNotFound { path }
        } else {
            ImportError::Unreadable { path, source: err }
        }
    }

    pub fn is_file_not_found(&self) -> bool {
        matches!(self, ImportError::FileNotFound { .. })
    }

    /// 文件不存在或无法读取（编排器记为 null 并继续下一个文件）
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            ImportError::FileNotFound { .. } | ImportError::Unreadable { .. }
        )
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Database(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::Config {
            key: "json".to_string(),
            message: err.to_string(),
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_open_not_found() {
        let err = ImportError::from_open(
            "/data/010.dat",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.is_file_not_found());
        assert!(err.is_skippable());
        assert_eq!(err.to_string(), "文件不存在: /data/010.dat");
    }

    #[test]
    fn test_from_open_other_io_error() {
        let err = ImportError::from_open(
            "/data/010.dat",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_file_not_found());
        assert!(err.is_skippable());
        assert!(matches!(err, ImportError::Unreadable { .. }));
    }

    #[test]
    fn test_mid_file_read_error_not_skippable() {
        let err = ImportError::FileRead {
            path: PathBuf::from("/data/010.dat"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk"),
        };
        assert!(!err.is_skippable());
    }

    #[test]
    fn test_from_rusqlite() {
        let err: ImportError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, ImportError::Database(_)));
    }
}
