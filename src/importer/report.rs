// ==========================================
// TecDoc 导入 - 导入结果报告
// ==========================================
// 职责: 记录单表每个候选文件的导入行数（或跳过）
// 生命周期: 每次整表导入新建，不落库
// ==========================================

use crate::schema::TableDefinition;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// 单个文件的导入结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    /// Some(行数): 导入成功；None: 文件不存在，已跳过
    pub rows: Option<usize>,
    /// 生成的 SQL 脚本
    pub script: Option<PathBuf>,
}

/// 整表导入报告（按文件定位顺序）
#[derive(Debug, Clone, Serialize)]
pub struct EntityImportReport {
    pub table: String,
    pub sql_table: String,
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub entries: Vec<FileOutcome>,
}

impl EntityImportReport {
    pub fn new(table: &TableDefinition) -> Self {
        Self {
            table: table.name.to_string(),
            sql_table: table.sql_table.to_string(),
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            elapsed_ms: 0,
            entries: Vec::new(),
        }
    }

    pub fn record_imported(&mut self, path: PathBuf, rows: usize, script: PathBuf) {
        self.entries.push(FileOutcome {
            path,
            rows: Some(rows),
            script: Some(script),
        });
    }

    pub fn record_skipped(&mut self, path: PathBuf) {
        self.entries.push(FileOutcome {
            path,
            rows: None,
            script: None,
        });
    }

    /// 查询某文件的结果；外层 None 表示该文件不在本次候选中
    pub fn get(&self, path: &Path) -> Option<Option<usize>> {
        self.entries.iter().find(|e| e.path == path).map(|e| e.rows)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_rows(&self) -> usize {
        self.entries.iter().filter_map(|e| e.rows).sum()
    }

    pub fn imported_files(&self) -> impl Iterator<Item = &FileOutcome> {
        self.entries.iter().filter(|e| e.rows.is_some())
    }

    pub fn skipped_files(&self) -> impl Iterator<Item = &Path> {
        self.entries
            .iter()
            .filter(|e| e.rows.is_none())
            .map(|e| e.path.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::registry::COUNTRIES;

    #[test]
    fn test_report_accounting() {
        let mut report = EntityImportReport::new(&COUNTRIES);
        report.record_imported(PathBuf::from("ref/010.dat"), 12, PathBuf::from("sql/010.dat.sql"));
        report.record_skipped(PathBuf::from("sup/0101/010.0101"));

        assert_eq!(report.len(), 2);
        assert_eq!(report.total_rows(), 12);
        assert_eq!(report.get(Path::new("ref/010.dat")), Some(Some(12)));
        assert_eq!(report.get(Path::new("sup/0101/010.0101")), Some(None));
        assert_eq!(report.get(Path::new("other")), None);
        assert_eq!(report.imported_files().count(), 1);
        assert_eq!(
            report.skipped_files().collect::<Vec<_>>(),
            vec![Path::new("sup/0101/010.0101")]
        );
    }

    #[test]
    fn test_report_serializes() {
        let mut report = EntityImportReport::new(&COUNTRIES);
        report.record_skipped(PathBuf::from("ref/010.dat"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["table"], "010");
        assert_eq!(json["sql_table"], "tecdoc_countries");
        assert!(json["entries"][0]["rows"].is_null());
    }
}
