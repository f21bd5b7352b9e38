// ==========================================
// TecDoc 导入 - 表结构元数据
// ==========================================
// 职责: 以声明式数据描述定长文件的表/列布局
// 说明: 列起始位置统一为 1 起算（与数据格式手册一致）
// ==========================================

pub mod registry;

use crate::importer::sql_emitter::SqlDialect;

pub use registry::{all_tables, find_table};

// ==========================================
// ColumnType - 列声明类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Boolean,
    Integer,
    SmallInt,
    BigInt,
    Date,
    String,
}

impl ColumnType {
    /// 整数族（integer / smallint / bigint）
    pub fn is_integer_family(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::SmallInt | ColumnType::BigInt)
    }

    /// 声明类型名称（与元数据中的写法一致）
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Boolean => "boolean",
            ColumnType::Integer => "integer",
            ColumnType::SmallInt => "smallint",
            ColumnType::BigInt => "bigint",
            ColumnType::Date => "date",
            ColumnType::String => "string",
        }
    }

    fn sql_type(self, width: usize, dialect: SqlDialect) -> String {
        match (self, dialect) {
            (ColumnType::Boolean, SqlDialect::MySql) => "TINYINT(1)".to_string(),
            (ColumnType::Integer, SqlDialect::MySql) => "INT".to_string(),
            (ColumnType::SmallInt, SqlDialect::MySql) => "SMALLINT".to_string(),
            (ColumnType::BigInt, SqlDialect::MySql) => "BIGINT".to_string(),
            (ColumnType::Date, SqlDialect::MySql) => "DATE".to_string(),
            (ColumnType::String, SqlDialect::MySql) => format!("VARCHAR({})", width),
            (ColumnType::Date | ColumnType::String, SqlDialect::Sqlite) => "TEXT".to_string(),
            (_, SqlDialect::Sqlite) => "INTEGER".to_string(),
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// ColumnDefinition - 列定义
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDefinition {
    /// 数据库列名
    pub name: &'static str,
    /// 声明类型
    pub column_type: ColumnType,
    /// 起始字节位置（1 起算）
    pub start: usize,
    /// 字节宽度
    pub width: usize,
    /// 是否参与主键（INSERT IGNORE 去重依据）
    pub primary_key: bool,
}

impl ColumnDefinition {
    pub const fn new(name: &'static str, column_type: ColumnType, start: usize, width: usize) -> Self {
        Self {
            name,
            column_type,
            start,
            width,
            primary_key: false,
        }
    }

    pub const fn key(name: &'static str, column_type: ColumnType, start: usize, width: usize) -> Self {
        Self {
            name,
            column_type,
            start,
            width,
            primary_key: true,
        }
    }

    /// 0 起算的字节区间 [begin, end)
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        let begin = self.start.saturating_sub(1);
        begin..begin + self.width
    }
}

// ==========================================
// TableDefinition - 表定义
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDefinition {
    /// 数据文件名（参考文件 `<name>.dat`，供应商文件 `<name>.<供应商号>`）
    pub name: &'static str,
    /// 目标数据库表名
    pub sql_table: &'static str,
    /// 是否存在共享参考文件
    pub reference: bool,
    /// 是否存在按供应商拆分的文件
    pub supplier: bool,
    pub columns: &'static [ColumnDefinition],
}

impl TableDefinition {
    /// 一行记录的最小字节长度
    pub fn record_width(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.byte_range().end)
            .max()
            .unwrap_or(0)
    }

    /// 生成建表语句（用于在临时库中回放生成的脚本）
    pub fn create_table_sql(&self, dialect: SqlDialect) -> String {
        let mut parts: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                format!(
                    "{} {}",
                    dialect.quote_identifier(c.name),
                    c.column_type.sql_type(c.width, dialect)
                )
            })
            .collect();

        let keys: Vec<String> = self
            .columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| dialect.quote_identifier(c.name))
            .collect();
        if !keys.is_empty() {
            parts.push(format!("PRIMARY KEY ({})", keys.join(", ")));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            dialect.quote_identifier(self.sql_table),
            parts.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SAMPLE_COLUMNS: [ColumnDefinition; 3] = [
        ColumnDefinition::key("id", ColumnType::Integer, 1, 4),
        ColumnDefinition::new("label", ColumnType::String, 5, 10),
        ColumnDefinition::new("valid_from", ColumnType::Date, 15, 8),
    ];

    static SAMPLE: TableDefinition = TableDefinition {
        name: "900",
        sql_table: "sample",
        reference: true,
        supplier: false,
        columns: &SAMPLE_COLUMNS,
    };

    #[test]
    fn test_byte_range_is_one_based() {
        assert_eq!(SAMPLE_COLUMNS[0].byte_range(), 0..4);
        assert_eq!(SAMPLE_COLUMNS[1].byte_range(), 4..14);
        assert_eq!(SAMPLE.record_width(), 22);
    }

    #[test]
    fn test_integer_family() {
        assert!(ColumnType::Integer.is_integer_family());
        assert!(ColumnType::SmallInt.is_integer_family());
        assert!(ColumnType::BigInt.is_integer_family());
        assert!(!ColumnType::Boolean.is_integer_family());
        assert!(!ColumnType::Date.is_integer_family());
    }

    #[test]
    fn test_create_table_sql_mysql() {
        let sql = SAMPLE.create_table_sql(SqlDialect::MySql);
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS `sample` (`id` INT, `label` VARCHAR(10), \
             `valid_from` DATE, PRIMARY KEY (`id`));"
        );
    }

    #[test]
    fn test_create_table_sql_sqlite() {
        let sql = SAMPLE.create_table_sql(SqlDialect::Sqlite);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"sample\""));
        assert!(sql.contains("\"id\" INTEGER"));
        assert!(sql.contains("PRIMARY KEY (\"id\")"));
    }
}
