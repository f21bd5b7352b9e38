// ==========================================
// TecDoc 导入 - SQL 批量语句生成
// ==========================================
// 职责: 将逐行的列值拼接为分批的 INSERT IGNORE 语句
// 规则:
// - 每批首行输出 `INSERT IGNORE INTO <表> (<列>) VALUES` 前缀
// - 批末行或全文件末行以 `;` 结束，其余行以 `,` 结束
// - 整数族: 数值 > 0 输出整数字面值，否则 NULL
// - 其余类型: 按方言转义为带引号的字符串字面值；NULL 值一律输出 NULL
// ==========================================

use crate::importer::error::ImportError;
use crate::schema::{ColumnType, TableDefinition};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ==========================================
// SqlDialect - 目标数据库方言
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// MySQL / MariaDB（生产目标）
    #[default]
    MySql,
    /// SQLite（用于回放校验）
    Sqlite,
}

impl SqlDialect {
    pub fn insert_ignore_keyword(self) -> &'static str {
        match self {
            SqlDialect::MySql => "INSERT IGNORE INTO",
            SqlDialect::Sqlite => "INSERT OR IGNORE INTO",
        }
    }

    /// 标识符加引号
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            SqlDialect::MySql => format!("`{}`", name.replace('`', "``")),
            SqlDialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// 字符串字面值加引号并转义
    pub fn quote_literal(self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        match self {
            SqlDialect::MySql => {
                for ch in value.chars() {
                    match ch {
                        '\0' => out.push_str("\\0"),
                        '\n' => out.push_str("\\n"),
                        '\r' => out.push_str("\\r"),
                        '\\' => out.push_str("\\\\"),
                        '\'' => out.push_str("\\'"),
                        '"' => out.push_str("\\\""),
                        '\x1a' => out.push_str("\\Z"),
                        _ => out.push(ch),
                    }
                }
            }
            SqlDialect::Sqlite => {
                for ch in value.chars() {
                    if ch == '\'' {
                        out.push('\'');
                    }
                    out.push(ch);
                }
            }
        }
        out.push('\'');
        out
    }
}

impl std::str::FromStr for SqlDialect {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(SqlDialect::MySql),
            "sqlite" => Ok(SqlDialect::Sqlite),
            other => Err(ImportError::Config {
                key: "dialect".to_string(),
                message: format!("未知的 SQL 方言: {}", other),
            }),
        }
    }
}

// ==========================================
// 批边界计算
// ==========================================

/// 第 row_index 行（1 起算）是否为一批的首行
pub fn is_first_in_batch(row_index: usize, batch_size: usize) -> bool {
    // batch_size > 1 时等价于 row_index % batch_size == 1
    row_index > 0 && (row_index - 1) % batch_size == 0
}

/// 第 row_index 行是否为一批的末行
pub fn is_last_in_batch(row_index: usize, batch_size: usize, no_more_rows: bool) -> bool {
    row_index % batch_size == 0 || no_more_rows
}

/// 整数族字面值: 取前导整数部分，> 0 输出数值，否则 NULL
pub fn integer_literal(value: Option<&str>) -> String {
    match value.map(leading_integer) {
        Some(n) if n > 0 => n.to_string(),
        _ => "NULL".to_string(),
    }
}

/// 解析文本前导整数（跳过前导空白，遇非数字停止，溢出饱和）
fn leading_integer(text: &str) -> i64 {
    let s = text.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut n: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let d = i64::from(b - b'0');
        n = if negative {
            n.saturating_mul(10).saturating_sub(d)
        } else {
            n.saturating_mul(10).saturating_add(d)
        };
    }
    n
}

// ==========================================
// BatchState - 单文件批计数
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchState {
    /// 已输出行数（当前行号）
    pub rows: usize,
    /// 当前批内行数
    pub rows_in_batch: usize,
    /// 已闭合的语句数
    pub statements: usize,
}

// ==========================================
// SqlBatchEmitter
// ==========================================
pub struct SqlBatchEmitter {
    dialect: SqlDialect,
    prefix: String,
    column_types: Vec<ColumnType>,
    batch_size: usize,
}

impl SqlBatchEmitter {
    /// 创建生成器（列名列表在此一次性渲染）
    pub fn new(table: &TableDefinition, dialect: SqlDialect, batch_size: usize) -> Self {
        let columns: Vec<String> = table
            .columns
            .iter()
            .map(|c| dialect.quote_identifier(c.name))
            .collect();
        let prefix = format!(
            "{} {} ({}) VALUES ",
            dialect.insert_ignore_keyword(),
            table.sql_table,
            columns.join(", ")
        );

        Self {
            dialect,
            prefix,
            column_types: table.columns.iter().map(|c| c.column_type).collect(),
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// 渲染单个列值
    pub fn render_value(&self, column_type: ColumnType, value: Option<&str>) -> String {
        if column_type.is_integer_family() {
            return integer_literal(value);
        }
        match value {
            None => "NULL".to_string(),
            Some(v) => self.dialect.quote_literal(v),
        }
    }

    /// 渲染一行（以换行结尾）
    ///
    /// # 参数
    /// - values: 与列定义一一对应的格式化值
    /// - is_first: 是否批首行（输出 INSERT 前缀）
    /// - is_last: 是否批末行（以 `;` 结束）
    pub fn render_row(&self, values: &[Option<String>], is_first: bool, is_last: bool) -> String {
        let rendered: Vec<String> = self
            .column_types
            .iter()
            .zip(values)
            .map(|(t, v)| self.render_value(*t, v.as_deref()))
            .collect();

        let mut line = String::new();
        if is_first {
            line.push_str(&self.prefix);
        }
        line.push_str(" (");
        line.push_str(&rendered.join(", "));
        line.push(')');
        line.push(if is_last { ';' } else { ',' });
        line.push('\n');
        line
    }

    /// 推进批计数并渲染一行
    pub fn emit_row(
        &self,
        state: &mut BatchState,
        values: &[Option<String>],
        no_more_rows: bool,
    ) -> String {
        state.rows += 1;
        let is_first = is_first_in_batch(state.rows, self.batch_size);
        let is_last = is_last_in_batch(state.rows, self.batch_size, no_more_rows);

        if is_first {
            state.rows_in_batch = 0;
        }
        state.rows_in_batch += 1;
        if is_last {
            state.statements += 1;
            debug!(
                rows = state.rows,
                batch_rows = state.rows_in_batch,
                statements = state.statements,
                "批语句闭合"
            );
        }

        self.render_row(values, is_first, is_last)
    }
}
