// ==========================================
// TecDoc 导入 - 目标连接批量装载调优
// ==========================================
// 目标:
// - 装载期间关闭语句日志、自动提交、唯一/外键检查
// - 调优以会话对象为作用域，结束（提交或丢弃）时恢复原设置
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::sql_emitter::SqlDialect;
use crate::schema::TableDefinition;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 打开 SQLite 连接并设置 busy_timeout
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(conn)
}

// ==========================================
// BulkLoadSettings - 批量装载开关
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkLoadSettings {
    pub disable_statement_log: bool,
    pub disable_autocommit: bool,
    pub disable_unique_checks: bool,
    pub disable_foreign_key_checks: bool,
}

impl Default for BulkLoadSettings {
    fn default() -> Self {
        Self {
            disable_statement_log: true,
            disable_autocommit: true,
            disable_unique_checks: true,
            disable_foreign_key_checks: true,
        }
    }
}

impl BulkLoadSettings {
    /// MySQL 会话调优语句（装载前执行）
    pub fn mysql_session_statements(&self) -> Vec<&'static str> {
        let mut statements = Vec::new();
        if self.disable_autocommit {
            statements.push("SET autocommit=0");
        }
        if self.disable_unique_checks {
            statements.push("SET unique_checks=0");
        }
        if self.disable_foreign_key_checks {
            statements.push("SET foreign_key_checks=0");
        }
        statements
    }

    /// MySQL 会话恢复语句（装载后执行）
    pub fn mysql_restore_statements(&self) -> Vec<&'static str> {
        let mut statements = Vec::new();
        if self.disable_foreign_key_checks {
            statements.push("SET foreign_key_checks=1");
        }
        if self.disable_unique_checks {
            statements.push("SET unique_checks=1");
        }
        if self.disable_autocommit {
            statements.push("SET autocommit=1");
        }
        statements
    }
}

/// 默认开关下的 MySQL 调优语句
pub fn mysql_session_statements() -> Vec<&'static str> {
    BulkLoadSettings::default().mysql_session_statements()
}

/// 默认开关下的 MySQL 恢复语句
pub fn mysql_restore_statements() -> Vec<&'static str> {
    BulkLoadSettings::default().mysql_restore_statements()
}

// ==========================================
// BulkLoadSession - SQLite 批量装载会话
// ==========================================
// 说明:
// - foreign_keys 只能在事务外切换，因此先切换再 BEGIN
// - SQLite 没有 unique_checks 的对应项，该开关在此忽略
pub struct BulkLoadSession<'c> {
    conn: &'c mut Connection,
    settings: BulkLoadSettings,
    saved_foreign_keys: i64,
    saved_synchronous: i64,
    finished: bool,
}

impl<'c> BulkLoadSession<'c> {
    /// 对连接应用装载调优并开启事务
    pub fn begin(conn: &'c mut Connection, settings: BulkLoadSettings) -> ImportResult<Self> {
        let saved_foreign_keys: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
        let saved_synchronous: i64 = conn.query_row("PRAGMA synchronous", [], |row| row.get(0))?;

        if settings.disable_statement_log {
            conn.trace(None);
            conn.profile(None);
        }
        if settings.disable_foreign_key_checks {
            conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
        }
        if settings.disable_autocommit {
            conn.execute_batch("PRAGMA synchronous = OFF; BEGIN;")?;
        }
        debug!(?settings, "批量装载会话已开启");

        Ok(Self {
            conn,
            settings,
            saved_foreign_keys,
            saved_synchronous,
            finished: false,
        })
    }

    pub fn connection(&self) -> &Connection {
        &*self.conn
    }

    /// 为表定义建表（SQLite 方言）
    pub fn create_table(&self, table: &TableDefinition) -> ImportResult<()> {
        self.conn
            .execute_batch(&table.create_table_sql(SqlDialect::Sqlite))?;
        Ok(())
    }

    /// 执行一段 SQL 文本
    pub fn execute_script(&self, sql: &str) -> ImportResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// 回放生成的 SQL 脚本文件
    pub fn apply_script(&self, path: &Path) -> ImportResult<()> {
        let sql = std::fs::read_to_string(path).map_err(|e| ImportError::from_open(path, e))?;
        self.execute_script(&sql)?;
        info!(script = %path.display(), "SQL 脚本已回放");
        Ok(())
    }

    /// 提交并恢复连接设置
    pub fn commit(mut self) -> ImportResult<()> {
        if self.settings.disable_autocommit {
            self.conn.execute_batch("COMMIT;")?;
        }
        self.finished = true;
        self.restore()
    }

    /// 回滚并恢复连接设置
    pub fn rollback(mut self) -> ImportResult<()> {
        if self.settings.disable_autocommit {
            self.conn.execute_batch("ROLLBACK;")?;
        }
        self.finished = true;
        self.restore()
    }

    fn restore(&self) -> ImportResult<()> {
        self.conn.execute_batch(&format!(
            "PRAGMA synchronous = {}; PRAGMA foreign_keys = {};",
            self.saved_synchronous, self.saved_foreign_keys
        ))?;
        debug!("批量装载会话设置已恢复");
        Ok(())
    }
}

impl Drop for BulkLoadSession<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!("批量装载会话未提交，执行回滚");
        if self.settings.disable_autocommit {
            let _ = self.conn.execute_batch("ROLLBACK;");
        }
        let _ = self.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pragma(conn: &Connection, name: &str) -> i64 {
        conn.query_row(&format!("PRAGMA {}", name), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_mysql_session_statements() {
        assert_eq!(
            mysql_session_statements(),
            vec!["SET autocommit=0", "SET unique_checks=0", "SET foreign_key_checks=0"]
        );
        assert_eq!(
            mysql_restore_statements(),
            vec!["SET foreign_key_checks=1", "SET unique_checks=1", "SET autocommit=1"]
        );
    }

    #[test]
    fn test_partial_settings() {
        let settings = BulkLoadSettings {
            disable_unique_checks: false,
            ..BulkLoadSettings::default()
        };
        assert_eq!(
            settings.mysql_session_statements(),
            vec!["SET autocommit=0", "SET foreign_key_checks=0"]
        );
    }

    #[test]
    fn test_session_commit_restores_pragmas() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON; CREATE TABLE t (id INTEGER PRIMARY KEY);")
            .unwrap();

        {
            let session = BulkLoadSession::begin(&mut conn, BulkLoadSettings::default()).unwrap();
            assert_eq!(pragma(session.connection(), "foreign_keys"), 0);
            assert!(!session.connection().is_autocommit());
            session
                .execute_script("INSERT OR IGNORE INTO t VALUES (1), (1), (2);")
                .unwrap();
            session.commit().unwrap();
        }

        assert!(conn.is_autocommit());
        assert_eq!(pragma(&conn, "foreign_keys"), 1);
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_session_drop_rolls_back() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY);").unwrap();

        {
            let session = BulkLoadSession::begin(&mut conn, BulkLoadSettings::default()).unwrap();
            session.execute_script("INSERT INTO t VALUES (1);").unwrap();
        }

        assert!(conn.is_autocommit());
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 0);
    }
}
