// ==========================================
// TecDoc 导入 - 命令行入口
// ==========================================
// 用法:
//   tecdoc-import [表名|all ...]
//
// 环境变量:
//   TECDOC_CONFIG      JSON 配置文件（可选，环境变量再覆盖其上）
//   TECDOC_APPLY_DB    设置后把生成的脚本回放到该 SQLite 库（需 TECDOC_DIALECT=sqlite）
//   其余见 config::env_keys
// ==========================================

use anyhow::{bail, Context};
use std::path::Path;
use tecdoc_import::config::ImportConfig;
use tecdoc_import::db::{self, BulkLoadSession, BulkLoadSettings};
use tecdoc_import::importer::{ImportError, ImportManager, SqlDialect};
use tecdoc_import::schema::{all_tables, find_table, TableDefinition};
use tecdoc_import::{logging, APP_NAME, VERSION};

fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", APP_NAME);
    tracing::info!("系统版本: {}", VERSION);
    tracing::info!("==================================================");

    let config = match env_value("TECDOC_CONFIG") {
        Some(path) => ImportConfig::from_json_file(Path::new(&path))
            .with_context(|| format!("加载配置文件失败: {}", path))?,
        None => ImportConfig::from_env().context("读取环境变量配置失败")?,
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let tables = select_tables(&args)?;

    let apply_db = env_value("TECDOC_APPLY_DB");
    if apply_db.is_some() && config.dialect != SqlDialect::Sqlite {
        bail!("TECDOC_APPLY_DB 仅支持 sqlite 方言（当前: {:?}）", config.dialect);
    }
    let mut conn = apply_db
        .as_deref()
        .map(db::open_sqlite_connection)
        .transpose()
        .context("打开目标数据库失败")?;

    if config.dialect == SqlDialect::MySql {
        tracing::info!(
            statements = %db::mysql_session_statements().join("; "),
            "回放脚本前请在目标 MySQL 会话执行调优语句"
        );
    }

    let manager = ImportManager::new(config)?;

    for table in tables {
        let report = manager
            .import_entity(table)
            .with_context(|| format!("导入表 {} 失败", table.name))?;

        if let Some(conn) = conn.as_mut() {
            let session = BulkLoadSession::begin(conn, BulkLoadSettings::default())?;
            session.create_table(table)?;
            for entry in report.imported_files() {
                if let Some(script) = &entry.script {
                    session.apply_script(script)?;
                }
            }
            session.commit()?;
        }

        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

/// 无参数或含 `all` 时导入全部已注册表
fn select_tables(args: &[String]) -> Result<Vec<&'static TableDefinition>, ImportError> {
    if args.is_empty() || args.iter().any(|a| a == "all") {
        return Ok(all_tables());
    }
    args.iter()
        .map(|name| find_table(name).ok_or_else(|| ImportError::UnknownTable(name.clone())))
        .collect()
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
