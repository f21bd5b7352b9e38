// ==========================================
// TecDoc 导入 - 导入编排器
// ==========================================
// 职责: 定位文件 → 逐行读取 → 列格式化 → 批量 SQL → 写脚本 → 标记已处理
// 说明:
// - 单线程顺序执行，一次只处理一个文件
// - 单个文件不存在只记 null，不中断整表导入
// - 不提交目标库事务，生成的脚本由后续步骤回放
// ==========================================

use crate::config::ImportConfig;
use crate::importer::column_formatter::{format_column, Formatted};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::fixed_width::{FixedWidthReader, RawRow};
use crate::importer::report::EntityImportReport;
use crate::importer::sql_emitter::{BatchState, SqlBatchEmitter};
use crate::schema::TableDefinition;
use encoding_rs::Encoding;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// 已处理文件的后缀
pub const PROCESSED_SUFFIX: &str = ".processed";

/// 参考文件扩展名
const REFERENCE_EXTENSION: &str = "dat";

// ==========================================
// ImportManager
// ==========================================
pub struct ImportManager {
    config: ImportConfig,
    encoding: &'static Encoding,
}

impl ImportManager {
    /// 创建导入编排器（会先校验配置）
    pub fn new(config: ImportConfig) -> ImportResult<Self> {
        config.validate()?;
        let encoding = Encoding::for_label(config.encoding.as_bytes())
            .ok_or_else(|| ImportError::UnsupportedEncoding(config.encoding.clone()))?;
        Ok(Self { config, encoding })
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    // ==========================================
    // 文件定位
    // ==========================================

    /// 供应商号列表（供应商根目录下的一级子目录名，升序）
    ///
    /// # 返回
    /// - Err(NoSupplierDirectories): 根目录不存在或没有任何子目录
    pub fn suppliers(&self) -> ImportResult<Vec<String>> {
        let root = &self.config.supplier_dir;
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ImportError::NoSupplierDirectories { path: root.clone() });
            }
            Err(e) => {
                return Err(ImportError::SupplierDirectoryRead {
                    path: root.clone(),
                    source: e,
                })
            }
        };

        let mut suppliers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ImportError::SupplierDirectoryRead {
                path: root.clone(),
                source: e,
            })?;
            if entry.path().is_dir() {
                suppliers.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        if suppliers.is_empty() {
            return Err(ImportError::NoSupplierDirectories { path: root.clone() });
        }

        suppliers.sort();
        Ok(suppliers)
    }

    /// 解析某表需要导入的文件（有序：参考文件在前，供应商按编号升序）
    ///
    /// 设置了单文件覆写时直接返回该文件，不做任何目录扫描。
    pub fn locate_files(&self, table: &TableDefinition) -> ImportResult<Vec<PathBuf>> {
        if let Some(file) = &self.config.file_override {
            debug!(file = %file.display(), "使用单文件覆写");
            return Ok(vec![file.clone()]);
        }

        let mut files = Vec::new();

        if table.reference {
            let path = self
                .config
                .reference_dir
                .join(format!("{}.{}", table.name, REFERENCE_EXTENSION));
            if path.exists() {
                files.push(path);
            }
        }

        if table.supplier {
            for supplier in self.suppliers()? {
                if self.config.skip_suppliers.contains(&supplier) {
                    continue;
                }
                let path = self
                    .config
                    .supplier_dir
                    .join(&supplier)
                    .join(format!("{}.{}", table.name, supplier));
                if path.exists() {
                    files.push(path);
                }
            }
        }

        Ok(files)
    }

    // ==========================================
    // 单文件导入
    // ==========================================

    /// 源文件对应的 SQL 脚本路径: `<输出目录>/<源文件名>.sql`
    pub fn script_path(&self, source: &Path) -> PathBuf {
        let mut name = source
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("import"));
        name.push(".sql");
        self.config.output_dir.join(name)
    }

    /// 导入单个文件，返回行数
    ///
    /// 失败时删除未写完的脚本；源文件打开失败不会创建脚本。
    #[instrument(skip(self, table), fields(table = table.name))]
    pub fn import_file(&self, path: &Path, table: &TableDefinition) -> ImportResult<usize> {
        let start_time = Instant::now();
        let reader = FixedWidthReader::open(path, self.encoding, self.config.decode_mode)?
            .with_table(table);

        let script = self.script_path(path);
        let result = self.write_script(reader, table, &script);
        if result.is_err() {
            let _ = fs::remove_file(&script);
        }
        let rows = result?;

        info!(
            file = %path.display(),
            script = %script.display(),
            rows = rows,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "文件导入完成"
        );
        Ok(rows)
    }

    fn write_script<R: std::io::BufRead>(
        &self,
        mut reader: FixedWidthReader<R>,
        table: &TableDefinition,
        script: &Path,
    ) -> ImportResult<usize> {
        let sink_err = |e: std::io::Error| ImportError::SinkWrite {
            path: script.to_path_buf(),
            source: e,
        };

        fs::create_dir_all(&self.config.output_dir).map_err(sink_err)?;
        let mut sink = BufWriter::new(File::create(script).map_err(sink_err)?);

        let emitter = SqlBatchEmitter::new(table, self.config.dialect, self.config.batch_size);
        let mut state = BatchState::default();

        let mut next = reader.next_row()?;
        while let Some(raw) = next {
            let values = self.format_row(reader.path(), table, &raw)?;
            next = reader.next_row()?;
            let line = emitter.emit_row(&mut state, &values, next.is_none());
            sink.write_all(line.as_bytes()).map_err(sink_err)?;
        }

        sink.flush().map_err(sink_err)?;
        Ok(state.rows)
    }

    /// 按列类型格式化一行，结果与列定义一一对应
    fn format_row(
        &self,
        path: &Path,
        table: &TableDefinition,
        raw: &RawRow,
    ) -> ImportResult<Vec<Option<String>>> {
        let mut values = vec![None; table.columns.len()];
        for field in &raw.fields {
            let Some(column) = table.columns.get(field.column_id) else {
                continue;
            };
            values[field.column_id] = match format_column(column.column_type, &field.text) {
                Formatted::Value(v) => v,
                Formatted::MalformedDate if self.config.decode_mode.is_strict() => {
                    return Err(ImportError::MalformedDate {
                        path: path.to_path_buf(),
                        line: raw.line,
                        column: column.name.to_string(),
                        value: field.text.clone(),
                    });
                }
                Formatted::MalformedDate => {
                    warn!(
                        file = %path.display(),
                        line = raw.line,
                        column = column.name,
                        value = %field.text,
                        "日期格式无法识别，按 NULL 处理"
                    );
                    None
                }
            };
        }
        Ok(values)
    }

    // ==========================================
    // 整表导入
    // ==========================================

    /// 导入某表的全部文件
    ///
    /// # 返回
    /// - Ok(report): 每个候选文件 → 行数，或 None（文件不存在）
    /// - Err: 没有供应商目录、I/O 写入失败、严格模式下的脏数据等
    #[instrument(skip(self, table), fields(table = table.name))]
    pub fn import_entity(&self, table: &TableDefinition) -> ImportResult<EntityImportReport> {
        let files = self.locate_files(table)?;
        self.import_located(table, files)
    }

    /// 按给定顺序导入一组已定位的文件
    pub fn import_located(
        &self,
        table: &TableDefinition,
        files: Vec<PathBuf>,
    ) -> ImportResult<EntityImportReport> {
        let start_time = Instant::now();
        let mut report = EntityImportReport::new(table);
        info!(run_id = %report.run_id, files = files.len(), "开始导入表");

        for path in files {
            match self.import_file(&path, table) {
                Ok(rows) => {
                    mark_processed(&path)?;
                    let script = self.script_path(&path);
                    report.record_imported(path, rows, script);
                }
                Err(e) if e.is_skippable() => {
                    warn!(file = %path.display(), error = %e, "文件不存在或无法读取，跳过");
                    report.record_skipped(path);
                }
                Err(e) => return Err(e),
            }
        }

        report.elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            run_id = %report.run_id,
            imported = report.imported_files().count(),
            skipped = report.skipped_files().count(),
            rows = report.total_rows(),
            elapsed_ms = report.elapsed_ms,
            "表导入完成"
        );
        Ok(report)
    }

    /// 依次导入多张表（任一表出错即中止）
    pub fn import_entities<'a, I>(&self, tables: I) -> ImportResult<Vec<EntityImportReport>>
    where
        I: IntoIterator<Item = &'a TableDefinition>,
    {
        tables.into_iter().map(|t| self.import_entity(t)).collect()
    }
}

/// 已处理标记路径: `<原文件>.processed`
pub fn processed_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(PROCESSED_SUFFIX);
    PathBuf::from(name)
}

/// 原地重命名为 `.processed`，避免重复导入
fn mark_processed(path: &Path) -> ImportResult<()> {
    let target = processed_path(path);
    fs::rename(path, &target).map_err(|e| ImportError::ProcessedMarker {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(file = %target.display(), "已标记为已处理");
    Ok(())
}
