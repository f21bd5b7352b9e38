// ==========================================
// TecDoc 导入 - 定长文件读取器
// ==========================================
// 职责: 逐行读取定长文本，按列定义切取字节区间
// 说明:
// - 列顺序以调用方登记顺序为准（不按物理偏移排序）
// - 先按字节切片，再按配置字符集解码
// - 宽松模式下短行产生截断/空切片，严格模式报错
// ==========================================

use crate::config::DecodeMode;
use crate::importer::error::{ImportError, ImportResult};
use crate::schema::TableDefinition;
use encoding_rs::Encoding;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Range;
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone)]
struct FieldSpec {
    column_id: usize,
    name: String,
    range: Range<usize>,
}

/// 单个字段的原始切片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub column_id: usize,
    pub text: String,
}

/// 一行物理记录的原始切片（按列登记顺序）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 物理行号（1 起算）
    pub line: usize,
    pub fields: Vec<RawField>,
}

// ==========================================
// FixedWidthReader
// ==========================================
pub struct FixedWidthReader<R = BufReader<File>> {
    path: PathBuf,
    reader: R,
    columns: Vec<FieldSpec>,
    encoding: &'static Encoding,
    mode: DecodeMode,
    line_number: usize,
    buf: Vec<u8>,
}

impl FixedWidthReader<BufReader<File>> {
    /// 打开源文件
    ///
    /// # 返回
    /// - Err(FileNotFound): 文件不存在
    /// - Err(Unreadable): 其他打开失败
    pub fn open(path: &Path, encoding: &'static Encoding, mode: DecodeMode) -> ImportResult<Self> {
        let file = File::open(path).map_err(|e| ImportError::from_open(path, e))?;
        Ok(Self::from_reader(path, BufReader::new(file), encoding, mode))
    }
}

impl<R: BufRead> FixedWidthReader<R> {
    pub fn from_reader(
        path: impl Into<PathBuf>,
        reader: R,
        encoding: &'static Encoding,
        mode: DecodeMode,
    ) -> Self {
        Self {
            path: path.into(),
            reader,
            columns: Vec::new(),
            encoding,
            mode,
            line_number: 0,
            buf: Vec::new(),
        }
    }

    /// 登记一列（start 为 1 起算的字节位置）
    pub fn add_column(&mut self, column_id: usize, name: &str, start: usize, width: usize) {
        let begin = start.saturating_sub(1);
        self.columns.push(FieldSpec {
            column_id,
            name: name.to_string(),
            range: begin..begin + width,
        });
    }

    /// 按表定义登记全部列，列号即列定义下标
    pub fn with_table(mut self, table: &TableDefinition) -> Self {
        for (column_id, column) in table.columns.iter().enumerate() {
            self.add_column(column_id, column.name, column.start, column.width);
        }
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取下一行；文件结束返回 None
    pub fn next_row(&mut self) -> ImportResult<Option<RawRow>> {
        self.buf.clear();
        // 首次读取即失败（如路径是目录）与打开失败同样归为无法读取
        let read = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(|e| {
                if self.line_number == 0 {
                    ImportError::Unreadable {
                        path: self.path.clone(),
                        source: e,
                    }
                } else {
                    ImportError::FileRead {
                        path: self.path.clone(),
                        source: e,
                    }
                }
            })?;
        if read == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        let mut line: &[u8] = &self.buf;
        if let Some(stripped) = line.strip_suffix(b"\n") {
            line = stripped;
        }
        if let Some(stripped) = line.strip_suffix(b"\r") {
            line = stripped;
        }
        if self.line_number == 1 {
            if let Some(stripped) = line.strip_prefix(UTF8_BOM) {
                line = stripped;
            }
        }

        let mut fields = Vec::with_capacity(self.columns.len());
        for spec in &self.columns {
            if line.len() < spec.range.end && self.mode.is_strict() {
                return Err(ImportError::ShortLine {
                    path: self.path.clone(),
                    line: self.line_number,
                    column: spec.name.clone(),
                    expected: spec.range.end,
                    actual: line.len(),
                });
            }
            let begin = spec.range.start.min(line.len());
            let end = spec.range.end.min(line.len());
            let (text, _) = self.encoding.decode_without_bom_handling(&line[begin..end]);
            fields.push(RawField {
                column_id: spec.column_id,
                text: text.into_owned(),
            });
        }

        Ok(Some(RawRow {
            line: self.line_number,
            fields,
        }))
    }
}

impl<R: BufRead> Iterator for FixedWidthReader<R> {
    type Item = ImportResult<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn reader(data: &[u8], mode: DecodeMode) -> FixedWidthReader<Cursor<Vec<u8>>> {
        let mut r = FixedWidthReader::from_reader(
            "test.dat",
            Cursor::new(data.to_vec()),
            encoding_rs::UTF_8,
            mode,
        );
        r.add_column(0, "code", 1, 3);
        r.add_column(1, "label", 4, 5);
        r
    }

    fn texts(row: &RawRow) -> Vec<&str> {
        row.fields.iter().map(|f| f.text.as_str()).collect()
    }

    #[test]
    fn test_slices_each_line() {
        let rows: Vec<RawRow> = reader(b"001Hello\n002World\n", DecodeMode::Lenient)
            .collect::<ImportResult<_>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(texts(&rows[0]), vec!["001", "Hello"]);
        assert_eq!(texts(&rows[1]), vec!["002", "World"]);
        assert_eq!(rows[1].line, 2);
    }

    #[test]
    fn test_crlf_and_missing_final_newline() {
        let rows: Vec<RawRow> = reader(b"001Hello\r\n002World", DecodeMode::Lenient)
            .collect::<ImportResult<_>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(texts(&rows[0]), vec!["001", "Hello"]);
        assert_eq!(texts(&rows[1]), vec!["002", "World"]);
    }

    #[test]
    fn test_column_order_follows_registration() {
        let mut r = FixedWidthReader::from_reader(
            "test.dat",
            Cursor::new(b"001Hello\n".to_vec()),
            encoding_rs::UTF_8,
            DecodeMode::Lenient,
        );
        r.add_column(7, "label", 4, 5);
        r.add_column(3, "code", 1, 3);
        let row = r.next_row().unwrap().unwrap();
        assert_eq!(row.fields[0], RawField { column_id: 7, text: "Hello".to_string() });
        assert_eq!(row.fields[1], RawField { column_id: 3, text: "001".to_string() });
    }

    #[test]
    fn test_short_line_lenient_truncates() {
        let mut r = reader(b"00\n", DecodeMode::Lenient);
        let row = r.next_row().unwrap().unwrap();
        assert_eq!(texts(&row), vec!["00", ""]);
        assert!(r.next_row().unwrap().is_none());
    }

    #[test]
    fn test_short_line_strict_errors() {
        let mut r = reader(b"001Hel\n", DecodeMode::Strict);
        let err = r.next_row().unwrap_err();
        match err {
            ImportError::ShortLine {
                line,
                column,
                expected,
                actual,
                ..
            } => {
                assert_eq!(line, 1);
                assert_eq!(column, "label");
                assert_eq!(expected, 8);
                assert_eq!(actual, 6);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_windows_1252_decoding() {
        let mut r = FixedWidthReader::from_reader(
            "test.dat",
            Cursor::new(b"M\xFCller\n".to_vec()),
            encoding_rs::WINDOWS_1252,
            DecodeMode::Lenient,
        );
        r.add_column(0, "name", 1, 6);
        let row = r.next_row().unwrap().unwrap();
        assert_eq!(row.fields[0].text, "Müller");
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let rows: Vec<RawRow> = reader(b"\xEF\xBB\xBF001Hello\n", DecodeMode::Lenient)
            .collect::<ImportResult<_>>()
            .unwrap();
        assert_eq!(texts(&rows[0]), vec!["001", "Hello"]);
    }

    #[test]
    fn test_open_missing_file() {
        let result = FixedWidthReader::open(
            Path::new("/nonexistent/010.dat"),
            encoding_rs::UTF_8,
            DecodeMode::Lenient,
        );
        assert!(matches!(result, Err(ImportError::FileNotFound { .. })));
    }

    #[test]
    fn test_directory_is_unreadable() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = FixedWidthReader::open(dir.path(), encoding_rs::UTF_8, DecodeMode::Lenient)
            .and_then(|mut r| {
                r.add_column(0, "code", 1, 3);
                r.next_row()
            });
        let err = result.unwrap_err();
        assert!(err.is_skippable(), "unexpected error: {err}");
    }

    #[test]
    fn test_open_real_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "DE 000001234").unwrap();
        let mut r = FixedWidthReader::open(temp_file.path(), encoding_rs::UTF_8, DecodeMode::Lenient)
            .unwrap();
        r.add_column(0, "country_code", 1, 3);
        r.add_column(1, "description_id", 4, 9);
        let row = r.next_row().unwrap().unwrap();
        assert_eq!(texts(&row), vec!["DE ", "000001234"]);
    }
}
