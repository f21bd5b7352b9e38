// ==========================================
// TecDoc 导入 - 列值格式化
// ==========================================
// 职责: (声明类型, 原始文本) → 标准化字面值 / NULL
// 说明: 数值合法性不在此校验，留给 SQL 生成阶段
// ==========================================

use crate::schema::ColumnType;
use regex::Regex;
use std::sync::LazyLock;

/// 日期: 4 位年 + 2 位月 + 可选 2 位日（不锚定，与历史数据的前导填充兼容）
static DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{4})([0-9]{2})([0-9]{2})?").expect("日期正则非法"));

/// 单列格式化结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formatted {
    Value(Option<String>),
    /// 日期文本不匹配 YYYYMM[DD]，由调用方按解码模式处理
    MalformedDate,
}

/// 格式化单列原始文本
pub fn format_column(column_type: ColumnType, raw: &str) -> Formatted {
    match column_type {
        ColumnType::Boolean | ColumnType::Integer | ColumnType::SmallInt | ColumnType::BigInt => {
            if raw.trim().is_empty() {
                Formatted::Value(None)
            } else {
                Formatted::Value(Some(raw.to_string()))
            }
        }
        ColumnType::Date => {
            if raw.trim().is_empty() {
                return Formatted::Value(None);
            }
            match format_date(raw) {
                Some(date) => Formatted::Value(Some(date)),
                None => Formatted::MalformedDate,
            }
        }
        ColumnType::String => Formatted::Value(Some(raw.trim().to_string())),
    }
}

/// YYYYMM → YYYY-MM-00，YYYYMMDD → YYYY-MM-DD
pub fn format_date(raw: &str) -> Option<String> {
    let caps = DATE_REGEX.captures(raw)?;
    let day = caps.get(3).map_or("00", |m| m.as_str());
    Some(format!("{}-{}-{}", &caps[1], &caps[2], day))
}
