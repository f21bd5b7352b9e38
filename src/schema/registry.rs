// ==========================================
// TecDoc 导入 - 静态表注册表
// ==========================================
// 职责: 汇总所有可导入的表定义（名称 / 文件来源 / 列布局）
// ==========================================

use super::{ColumnDefinition, ColumnType, TableDefinition};

// ===== 参考数据 =====

pub static COUNTRIES: TableDefinition = TableDefinition {
    name: "010",
    sql_table: "tecdoc_countries",
    reference: true,
    supplier: false,
    columns: &[
        ColumnDefinition::key("country_code", ColumnType::String, 1, 3),
        ColumnDefinition::new("description_id", ColumnType::BigInt, 4, 9),
        ColumnDefinition::new("is_group", ColumnType::Boolean, 13, 1),
        ColumnDefinition::new("currency_code", ColumnType::String, 14, 3),
        ColumnDefinition::new("iso_code", ColumnType::SmallInt, 17, 3),
        ColumnDefinition::new("valid_from", ColumnType::Date, 20, 8),
    ],
};

pub static LANGUAGES: TableDefinition = TableDefinition {
    name: "020",
    sql_table: "tecdoc_languages",
    reference: true,
    supplier: false,
    columns: &[
        ColumnDefinition::key("language_id", ColumnType::SmallInt, 1, 3),
        ColumnDefinition::new("description_id", ColumnType::BigInt, 4, 9),
        ColumnDefinition::new("iso_code", ColumnType::String, 13, 2),
        ColumnDefinition::new("codepage", ColumnType::String, 15, 10),
    ],
};

// ===== 参考 + 供应商数据 =====

pub static DESCRIPTIONS: TableDefinition = TableDefinition {
    name: "030",
    sql_table: "tecdoc_descriptions",
    reference: true,
    supplier: true,
    columns: &[
        ColumnDefinition::key("description_id", ColumnType::BigInt, 1, 9),
        ColumnDefinition::key("language_id", ColumnType::SmallInt, 10, 3),
        ColumnDefinition::new("text", ColumnType::String, 13, 60),
    ],
};

// ===== 供应商数据 =====

pub static ARTICLES: TableDefinition = TableDefinition {
    name: "200",
    sql_table: "tecdoc_articles",
    reference: false,
    supplier: true,
    columns: &[
        ColumnDefinition::key("supplier_id", ColumnType::Integer, 1, 4),
        ColumnDefinition::key("article_no", ColumnType::String, 5, 22),
        ColumnDefinition::new("description_id", ColumnType::BigInt, 27, 9),
        ColumnDefinition::new("is_self_service", ColumnType::Boolean, 36, 1),
        ColumnDefinition::new("is_material_certified", ColumnType::Boolean, 37, 1),
        ColumnDefinition::new("is_remanufactured", ColumnType::Boolean, 38, 1),
        ColumnDefinition::new("is_accessory", ColumnType::Boolean, 39, 1),
        ColumnDefinition::new("quantity_per_unit", ColumnType::SmallInt, 40, 5),
        ColumnDefinition::new("valid_from", ColumnType::Date, 45, 8),
    ],
};

pub static ARTICLE_EAN: TableDefinition = TableDefinition {
    name: "209",
    sql_table: "tecdoc_article_ean",
    reference: false,
    supplier: true,
    columns: &[
        ColumnDefinition::key("supplier_id", ColumnType::Integer, 1, 4),
        ColumnDefinition::key("article_no", ColumnType::String, 5, 22),
        ColumnDefinition::key("ean", ColumnType::String, 27, 13),
    ],
};

static TABLES: [&TableDefinition; 5] = [&COUNTRIES, &LANGUAGES, &DESCRIPTIONS, &ARTICLES, &ARTICLE_EAN];

/// 所有已注册的表定义（按文件名排序）
pub fn all_tables() -> Vec<&'static TableDefinition> {
    let mut tables: Vec<&'static TableDefinition> = TABLES.to_vec();
    tables.sort_by_key(|t| t.name);
    tables
}

/// 按文件名或目标表名查找表定义
pub fn find_table(name: &str) -> Option<&'static TableDefinition> {
    let name = name.trim();
    TABLES
        .iter()
        .copied()
        .find(|t| t.name == name || t.sql_table.eq_ignore_ascii_case(name))
}
