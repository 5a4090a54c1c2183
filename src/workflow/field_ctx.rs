//! 字段查询上下文
//!
//! 封装"我正在为哪个药物查询第几个字段"这一信息

use std::fmt::Display;

/// 字段查询上下文
#[derive(Debug, Clone)]
pub struct FieldCtx {
    /// 药物名称
    pub drug_name: String,

    /// 字段名称
    pub field_name: String,

    /// 字段在本次运行中的序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 本次运行的字段总数
    pub total: usize,
}

impl FieldCtx {
    pub fn new(drug_name: impl Into<String>, field_name: impl Into<String>, index: usize, total: usize) -> Self {
        Self {
            drug_name: drug_name.into(),
            field_name: field_name.into(),
            index,
            total,
        }
    }
}

impl Display for FieldCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} {}/{} {}]", self.drug_name, self.index, self.total, self.field_name)
    }
}
