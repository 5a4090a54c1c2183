//! 结果写入服务 - 业务能力层
//!
//! 只负责结果集与 JSON 文件之间的读写，不关心流程

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{AnalyzerError, Result};
use crate::models::ResultSet;

/// 结果写入服务
///
/// 每次保存都整体覆盖目标文件，不与旧结果合并
pub struct ResultWriter {
    output_dir: PathBuf,
}

impl ResultWriter {
    /// 输出到当前目录
    pub fn new() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }

    /// 使用自定义输出目录
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: dir.into(),
        }
    }

    /// 药物对应的默认输出文件
    pub fn default_path(&self, drug_name: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_ecmo_analysis.json", drug_name.to_lowercase()))
    }

    /// 保存结果集，返回实际写入的路径
    pub fn save(&self, results: &ResultSet, drug_name: &str, path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => self.default_path(drug_name),
        };

        let json = serde_json::to_string_pretty(results)?;
        debug!("写入 {} 个字段结果, {} 字节", results.len(), json.len());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AnalyzerError::io(parent.display().to_string(), e))?;
        }
        fs::write(&path, json).map_err(|e| AnalyzerError::io(path.display().to_string(), e))?;

        info!("💾 结果已保存至 {}", path.display());
        Ok(path)
    }

    /// 读取之前保存的结果集
    pub fn load(path: &Path) -> Result<ResultSet> {
        let content = fs::read_to_string(path).map_err(|e| AnalyzerError::io(path.display().to_string(), e))?;
        let results = serde_json::from_str(&content)?;
        Ok(results)
    }
}

impl Default for ResultWriter {
    fn default() -> Self {
        Self::new()
    }
}
