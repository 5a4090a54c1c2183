//! 字段查询编排器 - 编排层
//!
//! ## 职责
//!
//! 持有一个药物的分析请求（药物名称 + 文献目录）和字段注册表，
//! 逐个字段渲染问题、查询引擎并汇总结果集。
//!
//! ## 失败策略
//!
//! - 单字段模式：错误直接返回给调用方
//! - 批量模式：默认在该字段的槽位写入失败记录并继续；
//!   全部字段都失败时才整体失败

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::clients::{QaEngine, QuerySettings};
use crate::config::Config;
use crate::error::{AnalyzerError, Result};
use crate::models::{FieldDefinition, FieldOutcome, FieldRegistry, FieldResult, ResultSet};
use crate::services::ResultWriter;
use crate::workflow::{FieldCtx, FieldFlow};

/// 批量模式下单个字段失败时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// 写入失败记录并继续
    #[default]
    ContinueOnError,
    /// 遇到第一个失败立即返回
    AbortOnError,
}

/// 药物 ECMO 文献分析器
pub struct DrugEcmoAnalyzer {
    drug_name: String,
    paper_directory: PathBuf,
    registry: FieldRegistry,
    engine: Arc<dyn QaEngine>,
    settings: QuerySettings,
    policy: BatchPolicy,
    writer: ResultWriter,
    verbose_logging: bool,
}

impl DrugEcmoAnalyzer {
    /// 创建分析器
    ///
    /// 未指定文献目录时使用 `./drugs/<药物名小写>`
    pub fn new(
        drug_name: impl Into<String>,
        paper_directory: Option<PathBuf>,
        engine: Arc<dyn QaEngine>,
    ) -> Result<Self> {
        let drug_name = drug_name.into().trim().to_string();
        if drug_name.is_empty() {
            return Err(AnalyzerError::Configuration("药物名称不能为空".to_string()));
        }

        let paper_directory =
            paper_directory.unwrap_or_else(|| default_paper_directory(Path::new("./drugs"), &drug_name));
        check_paper_directory(&paper_directory)?;

        Ok(Self {
            drug_name,
            paper_directory,
            registry: FieldRegistry::ecmo_defaults(),
            engine,
            settings: QuerySettings::default(),
            policy: BatchPolicy::default(),
            writer: ResultWriter::new(),
            verbose_logging: false,
        })
    }

    /// 按配置创建分析器
    pub fn from_config(config: &Config, engine: Arc<dyn QaEngine>) -> Result<Self> {
        let paper_directory = config
            .paper_directory
            .clone()
            .unwrap_or_else(|| default_paper_directory(&config.drugs_root, config.drug_name.trim()));

        let policy = if config.continue_on_error {
            BatchPolicy::ContinueOnError
        } else {
            BatchPolicy::AbortOnError
        };

        let mut analyzer = Self::new(&config.drug_name, Some(paper_directory), engine)?
            .with_settings(QuerySettings::from_config(config))
            .with_policy(policy)
            .with_output_dir(&config.output_dir);
        analyzer.verbose_logging = config.verbose_logging;

        Ok(analyzer)
    }

    /// 替换整个字段注册表
    pub fn with_registry(mut self, registry: FieldRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_settings(mut self, settings: QuerySettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.writer = ResultWriter::with_dir(dir);
        self
    }

    pub fn drug_name(&self) -> &str {
        &self.drug_name
    }

    pub fn paper_directory(&self) -> &Path {
        &self.paper_directory
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn field_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// 新增或覆盖一个字段定义
    ///
    /// `name`、`question_template`、`answer_structure`、`system_prompt_template`
    /// 都不能为空，且 `question_template` 必须包含 `{drug_name}` 占位符，
    /// 否则返回 [`AnalyzerError::InvalidFieldDefinition`]，注册表保持不变。
    /// 同名字段被覆盖时保留原来的位置。
    pub fn set_field_definition(&mut self, definition: FieldDefinition) -> Result<()> {
        let name = definition.name.clone();
        if self.registry.insert(definition)?.is_some() {
            info!("字段定义已覆盖: {}", name);
        }
        Ok(())
    }

    /// 删除字段定义
    pub fn remove_field(&mut self, field_name: &str) -> Option<FieldDefinition> {
        self.registry.remove(field_name)
    }

    /// 分析单个字段
    pub async fn analyze_field(&self, field_name: &str) -> Result<FieldResult> {
        let field = self.lookup(field_name)?;
        let ctx = FieldCtx::new(&self.drug_name, field_name, 1, 1);
        self.flow().run(field, &ctx).await
    }

    /// 按注册顺序分析全部字段
    pub async fn analyze_all_fields(&self) -> Result<ResultSet> {
        let fields: Vec<&FieldDefinition> = self.registry.iter().collect();
        self.run_batch(&fields).await
    }

    /// 按给定顺序分析部分字段
    ///
    /// 任何字段名未注册时，在发起查询前就返回错误
    pub async fn analyze_fields<S: AsRef<str>>(&self, field_names: &[S]) -> Result<ResultSet> {
        let fields = field_names
            .iter()
            .map(|name| self.lookup(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.run_batch(&fields).await
    }

    /// 保存结果集，返回写入的路径
    pub fn save_results(&self, results: &ResultSet, path: Option<&Path>) -> Result<PathBuf> {
        self.writer.save(results, &self.drug_name, path)
    }

    /// 读取之前保存的结果集
    pub fn load_results(path: &Path) -> Result<ResultSet> {
        ResultWriter::load(path)
    }

    fn lookup(&self, field_name: &str) -> Result<&FieldDefinition> {
        self.registry
            .get(field_name)
            .ok_or_else(|| AnalyzerError::UnknownField {
                field: field_name.to_string(),
                available: self.registry.names().join(", "),
            })
    }

    fn flow(&self) -> FieldFlow {
        FieldFlow::new(
            Arc::clone(&self.engine),
            self.paper_directory.clone(),
            self.settings.clone(),
        )
        .verbose(self.verbose_logging)
    }

    async fn run_batch(&self, fields: &[&FieldDefinition]) -> Result<ResultSet> {
        let flow = self.flow();
        let total = fields.len();
        let mut results = ResultSet::new();

        for (idx, field) in fields.iter().enumerate() {
            let ctx = FieldCtx::new(&self.drug_name, &field.name, idx + 1, total);

            match flow.run(field, &ctx).await {
                Ok(result) => results.insert(&field.name, result),
                Err(e) => match self.policy {
                    BatchPolicy::AbortOnError => return Err(e),
                    BatchPolicy::ContinueOnError => {
                        warn!("{} ⚠️ 已记录失败并继续", ctx);
                        results.insert(&field.name, FieldOutcome::failure(e.to_string()));
                    }
                },
            }
        }

        if total > 0 && results.success_count() == 0 {
            error!("❌ {} 的所有 {} 个字段均查询失败", self.drug_name, total);
            return Err(AnalyzerError::AllFieldsFailed { total });
        }

        Ok(results)
    }
}

/// 药物的默认文献目录
pub fn default_paper_directory(drugs_root: &Path, drug_name: &str) -> PathBuf {
    drugs_root.join(drug_name.to_lowercase())
}

/// 检查文献目录存在且至少有一个 PDF
fn check_paper_directory(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(AnalyzerError::Configuration(format!(
            "文献目录不存在: {}",
            dir.display()
        )));
    }

    let entries = std::fs::read_dir(dir)
        .map_err(|e| AnalyzerError::Configuration(format!("无法读取文献目录 {}: {}", dir.display(), e)))?;

    let has_pdf = entries.filter_map(|entry| entry.ok()).any(|entry| {
        let path = entry.path();
        path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    });

    if !has_pdf {
        return Err(AnalyzerError::Configuration(format!(
            "文献目录中没有 PDF 文件: {}",
            dir.display()
        )));
    }

    Ok(())
}
