//! 批量字段处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次完整分析运行的资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写运行日志头、创建问答引擎客户端和分析器
//! 2. **字段加载**：合并自定义字段定义文件
//! 3. **顺序执行**：逐个字段查询，不并发
//! 4. **结果保存**：写出 JSON 结果集
//! 5. **全局统计**：汇总成功与失败字段数

use crate::clients::{PaperQaClient, QaEngine};
use crate::config::Config;
use crate::models::{merge_field_file, ResultSet};
use crate::orchestrator::analyzer::DrugEcmoAnalyzer;
use crate::utils::logging::{init_log_file, log_startup, print_final_stats, truncate_text};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    analyzer: DrugEcmoAnalyzer,
}

impl App {
    /// 使用 HTTP 问答引擎初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let engine = PaperQaClient::new(&config).context("创建问答引擎客户端失败")?;
        Self::with_engine(config, Arc::new(engine)).await
    }

    /// 使用指定的问答引擎初始化应用
    pub async fn with_engine(config: Config, engine: Arc<dyn QaEngine>) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file, &config.drug_name)?;

        let mut analyzer = DrugEcmoAnalyzer::from_config(&config, engine)?;

        if let Some(fields_file) = &config.fields_file {
            let mut registry = analyzer.registry().clone();
            let count = merge_field_file(&mut registry, fields_file)
                .await
                .with_context(|| format!("加载字段定义文件失败: {}", fields_file.display()))?;
            info!("✓ 合并了 {} 个自定义字段", count);
            analyzer = analyzer.with_registry(registry);
        }

        let field_count = if config.selected_fields.is_empty() {
            analyzer.registry().len()
        } else {
            config.selected_fields.len()
        };
        log_startup(analyzer.drug_name(), analyzer.paper_directory(), field_count);

        Ok(Self { config, analyzer })
    }

    pub fn analyzer(&self) -> &DrugEcmoAnalyzer {
        &self.analyzer
    }

    /// 运行应用主逻辑，返回结果文件路径
    pub async fn run(&self) -> Result<PathBuf> {
        let results = if self.config.selected_fields.is_empty() {
            self.analyzer.analyze_all_fields().await?
        } else {
            info!("📋 只分析指定字段: {}", self.config.selected_fields.join(", "));
            self.analyzer.analyze_fields(self.config.selected_fields.as_slice()).await?
        };

        let output_path = self
            .analyzer
            .save_results(&results, self.config.output_file.as_deref())?;

        log_summary(&results);
        print_final_stats(
            results.success_count(),
            results.failure_count(),
            results.len(),
            &output_path,
        );

        Ok(output_path)
    }
}

/// 输出每个字段的答案预览
fn log_summary(results: &ResultSet) {
    info!("\n{}", "─".repeat(60));
    info!("📄 分析结果摘要");
    for (name, outcome) in results.iter() {
        match outcome.as_result() {
            Some(result) => info!("  {}: {}", name, truncate_text(&result.answer, 100)),
            None => warn!("  {}: ❌ {}", name, outcome.error().unwrap_or_default()),
        }
    }
    info!("{}", "─".repeat(60));
}
