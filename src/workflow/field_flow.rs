//! 字段查询流程 - 流程层
//!
//! 核心职责：定义"一个字段"的完整查询流程
//!
//! 流程顺序：
//! 1. 用药物名称渲染问题与系统提示词
//! 2. 向问答引擎发起一次查询
//! 3. 整理答案与引用

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clients::{QaEngine, QaRequest, QuerySettings};
use crate::error::{AnalyzerError, Result};
use crate::models::{FieldDefinition, FieldResult};
use crate::services::normalize_response;
use crate::utils::logging::truncate_text;
use crate::workflow::field_ctx::FieldCtx;

/// 字段查询流程
///
/// - 不持有字段注册表
/// - 每次 run 只发起一次外部查询
/// - 失败时附带字段名返回，不重试
pub struct FieldFlow {
    engine: Arc<dyn QaEngine>,
    corpus_location: PathBuf,
    settings: QuerySettings,
    verbose_logging: bool,
}

impl FieldFlow {
    pub fn new(engine: Arc<dyn QaEngine>, corpus_location: PathBuf, settings: QuerySettings) -> Self {
        Self {
            engine,
            corpus_location,
            settings,
            verbose_logging: false,
        }
    }

    pub fn verbose(mut self, verbose_logging: bool) -> Self {
        self.verbose_logging = verbose_logging;
        self
    }

    /// 构建发送给引擎的请求
    pub fn build_request(&self, field: &FieldDefinition, drug_name: &str) -> QaRequest {
        QaRequest {
            question: field.render_question(drug_name),
            system_prompt: field.render_system_prompt(drug_name),
            corpus_location: self.corpus_location.clone(),
            settings: self.settings.clone(),
        }
    }

    pub async fn run(&self, field: &FieldDefinition, ctx: &FieldCtx) -> Result<FieldResult> {
        let request = self.build_request(field, &ctx.drug_name);

        info!("{} 🔍 正在查询...", ctx);
        if self.verbose_logging {
            info!("{} 问题: {}", ctx, request.question);
        }
        debug!("{} 系统提示词: {}", ctx, truncate_text(&request.system_prompt, 80));

        let response = self.engine.query(&request).await.map_err(|e| {
            warn!("{} ❌ 查询失败: {}", ctx, e);
            AnalyzerError::query_failed(&ctx.field_name, e)
        })?;

        let result = normalize_response(&response);
        info!("{} ✓ 答案: {}", ctx, truncate_text(&result.answer, 100));

        Ok(result)
    }
}
