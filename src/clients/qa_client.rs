/// 文献问答引擎客户端
///
/// 封装与外部检索增强问答服务的交互；检索、摘要与答案生成均由引擎完成
use crate::config::Config;
use crate::error::QaError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// 引擎查询参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySettings {
    pub llm: String,
    pub summary_llm: String,
    pub temperature: f32,
    /// 要求引擎以 JSON 形式组织证据
    pub use_json: bool,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            llm: "gpt-4o-mini".to_string(),
            summary_llm: "gpt-4o-mini".to_string(),
            temperature: 0.1,
            use_json: true,
        }
    }
}

impl QuerySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            llm: config.llm_model_name.clone(),
            summary_llm: config.summary_llm_model_name.clone(),
            temperature: config.llm_temperature,
            use_json: true,
        }
    }
}

/// 单次查询请求
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QaRequest {
    pub question: String,
    pub system_prompt: String,
    pub corpus_location: PathBuf,
    pub settings: QuerySettings,
}

/// 引擎返回的一条引用
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// 原文片段
    #[serde(default)]
    pub quote: String,
    /// 文献出处
    #[serde(default)]
    pub source: String,
    /// 研究质量说明
    #[serde(default)]
    pub quality_notes: String,
}

/// 引擎返回的答案
///
/// 除 answer 外的字段都可能缺失
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaResponse {
    pub answer: String,
    #[serde(default)]
    pub formatted_answer: Option<String>,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

impl QaResponse {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            ..Default::default()
        }
    }

    pub fn with_citation(mut self, citation: Citation) -> Self {
        self.citations.push(citation);
        self
    }
}

/// 问答引擎接口
///
/// 每次调用对应一次外部查询，不做缓存、不做重试
#[async_trait]
pub trait QaEngine: Send + Sync {
    async fn query(&self, request: &QaRequest) -> Result<QaResponse, QaError>;
}

/// 引擎错误响应体
#[derive(Debug, Deserialize)]
struct EngineErrorBody {
    error: String,
}

/// paper-qa 风格 HTTP 服务客户端
pub struct PaperQaClient {
    http: reqwest::Client,
    api_base_url: String,
    api_key: Option<String>,
}

impl PaperQaClient {
    /// 创建新的问答客户端
    pub fn new(config: &Config) -> Result<Self, QaError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.qa_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(|e| QaError::Request {
            endpoint: config.qa_api_base_url.clone(),
            source: e,
        })?;

        Ok(Self {
            http,
            api_base_url: config.qa_api_base_url.trim_end_matches('/').to_string(),
            api_key: config.qa_api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/query", self.api_base_url)
    }
}

#[async_trait]
impl QaEngine for PaperQaClient {
    async fn query(&self, request: &QaRequest) -> Result<QaResponse, QaError> {
        let endpoint = self.endpoint();
        debug!("正在调用问答引擎: {}, 模型: {}", endpoint, request.settings.llm);
        debug!("问题: {}", request.question);

        let mut builder = self.http.post(&endpoint).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            warn!("问答引擎调用失败: {}", e);
            QaError::Request {
                endpoint: endpoint.clone(),
                source: e,
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| QaError::Request {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        if !status.is_success() {
            warn!("问答引擎返回错误状态: {}", status);
            return Err(QaError::BadStatus {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        debug!("问答引擎调用成功");
        parse_engine_body(&body)
    }
}

/// 解析引擎返回的 JSON
///
/// 引擎可能在 200 响应中以 `{"error": ...}` 报告失败；
/// 只要带有 answer 就按正常答案处理
fn parse_engine_body(body: &str) -> Result<QaResponse, QaError> {
    let parse_err = match serde_json::from_str::<QaResponse>(body) {
        Ok(response) => return Ok(response),
        Err(e) => e,
    };

    match serde_json::from_str::<EngineErrorBody>(body) {
        Ok(err) => Err(QaError::Engine(err.error)),
        Err(_) => Err(QaError::MalformedResponse(parse_err.to_string())),
    }
}
