//! # Drug ECMO Analyzer
//!
//! 针对指定药物，向文献问答引擎逐个提出模板化问题，
//! 汇总药物在 ECMO 治疗中各项表现的结构化答案。
//!
//! ## 架构设计
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 外部问答引擎接口 `QaEngine` 及 HTTP 实现
//!
//! ### ② 业务能力层（Services）
//! - `citation_service` - 整理答案与引用
//! - `ResultWriter` - 结果集 JSON 读写
//!
//! ### ③ 流程层（Workflow）
//! - `FieldCtx` - 上下文封装（药物 + 字段序号）
//! - `FieldFlow` - 单字段流程（渲染 → 查询 → 整理）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/analyzer` - 字段注册表与批量查询
//! - `orchestrator/batch_processor` - 一次完整运行
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{Citation, PaperQaClient, QaEngine, QaRequest, QaResponse, QuerySettings};
pub use config::Config;
pub use error::{AnalyzerError, QaError, Result};
pub use models::{FieldDefinition, FieldMetadata, FieldOutcome, FieldRegistry, FieldResult, ResultSet};
pub use orchestrator::{App, BatchPolicy, DrugEcmoAnalyzer};
pub use workflow::{FieldCtx, FieldFlow};
