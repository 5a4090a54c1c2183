//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `analyzer` - 字段查询编排器
//! - 持有药物名称、文献目录和字段注册表
//! - 单字段 / 部分字段 / 全部字段查询
//! - 批量模式下的失败策略
//! - 保存与读取结果集
//!
//! ### `batch_processor` - 一次完整运行
//! - 从配置创建问答引擎与分析器
//! - 合并自定义字段定义
//! - 执行、保存并输出统计
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (一次运行)
//!     ↓
//! analyzer (处理字段注册表)
//!     ↓
//! workflow::FieldFlow (处理单个字段)
//!     ↓
//! services (能力层：引用整理 / 结果写入)
//!     ↓
//! clients (问答引擎)
//! ```

pub mod analyzer;
pub mod batch_processor;

// 重新导出主要类型
pub use analyzer::{default_paper_directory, BatchPolicy, DrugEcmoAnalyzer};
pub use batch_processor::App;
