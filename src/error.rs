use thiserror::Error;

/// 分析器错误类型
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// 药物名称或文献目录配置无效
    #[error("配置错误: {0}")]
    Configuration(String),

    /// 请求了注册表中不存在的字段
    #[error("未知字段: {field} (可用字段: {available})")]
    UnknownField { field: String, available: String },

    /// 调用方提供的字段定义不完整
    #[error("字段定义无效 ({field}): {reason}")]
    InvalidFieldDefinition { field: String, reason: String },

    /// 外部问答引擎查询失败
    #[error("字段 {field} 查询失败: {source}")]
    QueryFailed {
        field: String,
        #[source]
        source: QaError,
    },

    /// 批量模式下所有字段都失败
    #[error("所有 {total} 个字段均查询失败")]
    AllFieldsFailed { total: usize },

    /// 结果集 JSON 编解码失败
    #[error("JSON 序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 文件读写失败
    #[error("文件操作失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 字段定义文件解析失败
    #[error("字段定义文件解析失败 ({path}): {source}")]
    FieldFile {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 问答引擎边界上的错误
#[derive(Debug, Error)]
pub enum QaError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// 引擎返回非成功状态码
    #[error("引擎返回错误状态 ({endpoint}): {status}, 内容: {body}")]
    BadStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// 返回数据无法解析
    #[error("引擎返回数据格式错误: {0}")]
    MalformedResponse(String),

    /// 引擎自身报告的错误
    #[error("引擎错误: {0}")]
    Engine(String),
}

// ========== 便捷构造函数 ==========

impl AnalyzerError {
    /// 创建文件操作错误
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        AnalyzerError::Io {
            path: path.into(),
            source,
        }
    }

    /// 创建字段查询失败错误
    pub fn query_failed(field: impl Into<String>, source: QaError) -> Self {
        AnalyzerError::QueryFailed {
            field: field.into(),
            source,
        }
    }

    /// 创建字段定义无效错误
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalyzerError::InvalidFieldDefinition {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 分析器结果类型
pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_failed_carries_field_name() {
        let err = AnalyzerError::query_failed("ECMO dosage", QaError::Engine("rate limited".into()));
        let msg = err.to_string();
        assert!(msg.contains("ECMO dosage"));
        assert!(msg.contains("rate limited"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_unknown_field_lists_available() {
        let err = AnalyzerError::UnknownField {
            field: "Half-life".into(),
            available: "Effect on ECMO, ECMO dosage".into(),
        };
        assert!(err.to_string().contains("Effect on ECMO, ECMO dosage"));
    }
}
