use std::path::PathBuf;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 要分析的药物名称
    pub drug_name: String,
    /// 文献目录（为空时使用 drugs_root/<药物名>）
    pub paper_directory: Option<PathBuf>,
    /// 各药物文献目录的根目录
    pub drugs_root: PathBuf,
    /// 结果 JSON 输出目录
    pub output_dir: PathBuf,
    /// 结果 JSON 文件名（为空时使用 <药物名>_ecmo_analysis.json）
    pub output_file: Option<PathBuf>,
    /// 自定义字段定义 TOML 文件
    pub fields_file: Option<PathBuf>,
    /// 只分析这些字段（为空时分析全部）
    pub selected_fields: Vec<String>,
    /// 单个字段失败时是否继续
    pub continue_on_error: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 运行日志文件
    pub output_log_file: String,
    // --- 问答引擎配置 ---
    pub qa_api_base_url: String,
    pub qa_api_key: Option<String>,
    pub llm_model_name: String,
    pub summary_llm_model_name: String,
    pub llm_temperature: f32,
    /// 请求超时（秒），为空时不限制
    pub qa_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            drug_name: "meropenem".to_string(),
            paper_directory: None,
            drugs_root: PathBuf::from("./drugs"),
            output_dir: PathBuf::from("."),
            output_file: None,
            fields_file: None,
            selected_fields: Vec::new(),
            continue_on_error: true,
            verbose_logging: false,
            output_log_file: "analysis_log.txt".to_string(),
            qa_api_base_url: "http://localhost:8000".to_string(),
            qa_api_key: None,
            llm_model_name: "gpt-4o-mini".to_string(),
            summary_llm_model_name: "gpt-4o-mini".to_string(),
            llm_temperature: 0.1,
            qa_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            drug_name: std::env::var("DRUG_NAME").unwrap_or(default.drug_name),
            paper_directory: std::env::var("PAPER_DIRECTORY").ok().map(PathBuf::from),
            drugs_root: std::env::var("DRUGS_ROOT").map(PathBuf::from).unwrap_or(default.drugs_root),
            output_dir: std::env::var("OUTPUT_DIR").map(PathBuf::from).unwrap_or(default.output_dir),
            output_file: std::env::var("OUTPUT_FILE").ok().map(PathBuf::from),
            fields_file: std::env::var("FIELDS_FILE").ok().map(PathBuf::from),
            selected_fields: std::env::var("FIELDS").map(|v| parse_field_list(&v)).unwrap_or(default.selected_fields),
            continue_on_error: std::env::var("CONTINUE_ON_ERROR").ok().and_then(|v| v.parse().ok()).unwrap_or(default.continue_on_error),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            qa_api_base_url: std::env::var("QA_API_BASE_URL").unwrap_or(default.qa_api_base_url),
            qa_api_key: std::env::var("QA_API_KEY").ok().filter(|v| !v.is_empty()),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            summary_llm_model_name: std::env::var("SUMMARY_LLM_MODEL_NAME").unwrap_or(default.summary_llm_model_name),
            llm_temperature: std::env::var("LLM_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_temperature),
            qa_timeout_secs: std::env::var("QA_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()),
        }
    }
}

/// 解析逗号分隔的字段列表
///
/// 字段名本身可能含有空格（如 "ECMO dosage"），只按逗号切分
pub fn parse_field_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
