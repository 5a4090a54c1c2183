/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 优先使用 RUST_LOG，否则按 verbose 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化运行日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `drug_name`: 药物名称
pub fn init_log_file(log_file_path: &str, drug_name: &str) -> Result<()> {
    let log_header = format!(
        "{}\nECMO 药物分析日志 - {} - {}\n{}\n\n",
        "=".repeat(60),
        drug_name,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `drug_name`: 药物名称
/// - `paper_directory`: 文献目录
/// - `field_count`: 待分析字段数
pub fn log_startup(drug_name: &str, paper_directory: &Path, field_count: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - ECMO 药物文献分析");
    info!("💊 药物: {}", drug_name);
    info!("📁 文献目录: {}", paper_directory.display());
    info!("📋 待分析字段: {} 个", field_count);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `output_path`: 结果文件路径
pub fn print_final_stats(success: usize, failed: usize, total: usize, output_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部字段分析完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", output_path.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
