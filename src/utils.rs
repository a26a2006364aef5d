use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::backend::AiService;

/// 初始化日志系统
pub fn init_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // 日志写到stderr，stdout留给翻译结果与会话响应
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// 验证输入文件
pub fn validate_input_file(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("输入文件不存在: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("输入路径不是文件: {}", path.display());
    }

    if let Some(ext) = path.extension() {
        if ext != "html" && ext != "htm" {
            warn!("⚠️  文件扩展名不是HTML: {}", ext.to_string_lossy());
        }
    }

    Ok(())
}

/// 生成输出文件路径
pub fn generate_output_path(input: &Path, output: &Option<PathBuf>, lang: &str) -> PathBuf {
    if let Some(output_path) = output {
        return output_path.clone();
    }

    // 自动生成输出路径: input_Vietnamese.html
    let stem = input.file_stem().unwrap_or_default();
    let extension = input.extension().unwrap_or_default();

    let output_name = format!(
        "{}_{}.{}",
        stem.to_string_lossy(),
        lang.replace(char::is_whitespace, "_"),
        extension.to_string_lossy()
    );

    match input.parent() {
        Some(parent) => parent.join(output_name),
        None => PathBuf::from(output_name),
    }
}

/// 取命令行给出的密钥，缺省时读取服务对应的环境变量
///
/// 返回空字符串表示没有密钥，由后端构造时报告缺少密钥。
pub fn resolve_api_key(service: AiService, explicit: Option<String>) -> String {
    explicit
        .filter(|key| !key.trim().is_empty())
        .or_else(|| std::env::var(service.api_key_env()).ok())
        .unwrap_or_default()
}

/// 解析`service=url`形式的端点覆盖
pub fn parse_endpoint_override(value: &str) -> Result<(AiService, String)> {
    let Some((service, url)) = value.split_once('=') else {
        anyhow::bail!("端点格式应为 service=url: {}", value);
    };

    let service: AiService = service.trim().parse()?;
    let url = url.trim();
    if url.is_empty() {
        anyhow::bail!("端点地址为空: {}", value);
    }

    Ok((service, url.to_string()))
}
