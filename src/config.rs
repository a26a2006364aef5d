//! 配置管理模块
//!
//! 提供CLI参数解析和翻译运行时配置管理功能

// 标准库导入
use std::collections::HashMap;
use std::path::PathBuf;

// 第三方crate导入
use clap::{Args, Parser, Subcommand};

// 本地模块导入
use crate::api_constants::service_config;
use crate::backend::AiService;

/// 还原时如何处理下方译文元素
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestorePolicy {
    /// 只写回原文，保留下方译文元素
    #[default]
    KeepOverlays,
    /// 上一次翻译为下方显示模式时，一并移除下方译文元素
    RemoveOverlays,
}

/// 翻译运行时配置
///
/// 支持Builder模式进行链式配置。
///
/// # Examples
///
/// ```rust
/// use translation_cli::config::TranslatorConfig;
///
/// let config = TranslatorConfig::new()
///     .with_max_chunk_chars(1500)
///     .with_concurrency(3);
/// assert_eq!(config.concurrency(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    /// 单个分块的最大字符数
    max_chunk_chars: usize,
    /// 每个窗口内并发的分块数
    concurrency: usize,
    /// 生成温度
    temperature: f32,
    /// 最大输出token数
    max_output_tokens: u32,
    /// 单次请求超时（秒）
    request_timeout_secs: u64,
    /// 还原策略
    restore_policy: RestorePolicy,
    /// 自定义接口地址
    endpoints: HashMap<AiService, String>,
}

impl TranslatorConfig {
    /// 创建新的配置实例
    ///
    /// 默认值：分块2000字符、并发5、温度0.3、输出上限2048 token、超时30秒、还原时保留下方译文。
    pub fn new() -> Self {
        Self {
            max_chunk_chars: service_config::MAX_CHUNK_CHARS,
            concurrency: service_config::DEFAULT_CONCURRENCY,
            temperature: service_config::TEMPERATURE,
            max_output_tokens: service_config::MAX_OUTPUT_TOKENS,
            request_timeout_secs: service_config::REQUEST_TIMEOUT_SECONDS,
            restore_policy: RestorePolicy::default(),
            endpoints: HashMap::new(),
        }
    }

    pub fn max_chunk_chars(&self) -> usize {
        self.max_chunk_chars
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
    }

    pub fn restore_policy(&self) -> RestorePolicy {
        self.restore_policy
    }

    /// 获取服务的接口地址，未自定义时使用默认地址
    pub fn endpoint_for(&self, service: AiService) -> &str {
        self.endpoints
            .get(&service)
            .map(String::as_str)
            .unwrap_or_else(|| service.default_endpoint())
    }

    /// 设置单个分块的最大字符数（至少为1）
    pub fn with_max_chunk_chars(mut self, chars: usize) -> Self {
        self.max_chunk_chars = chars.max(1);
        self
    }

    /// 设置并发数量（至少为1）
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn with_restore_policy(mut self, policy: RestorePolicy) -> Self {
        self.restore_policy = policy;
        self
    }

    /// 自定义服务的接口地址（代理或测试服务器）
    pub fn with_endpoint(mut self, service: AiService, url: &str) -> Self {
        self.endpoints.insert(service, url.to_string());
        self
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// CLI参数结构
#[derive(Parser)]
#[command(author, version, about = "AI网页翻译CLI工具 - 分块并发翻译HTML页面，支持原位替换、下方显示与还原", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// 详细输出模式
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 静默模式 (仅输出错误)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// 翻译整个HTML页面
    Translate(TranslateArgs),
    /// 翻译一段选中的文本
    Text(TextArgs),
    /// 从标准输入逐行读取JSON请求，在同一页面上执行翻译/还原
    Session(SessionArgs),
}

/// AI服务相关参数
#[derive(Args, Clone)]
pub struct ServiceArgs {
    /// AI服务 (gemini, perplexity, chatgpt, grok)
    #[arg(short, long, default_value = service_config::DEFAULT_AI_SERVICE)]
    pub service: String,

    /// API密钥 (未提供时读取对应服务的环境变量)
    #[arg(short = 'k', long)]
    pub api_key: Option<String>,

    /// 目标语言
    #[arg(short, long, default_value = service_config::DEFAULT_TARGET_LANG)]
    pub lang: String,

    /// 自定义接口地址
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// 请求超时时间（秒）
    #[arg(long, default_value_t = service_config::REQUEST_TIMEOUT_SECONDS)]
    pub timeout: u64,

    /// 生成温度
    #[arg(long, default_value_t = service_config::TEMPERATURE)]
    pub temperature: f32,

    /// 最大输出token数
    #[arg(long, default_value_t = service_config::MAX_OUTPUT_TOKENS)]
    pub max_output_tokens: u32,
}

impl ServiceArgs {
    /// 把服务参数应用到配置上；`--endpoint`只作用于所选服务
    pub fn apply(&self, config: TranslatorConfig, service: AiService) -> TranslatorConfig {
        let config = config
            .with_request_timeout_secs(self.timeout)
            .with_temperature(self.temperature)
            .with_max_output_tokens(self.max_output_tokens);

        match &self.endpoint {
            Some(endpoint) => config.with_endpoint(service, endpoint),
            None => config,
        }
    }
}

/// 页面流水线相关参数
#[derive(Args, Clone)]
pub struct PipelineArgs {
    /// 单个分块的最大字符数
    #[arg(long, default_value_t = service_config::MAX_CHUNK_CHARS)]
    pub max_chunk_chars: usize,

    /// 并发请求数量
    #[arg(long, default_value_t = service_config::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// 还原时同时移除下方译文元素
    #[arg(long)]
    pub clear_overlays_on_restore: bool,
}

#[derive(Args)]
pub struct TranslateArgs {
    /// 输入HTML文件路径
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// 输出文件路径 (可选，默认为输入文件名+语言代码)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// 在原文下方显示译文，而不是替换原文
    #[arg(long)]
    pub overlay: bool,

    /// 显示性能统计
    #[arg(long)]
    pub stats: bool,

    #[command(flatten)]
    pub service: ServiceArgs,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Args)]
pub struct TextArgs {
    /// 待翻译的文本
    pub text: String,

    #[command(flatten)]
    pub service: ServiceArgs,
}

#[derive(Args)]
pub struct SessionArgs {
    /// 输入HTML文件路径
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// 会话结束后写出的HTML文件 (可选，默认为输入文件名+session)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// 自定义接口地址，格式 service=url，可重复
    #[arg(long = "endpoint", value_name = "SERVICE=URL")]
    pub endpoints: Vec<String>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

impl PipelineArgs {
    /// 把流水线参数应用到配置上
    pub fn apply(&self, config: TranslatorConfig) -> TranslatorConfig {
        let policy = if self.clear_overlays_on_restore {
            RestorePolicy::RemoveOverlays
        } else {
            RestorePolicy::KeepOverlays
        };

        config
            .with_max_chunk_chars(self.max_chunk_chars)
            .with_concurrency(self.concurrency)
            .with_restore_policy(policy)
    }
}
