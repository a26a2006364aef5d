//! 翻译后端
//!
//! 四个AI服务共用同一套提示词与调用约定，差异只在接口地址、请求体结构、
//! 鉴权请求头以及译文所在的JSON路径。

// 标准库导入
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

// 第三方crate导入
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

// 本地模块导入
use crate::api_constants::{api_config, error_messages, prompt};
use crate::config::TranslatorConfig;
use crate::error::{Result, TranslationError, API_KEY_FIELD};
use crate::translation_error;

/// 翻译能力：把文本翻译成目标语言
pub trait TranslationBackend {
    /// 后端名称，用于日志
    fn name(&self) -> &str;

    /// 翻译文本；返回的译文已去除首尾空白
    fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// 支持的AI服务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiService {
    Gemini,
    Perplexity,
    ChatGpt,
    Grok,
}

impl AiService {
    pub const ALL: [AiService; 4] = [
        AiService::Gemini,
        AiService::Perplexity,
        AiService::ChatGpt,
        AiService::Grok,
    ];

    /// 服务标识（与消息协议中的`aiService`一致）
    pub fn as_str(&self) -> &'static str {
        match self {
            AiService::Gemini => "gemini",
            AiService::Perplexity => "perplexity",
            AiService::ChatGpt => "chatgpt",
            AiService::Grok => "grok",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            AiService::Gemini => api_config::GEMINI_API_URL,
            AiService::Perplexity => api_config::PERPLEXITY_API_URL,
            AiService::ChatGpt => api_config::CHATGPT_API_URL,
            AiService::Grok => api_config::GROK_API_URL,
        }
    }

    /// 对话类接口使用的模型；Gemini的模型写在URL中
    pub fn model(&self) -> Option<&'static str> {
        match self {
            AiService::Gemini => None,
            AiService::Perplexity => Some(api_config::PERPLEXITY_MODEL),
            AiService::ChatGpt => Some(api_config::CHATGPT_MODEL),
            AiService::Grok => Some(api_config::GROK_MODEL),
        }
    }

    /// 读取API密钥的环境变量名
    pub fn api_key_env(&self) -> &'static str {
        match self {
            AiService::Gemini => "GEMINI_API_KEY",
            AiService::Perplexity => "PERPLEXITY_API_KEY",
            AiService::ChatGpt => "OPENAI_API_KEY",
            AiService::Grok => "XAI_API_KEY",
        }
    }

    /// 译文在成功响应中的JSON路径
    fn success_pointer(&self) -> &'static str {
        match self {
            AiService::Gemini => "/candidates/0/content/parts/0/text",
            _ => "/choices/0/message/content",
        }
    }
}

impl fmt::Display for AiService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiService {
    type Err = TranslationError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(AiService::Gemini),
            "perplexity" => Ok(AiService::Perplexity),
            "chatgpt" | "openai" => Ok(AiService::ChatGpt),
            "grok" | "xai" => Ok(AiService::Grok),
            other => Err(translation_error!(
                config,
                "aiService",
                format!("不支持的AI服务: {}", other)
            )),
        }
    }
}

/// 基于HTTP的AI翻译后端
#[derive(Debug, Clone)]
pub struct AiBackend {
    service: AiService,
    api_key: String,
    endpoint: String,
    temperature: f32,
    max_output_tokens: u32,
    client: Client,
}

impl AiBackend {
    /// 按配置创建后端；API密钥为空时返回配置错误
    pub fn new(service: AiService, api_key: &str, config: &TranslatorConfig) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(translation_error!(
                config,
                API_KEY_FIELD,
                error_messages::MISSING_API_KEY
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs()))
            .build()
            .map_err(|e| translation_error!(config, "httpClient", e))?;

        Ok(Self {
            service,
            api_key: api_key.to_string(),
            endpoint: config.endpoint_for(service).to_string(),
            temperature: config.temperature(),
            max_output_tokens: config.max_output_tokens(),
            client,
        })
    }

    pub fn service(&self) -> AiService {
        self.service
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 构造请求体
    pub fn build_request_body(&self, text: &str, target_language: &str) -> Value {
        let system_prompt = prompt::system_prompt(target_language);

        match self.service.model() {
            None => json!({
                "contents": [{
                    "parts": [{
                        "text": format!("{}\n\n{}{}", system_prompt, prompt::TEXT_PREFIX, text)
                    }]
                }],
                "generationConfig": {
                    "temperature": self.temperature,
                    "maxOutputTokens": self.max_output_tokens
                }
            }),
            Some(model) => json!({
                "model": model,
                "messages": [
                    { "role": "system", "content": system_prompt },
                    { "role": "user", "content": format!("{}{}", prompt::TEXT_PREFIX, text) }
                ],
                "temperature": self.temperature,
                "max_tokens": self.max_output_tokens
            }),
        }
    }

    async fn send(&self, text: &str, target_language: &str) -> Result<String> {
        let request = self
            .client
            .post(&self.endpoint)
            .json(&self.build_request_body(text, target_language));

        let request = match self.service {
            AiService::Gemini => request.header(api_config::GEMINI_KEY_HEADER, &self.api_key),
            _ => request.bearer_auth(&self.api_key),
        };

        let response = request.send().await?;
        let status = response.status();
        let response_text = response.text().await?;
        let payload = serde_json::from_str::<Value>(&response_text).ok();

        if !status.is_success() {
            let message = extract_error_message(payload.as_ref(), status.as_u16());
            return Err(translation_error!(backend, message, status.as_u16()));
        }

        payload
            .as_ref()
            .and_then(|value| extract_translation(self.service, value))
            .ok_or_else(|| {
                translation_error!(backend, error_messages::INVALID_RESPONSE, status.as_u16())
            })
    }
}

impl TranslationBackend for AiBackend {
    fn name(&self) -> &str {
        self.service.as_str()
    }

    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        debug!(
            "🌐 {} 请求翻译: {} 字符 -> {}",
            self.service,
            text.chars().count(),
            target_language
        );

        let result = self.send(text, target_language).await;
        if let Err(e) = &result {
            warn!("❌ {} 翻译失败: {}", self.service, e);
        }
        result
    }
}

/// 从成功响应中提取译文
pub fn extract_translation(service: AiService, payload: &Value) -> Option<String> {
    payload
        .pointer(service.success_pointer())
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// 从错误响应中提取错误消息
///
/// 依次尝试`error.message`、字符串形式的`error`、`detail`，都没有时返回`API error: <状态码>`。
pub fn extract_error_message(payload: Option<&Value>, status: u16) -> String {
    payload
        .and_then(|value| {
            value
                .pointer("/error/message")
                .or_else(|| value.get("error").filter(|e| e.is_string()))
                .or_else(|| value.get("detail"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("API error: {}", status))
}
