//! 页面与外部界面之间的消息协议
//!
//! 请求以`action`区分，响应统一为`{success, error?, translatedText?}`。

use serde::{Deserialize, Serialize};

use crate::api_constants::service_config::{DEFAULT_AI_SERVICE, DEFAULT_TARGET_LANG};
use crate::error::TranslationError;

fn default_ai_service() -> String {
    DEFAULT_AI_SERVICE.to_string()
}

fn default_target_language() -> String {
    DEFAULT_TARGET_LANG.to_string()
}

/// 外部界面发来的请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Request {
    /// 翻译整页
    #[serde(rename = "translate", rename_all = "camelCase")]
    Translate {
        #[serde(default = "default_ai_service")]
        ai_service: String,
        #[serde(default)]
        api_key: String,
        #[serde(default = "default_target_language")]
        target_language: String,
        #[serde(default)]
        show_below_mode: bool,
    },
    /// 翻译一段选中文本
    #[serde(rename = "translateSelection", rename_all = "camelCase")]
    TranslateSelection {
        text: String,
        #[serde(default = "default_ai_service")]
        ai_service: String,
        #[serde(default)]
        api_key: String,
        #[serde(default = "default_target_language")]
        target_language: String,
    },
    /// 还原原文
    #[serde(rename = "restore")]
    Restore,
}

/// 返回给外部界面的响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            translated_text: None,
        }
    }

    pub fn translated(text: String) -> Self {
        Self {
            translated_text: Some(text),
            ..Self::ok()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            translated_text: None,
        }
    }
}

impl From<&TranslationError> for Response {
    fn from(error: &TranslationError) -> Self {
        Response::failure(error.user_message())
    }
}
