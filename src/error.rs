//! 统一错误处理模块
//!
//! 提供整页翻译、划词翻译与还原操作的统一错误类型定义

// 标准库导入
use std::fmt;

/// 缺少API密钥时使用的配置项名称
pub const API_KEY_FIELD: &str = "apiKey";

/// 翻译流水线统一错误类型
///
/// 覆盖文本收集、后端调用、还原以及CLI外围的全部失败情形
#[derive(Debug)]
pub enum TranslationError {
    /// 页面中没有可翻译的文本节点
    NoContent,

    /// 在任何翻译之前请求还原
    NoSnapshot,

    /// 翻译后端错误（传输失败、非2xx响应或响应格式不符）
    Backend {
        /// HTTP状态码（传输层失败时为空）
        status: Option<u16>,
        /// 错误消息，优先取自服务商响应中的错误字段
        message: String,
    },

    /// HTML解析相关错误
    HtmlParse {
        /// 具体错误信息
        details: String,
    },

    /// 文件操作相关错误
    FileOperation {
        /// 文件路径
        path: String,
        /// 操作类型（读取、写入等）
        operation: String,
        /// 底层错误信息
        source: String,
    },

    /// 配置相关错误
    Configuration {
        /// 配置项名称
        field: String,
        /// 错误原因
        reason: String,
    },
}

impl TranslationError {
    /// 面向用户展示的原始消息
    ///
    /// 后端错误直接返回服务商给出的消息，缺少API密钥时只返回提示本身，其余错误与`Display`一致。
    pub fn user_message(&self) -> String {
        match self {
            TranslationError::Backend { message, .. } => message.clone(),
            TranslationError::Configuration { field, reason } if field == API_KEY_FIELD => {
                reason.clone()
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationError::NoContent => {
                write!(f, "页面中没有找到可翻译的文本")
            }
            TranslationError::NoSnapshot => {
                write!(f, "没有可还原的原文，请先翻译页面")
            }
            TranslationError::Backend { status, message } => {
                if let Some(code) = status {
                    write!(f, "翻译API错误 [{}]: {}", code, message)
                } else {
                    write!(f, "翻译API错误: {}", message)
                }
            }
            TranslationError::HtmlParse { details } => {
                write!(f, "HTML解析失败: {}", details)
            }
            TranslationError::FileOperation { path, operation, source } => {
                write!(f, "文件{}操作失败 [{}]: {}", operation, path, source)
            }
            TranslationError::Configuration { field, reason } => {
                write!(f, "配置错误 [{}]: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for TranslationError {}

/// 翻译流水线结果类型别名
pub type Result<T> = std::result::Result<T, TranslationError>;

/// 便捷的错误创建宏
#[macro_export]
macro_rules! translation_error {
    (backend, $msg:expr) => {
        $crate::error::TranslationError::Backend {
            status: None,
            message: $msg.to_string(),
        }
    };
    (backend, $msg:expr, $code:expr) => {
        $crate::error::TranslationError::Backend {
            status: Some($code),
            message: $msg.to_string(),
        }
    };
    (html_parse, $details:expr) => {
        $crate::error::TranslationError::HtmlParse {
            details: $details.to_string(),
        }
    };
    (file_op, $path:expr, $op:expr, $source:expr) => {
        $crate::error::TranslationError::FileOperation {
            path: $path.to_string(),
            operation: $op.to_string(),
            source: $source.to_string(),
        }
    };
    (config, $field:expr, $reason:expr) => {
        $crate::error::TranslationError::Configuration {
            field: $field.to_string(),
            reason: $reason.to_string(),
        }
    };
}

/// 从reqwest::Error转换为TranslationError
impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        let status = error.status().map(|s| s.as_u16());
        TranslationError::Backend {
            status,
            message: error.to_string(),
        }
    }
}
