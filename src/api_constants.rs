/// 翻译API配置常量
///
/// 该文件定义了所有翻译服务相关的常量配置，方便统一管理和维护

/// 各AI服务的接口地址与模型
pub mod api_config {
    /// Gemini 接口地址（模型名包含在URL中）
    pub const GEMINI_API_URL: &str =
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

    /// Perplexity 接口地址
    pub const PERPLEXITY_API_URL: &str = "https://api.perplexity.ai/chat/completions";

    /// OpenAI ChatGPT 接口地址
    pub const CHATGPT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

    /// xAI Grok 接口地址
    pub const GROK_API_URL: &str = "https://api.x.ai/v1/chat/completions";

    pub const PERPLEXITY_MODEL: &str = "sonar";
    pub const CHATGPT_MODEL: &str = "gpt-4o-mini";
    pub const GROK_MODEL: &str = "grok-2-latest";

    /// Gemini 使用的鉴权请求头
    pub const GEMINI_KEY_HEADER: &str = "x-goog-api-key";
}

/// 翻译服务配置
pub mod service_config {
    /// 默认目标语言
    pub const DEFAULT_TARGET_LANG: &str = "Vietnamese";

    /// 默认AI服务
    pub const DEFAULT_AI_SERVICE: &str = "gemini";

    /// 单次API调用的最大字符数
    pub const MAX_CHUNK_CHARS: usize = 2000;

    /// 默认并发请求数量（每个窗口的分块数）
    pub const DEFAULT_CONCURRENCY: usize = 5;

    /// 生成温度
    pub const TEMPERATURE: f32 = 0.3;

    /// 最大输出token数
    pub const MAX_OUTPUT_TOKENS: u32 = 2048;

    /// 请求超时时间（秒）
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// 分块内各文本之间的分隔符
    pub const LINE_SEPARATOR: char = '\n';
}

/// 提示词
pub mod prompt {
    /// 生成发给所有后端的统一翻译指令
    pub fn system_prompt(target_language: &str) -> String {
        format!(
            "You are a professional translator. Translate the following text into {}. \
             Only return the translated text, no explanations. \
             Preserve line breaks and maintain the same number of lines as the input.",
            target_language
        )
    }

    /// 用户消息中待翻译文本的前缀
    pub const TEXT_PREFIX: &str = "Text to translate:\n";
}

/// 页面注入元素相关常量
pub mod overlay_config {
    /// 下方译文元素的class，用于批量清理
    pub const OVERLAY_CLASS: &str = "ai-translation-below";

    /// 下方译文元素的内联样式
    pub const OVERLAY_STYLE: &str = "display: block; font-size: 0.85em; color: #667eea; \
         font-style: italic; margin-top: 4px; line-height: 1.4;";

    /// 不参与翻译的标签
    pub const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "iframe", "object"];
}

/// 划词翻译浮层相关常量
pub mod selection_config {
    use std::time::Duration;

    /// 选区变化后确认清空的防抖时间
    pub const SELECTION_DEBOUNCE: Duration = Duration::from_millis(100);

    /// 图标相对选区中心的水平偏移
    pub const ICON_OFFSET_X: f64 = 16.0;

    /// 图标与选区底部的间距
    pub const ICON_GAP_Y: f64 = 5.0;

    /// 弹窗与选区底部的间距
    pub const POPUP_GAP_Y: f64 = 40.0;

    /// 弹窗超出视口时保留的边距
    pub const POPUP_MARGIN: f64 = 10.0;
}

/// 错误消息常量
pub mod error_messages {
    /// 未配置API密钥
    pub const MISSING_API_KEY: &str = "请先设置API密钥";

    /// 响应缺少译文字段
    pub const INVALID_RESPONSE: &str = "API响应格式无效";
}
