//! Translation CLI - AI网页翻译工具库
//!
//! 提供可见文本节点收集、分块、按窗口并发的AI翻译、原位替换/下方显示写回、
//! 原文快照与还原，以及划词翻译的界面状态机。

pub mod api_constants;
pub mod backend;
pub mod chunker;
pub mod collector;
pub mod config;
pub mod controller;
pub mod error;
pub mod html_processor;
pub mod placement;
pub mod protocol;
pub mod selection;
pub mod session;
pub mod stats;
pub mod translator;
pub mod utils;

pub use backend::{AiBackend, AiService, TranslationBackend};
pub use config::TranslatorConfig;
pub use controller::PageController;
pub use error::{Result, TranslationError};
pub use html_processor::Document;
pub use placement::PlacementMode;
